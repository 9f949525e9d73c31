//! Single-administrator authorization.
//!
//! Registry mutation and admin handover are gated on the caller being the
//! current administrator. Once renounced, nothing can ever pass the check
//! again.

use paygate_types::{AccountId, PaygateError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGuard {
    admin: Option<AccountId>,
}

impl AuthorizationGuard {
    #[must_use]
    pub fn new(admin: AccountId) -> Self {
        Self { admin: Some(admin) }
    }

    #[must_use]
    pub fn admin(&self) -> Option<AccountId> {
        self.admin
    }

    /// # Errors
    /// `Unauthorized` unless `caller` is the current administrator.
    pub fn ensure_admin(&self, caller: AccountId) -> Result<()> {
        match self.admin {
            Some(admin) if admin == caller => Ok(()),
            _ => Err(PaygateError::Unauthorized { caller }),
        }
    }

    /// Hand administration to `new_admin`. Returns the previous admin.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the current administrator
    /// - `InvalidAdmin` for the zero address
    pub fn transfer_admin(&mut self, caller: AccountId, new_admin: AccountId) -> Result<AccountId> {
        self.ensure_admin(caller)?;
        if new_admin.is_zero() {
            return Err(PaygateError::InvalidAdmin(new_admin));
        }
        self.admin = Some(new_admin);
        Ok(caller)
    }

    /// Give up administration for good.
    pub fn renounce(&mut self, caller: AccountId) -> Result<AccountId> {
        self.ensure_admin(caller)?;
        self.admin = None;
        Ok(caller)
    }
}
