//! Universal-router venue.
//!
//! Swaps are expressed as a command stream: one command byte per action and
//! one ABI-style input blob per command. The only command understood here is
//! `V3_SWAP_EXACT_IN`, whose input carries a packed path:
//!
//! ```text
//! path  = asset_in (20) ‖ fee_bps (3, big-endian) ‖ asset_out (20)
//! input = recipient (20) ‖ amount_in (16) ‖ amount_out_min (16)
//!         ‖ payer (20) ‖ path_len (2, big-endian) ‖ path
//! ```
//!
//! Amounts are encoded with [`Decimal::serialize`]. Execution decodes every
//! command and dispatches to the same fee-tier pools the concentrated
//! liquidity venue uses.

use paygate_ledger::TokenLedger;
use paygate_types::{AccountId, Address, Amount, AssetId, Result, SwapParams, VenueDialect};
use rust_decimal::Decimal;

use crate::{
    concentrated::FeeTierPools,
    curve::swap_failed,
    venue::{SwapRequest, SwapVenue},
};

/// Exact-input swap through a fee-tiered pool.
pub const V3_SWAP_EXACT_IN: u8 = 0x00;

const ADDRESS_LEN: usize = 20;
const FEE_LEN: usize = 3;
const AMOUNT_LEN: usize = 16;
const PATH_LEN: usize = ADDRESS_LEN + FEE_LEN + ADDRESS_LEN;
const SWAP_INPUT_HEADER_LEN: usize = ADDRESS_LEN + AMOUNT_LEN + AMOUNT_LEN + ADDRESS_LEN + 2;
/// Largest fee a 3-byte path field can carry.
const MAX_PATH_FEE: u32 = (1 << 24) - 1;

/// A single-hop swap path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPath {
    pub asset_in: AssetId,
    pub fee_bps: u32,
    pub asset_out: AssetId,
}

impl SwapPath {
    /// # Errors
    /// `SwapFailed` if the fee does not fit the 3-byte field.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.fee_bps > MAX_PATH_FEE {
            return Err(swap_failed(format!(
                "fee {} does not fit a path fee field",
                self.fee_bps
            )));
        }
        let mut out = Vec::with_capacity(PATH_LEN);
        out.extend_from_slice(self.asset_in.as_bytes());
        out.extend_from_slice(&self.fee_bps.to_be_bytes()[1..]);
        out.extend_from_slice(self.asset_out.as_bytes());
        Ok(out)
    }

    /// # Errors
    /// `SwapFailed` unless `bytes` is exactly one hop.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PATH_LEN {
            return Err(swap_failed(format!(
                "path must be {PATH_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut reader = Reader::new(bytes);
        Ok(Self {
            asset_in: reader.address()?,
            fee_bps: reader.fee()?,
            asset_out: reader.address()?,
        })
    }
}

/// Decoded input of a `V3_SWAP_EXACT_IN` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V3SwapExactIn {
    pub recipient: AccountId,
    pub amount_in: Amount,
    pub amount_out_min: Amount,
    pub payer: AccountId,
    pub path: SwapPath,
}

impl V3SwapExactIn {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let path = self.path.encode()?;
        let path_len = u16::try_from(path.len())
            .map_err(|_| swap_failed("path too long"))?;
        let mut out = Vec::with_capacity(SWAP_INPUT_HEADER_LEN + path.len());
        out.extend_from_slice(self.recipient.as_bytes());
        out.extend_from_slice(&self.amount_in.serialize());
        out.extend_from_slice(&self.amount_out_min.serialize());
        out.extend_from_slice(self.payer.as_bytes());
        out.extend_from_slice(&path_len.to_be_bytes());
        out.extend_from_slice(&path);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let recipient = reader.address()?;
        let amount_in = reader.amount()?;
        let amount_out_min = reader.amount()?;
        let payer = reader.address()?;
        let path_len = usize::from(u16::from_be_bytes(reader.array::<2>()?));
        let path = SwapPath::decode(reader.take(path_len)?)?;
        if !reader.is_empty() {
            return Err(swap_failed("trailing bytes after swap input"));
        }
        Ok(Self {
            recipient,
            amount_in,
            amount_out_min,
            payer,
            path,
        })
    }
}

/// Cursor over an encoded command input.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(swap_failed(format!(
                "truncated command input: wanted {n} bytes, {} left",
                self.bytes.len()
            )));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn address(&mut self) -> Result<Address> {
        Ok(Address::from_bytes(self.array::<ADDRESS_LEN>()?))
    }

    fn amount(&mut self) -> Result<Amount> {
        Ok(Decimal::deserialize(self.array::<AMOUNT_LEN>()?))
    }

    fn fee(&mut self) -> Result<u32> {
        let [a, b, c] = self.array::<FEE_LEN>()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct UniversalRouterVenue {
    router: AccountId,
    output_asset: AssetId,
    pools: FeeTierPools,
}

impl UniversalRouterVenue {
    #[must_use]
    pub fn new(router: AccountId, output_asset: AssetId, pools: FeeTierPools) -> Self {
        Self {
            router,
            output_asset,
            pools,
        }
    }

    /// Encode one exact-input swap as a `(commands, inputs)` pair.
    pub fn encode_swap(&self, request: &SwapRequest) -> Result<(Vec<u8>, Vec<Vec<u8>>)> {
        let fee_bps = fee_tier(&request.params)?;
        let input = V3SwapExactIn {
            recipient: request.recipient,
            amount_in: request.amount_in,
            amount_out_min: request.min_amount_out,
            payer: request.payer,
            path: SwapPath {
                asset_in: request.asset_in,
                fee_bps,
                asset_out: self.output_asset,
            },
        }
        .encode()?;
        Ok((vec![V3_SWAP_EXACT_IN], vec![input]))
    }

    /// Run a command stream. Returns the total output paid.
    ///
    /// # Errors
    /// `SwapFailed` on an unknown command, a malformed input, or a path that
    /// does not end in the settlement asset. Pool and ledger errors bubble.
    pub fn execute(
        &self,
        ledger: &mut TokenLedger,
        commands: &[u8],
        inputs: &[Vec<u8>],
    ) -> Result<Amount> {
        if commands.len() != inputs.len() {
            return Err(swap_failed(format!(
                "{} commands but {} inputs",
                commands.len(),
                inputs.len()
            )));
        }
        tracing::debug!(
            router = %self.router,
            commands = %hex::encode(commands),
            "Executing router commands"
        );

        let mut total_out = Decimal::ZERO;
        for (command, input) in commands.iter().zip(inputs) {
            match *command {
                V3_SWAP_EXACT_IN => {
                    let swap = V3SwapExactIn::decode(input)?;
                    total_out += self.run_exact_in(ledger, &swap)?;
                }
                other => {
                    return Err(swap_failed(format!("unsupported router command 0x{other:02x}")));
                }
            }
        }
        Ok(total_out)
    }

    fn run_exact_in(&self, ledger: &mut TokenLedger, swap: &V3SwapExactIn) -> Result<Amount> {
        if swap.path.asset_out != self.output_asset {
            return Err(swap_failed(format!(
                "path ends in {} instead of the settlement asset",
                swap.path.asset_out
            )));
        }
        let pool = self.pools.resolve(swap.path.asset_in, swap.path.fee_bps)?;
        let request = SwapRequest {
            asset_in: swap.path.asset_in,
            params: SwapParams::FeeTier(swap.path.fee_bps),
            amount_in: swap.amount_in,
            min_amount_out: swap.amount_out_min,
            payer: swap.payer,
            recipient: swap.recipient,
        };
        pool.execute(ledger, self.router, self.output_asset, &request)
    }
}

fn fee_tier(params: &SwapParams) -> Result<u32> {
    match *params {
        SwapParams::FeeTier(fee_bps) => Ok(fee_bps),
        other => Err(swap_failed(format!(
            "universal router expects a fee tier, got {other}"
        ))),
    }
}

impl SwapVenue for UniversalRouterVenue {
    fn dialect(&self) -> VenueDialect {
        VenueDialect::UniversalRouter
    }

    fn address(&self) -> AccountId {
        self.router
    }

    fn output_asset(&self) -> AssetId {
        self.output_asset
    }

    fn quote_exact_input(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        params: &SwapParams,
        amount_in: Amount,
    ) -> Result<Amount> {
        self.pools
            .resolve(asset_in, fee_tier(params)?)?
            .quote_exact_input(ledger, asset_in, self.output_asset, amount_in)
    }

    fn quote_exact_output(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        params: &SwapParams,
        amount_out: Amount,
    ) -> Result<Amount> {
        self.pools
            .resolve(asset_in, fee_tier(params)?)?
            .quote_exact_output(ledger, asset_in, self.output_asset, amount_out)
    }

    fn swap_exact_input(&self, ledger: &mut TokenLedger, request: &SwapRequest) -> Result<Amount> {
        let (commands, inputs) = self.encode_swap(request)?;
        self.execute(ledger, &commands, &inputs)
    }
}

#[cfg(test)]
mod tests {
    use paygate_types::PaygateError;

    use super::*;

    fn addr(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    const ROUTER: u64 = 0xa0;
    const IDRX: u64 = 0x1d;
    const USDT: u64 = 0x57;
    const POOL: u64 = 0xd1;

    fn setup() -> (UniversalRouterVenue, TokenLedger) {
        let mut pools = FeeTierPools::new();
        pools.insert(addr(USDT), 5, addr(POOL));
        let venue = UniversalRouterVenue::new(addr(ROUTER), addr(IDRX), pools);

        let mut ledger = TokenLedger::new();
        ledger
            .mint(addr(USDT), addr(POOL), Decimal::new(10_000, 0))
            .unwrap();
        ledger
            .mint(addr(IDRX), addr(POOL), Decimal::new(1_000_000, 0))
            .unwrap();
        ledger.mint(addr(USDT), addr(1), Decimal::new(50, 0)).unwrap();
        ledger
            .approve(addr(USDT), addr(1), addr(ROUTER), Decimal::new(50, 0))
            .unwrap();
        (venue, ledger)
    }

    fn request() -> SwapRequest {
        SwapRequest {
            asset_in: addr(USDT),
            params: SwapParams::FeeTier(5),
            amount_in: Decimal::new(10, 0),
            min_amount_out: Decimal::ZERO,
            payer: addr(1),
            recipient: addr(2),
        }
    }

    #[test]
    fn path_layout_is_packed() {
        let path = SwapPath {
            asset_in: addr(USDT),
            fee_bps: 500,
            asset_out: addr(IDRX),
        }
        .encode()
        .unwrap();
        assert_eq!(path.len(), 43);
        assert_eq!(&path[20..23], &[0x00, 0x01, 0xf4]);
        assert_eq!(&path[..20], addr(USDT).as_bytes());
        assert_eq!(&path[23..], addr(IDRX).as_bytes());
    }

    #[test]
    fn swap_input_decodes_to_what_was_encoded() {
        let (venue, _) = setup();
        let (commands, inputs) = venue.encode_swap(&request()).unwrap();
        assert_eq!(commands, vec![V3_SWAP_EXACT_IN]);
        let decoded = V3SwapExactIn::decode(&inputs[0]).unwrap();
        assert_eq!(decoded.amount_in, Decimal::new(10, 0));
        assert_eq!(decoded.payer, addr(1));
        assert_eq!(decoded.path.fee_bps, 5);
        assert_eq!(decoded.path.asset_out, addr(IDRX));
    }

    #[test]
    fn swap_through_commands_matches_quote() {
        let (venue, mut ledger) = setup();
        let req = request();
        let quoted = venue
            .quote_exact_input(&ledger, req.asset_in, &req.params, req.amount_in)
            .unwrap();
        let out = venue.swap_exact_input(&mut ledger, &req).unwrap();
        assert_eq!(out, quoted);
        assert_eq!(ledger.balance_of(addr(IDRX), addr(2)), out);
        assert_eq!(ledger.balance_of(addr(USDT), addr(POOL)), Decimal::new(10_010, 0));
        ledger.verify_all_supply().unwrap();
    }

    #[test]
    fn unknown_command_rejected() {
        let (venue, mut ledger) = setup();
        let (_, inputs) = venue.encode_swap(&request()).unwrap();
        let err = venue.execute(&mut ledger, &[0x08], &inputs).unwrap_err();
        assert!(err.to_string().contains("0x08"));
    }

    #[test]
    fn truncated_input_rejected() {
        let (venue, mut ledger) = setup();
        let (commands, inputs) = venue.encode_swap(&request()).unwrap();
        let short = vec![inputs[0][..30].to_vec()];
        let err = venue.execute(&mut ledger, &commands, &short).unwrap_err();
        assert!(matches!(err, PaygateError::SwapFailed { .. }));
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn path_must_end_in_settlement_asset() {
        let (venue, mut ledger) = setup();
        let input = V3SwapExactIn {
            recipient: addr(2),
            amount_in: Decimal::ONE,
            amount_out_min: Decimal::ZERO,
            payer: addr(1),
            path: SwapPath {
                asset_in: addr(USDT),
                fee_bps: 5,
                asset_out: addr(0x77),
            },
        }
        .encode()
        .unwrap();
        let err = venue
            .execute(&mut ledger, &[V3_SWAP_EXACT_IN], &[input])
            .unwrap_err();
        assert!(err.to_string().contains("settlement asset"));
    }

    #[test]
    fn command_input_count_mismatch_rejected() {
        let (venue, mut ledger) = setup();
        let err = venue
            .execute(&mut ledger, &[V3_SWAP_EXACT_IN], &[])
            .unwrap_err();
        assert!(matches!(err, PaygateError::SwapFailed { .. }));
    }
}
