//! The action set.
//!
//! Wire format: `type_id(u8) ‖ body`, big-endian fixed fields, byte fields
//! length-prefixed. Results reuse the leading type byte.

use veil_storage::StateMut;
use veil_types::{Address, CodecError, Decoder};

use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::KeySet;

pub mod add_liquidity;
pub mod amm;
pub mod burn_vai;
pub mod clear_batch;
pub mod commit_order;
pub mod create_market;
pub mod create_pool;
pub mod dispute;
pub mod mint_vai;
pub mod release_col_tranche;
pub mod remove_liquidity;
pub mod resolve_market;
pub mod reveal_batch;
pub mod route_fees;
pub mod set_proof_config;
pub mod set_risk_params;
pub mod submit_batch_proof;
pub mod swap_exact_in;
pub mod transfer;
pub mod update_reserve_state;

pub use add_liquidity::{AddLiquidity, AddLiquidityResult};
pub use burn_vai::{BurnVai, BurnVaiResult};
pub use clear_batch::{ClearBatch, ClearBatchResult};
pub use commit_order::{CommitOrder, CommitOrderResult};
pub use create_market::{CreateMarket, CreateMarketResult};
pub use create_pool::{CreatePool, CreatePoolResult};
pub use dispute::{Dispute, DisputeResult};
pub use mint_vai::{MintVai, MintVaiResult};
pub use release_col_tranche::{ReleaseColTranche, ReleaseColTrancheResult};
pub use remove_liquidity::{RemoveLiquidity, RemoveLiquidityResult};
pub use resolve_market::{ResolveMarket, ResolveMarketResult};
pub use reveal_batch::{RevealBatch, RevealBatchResult};
pub use route_fees::{RouteFees, RouteFeesResult};
pub use set_proof_config::{SetProofConfig, SetProofConfigResult};
pub use set_risk_params::{SetRiskParams, SetRiskParamsResult};
pub use submit_batch_proof::{SubmitBatchProof, SubmitBatchProofResult};
pub use swap_exact_in::{SwapExactIn, SwapExactInResult};
pub use transfer::{Transfer, TransferResult};
pub use update_reserve_state::{UpdateReserveState, UpdateReserveStateResult};

/// A state-transition function over the typed store.
pub trait Action: Sized {
    const TYPE_ID: u8;

    /// Serialize as `TYPE_ID ‖ body`.
    fn encode(&self) -> Vec<u8>;

    /// Decode a full payload including the leading type byte.
    fn decode(bytes: &[u8]) -> Result<Self, ActionError>;

    /// Static read/write key set, a function of the declared fields only.
    fn state_keys(&self, actor: &Address) -> KeySet;

    /// Validate, mutate, and emit the serialized typed result.
    ///
    /// The runtime guarantees atomicity: on error no mutation survives.
    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError>;
}

/// Any decodable action, dispatched by its leading type byte.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPayload {
    Transfer(Transfer),
    CreateMarket(CreateMarket),
    CommitOrder(CommitOrder),
    RevealBatch(RevealBatch),
    ClearBatch(ClearBatch),
    ResolveMarket(ResolveMarket),
    Dispute(Dispute),
    RouteFees(RouteFees),
    ReleaseColTranche(ReleaseColTranche),
    MintVai(MintVai),
    BurnVai(BurnVai),
    CreatePool(CreatePool),
    AddLiquidity(AddLiquidity),
    RemoveLiquidity(RemoveLiquidity),
    SwapExactIn(SwapExactIn),
    UpdateReserveState(UpdateReserveState),
    SetRiskParams(SetRiskParams),
    SubmitBatchProof(SubmitBatchProof),
    SetProofConfig(SetProofConfig),
}

macro_rules! for_each_action {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            ActionPayload::Transfer($inner) => $body,
            ActionPayload::CreateMarket($inner) => $body,
            ActionPayload::CommitOrder($inner) => $body,
            ActionPayload::RevealBatch($inner) => $body,
            ActionPayload::ClearBatch($inner) => $body,
            ActionPayload::ResolveMarket($inner) => $body,
            ActionPayload::Dispute($inner) => $body,
            ActionPayload::RouteFees($inner) => $body,
            ActionPayload::ReleaseColTranche($inner) => $body,
            ActionPayload::MintVai($inner) => $body,
            ActionPayload::BurnVai($inner) => $body,
            ActionPayload::CreatePool($inner) => $body,
            ActionPayload::AddLiquidity($inner) => $body,
            ActionPayload::RemoveLiquidity($inner) => $body,
            ActionPayload::SwapExactIn($inner) => $body,
            ActionPayload::UpdateReserveState($inner) => $body,
            ActionPayload::SetRiskParams($inner) => $body,
            ActionPayload::SubmitBatchProof($inner) => $body,
            ActionPayload::SetProofConfig($inner) => $body,
        }
    };
}

impl ActionPayload {
    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let type_id = *bytes.first().ok_or(CodecError::EmptyPayload)?;
        use veil_types::consts::*;
        Ok(match type_id {
            TRANSFER_ID => Self::Transfer(Transfer::decode(bytes)?),
            CREATE_MARKET_ID => Self::CreateMarket(CreateMarket::decode(bytes)?),
            COMMIT_ORDER_ID => Self::CommitOrder(CommitOrder::decode(bytes)?),
            REVEAL_BATCH_ID => Self::RevealBatch(RevealBatch::decode(bytes)?),
            CLEAR_BATCH_ID => Self::ClearBatch(ClearBatch::decode(bytes)?),
            RESOLVE_MARKET_ID => Self::ResolveMarket(ResolveMarket::decode(bytes)?),
            DISPUTE_ID => Self::Dispute(Dispute::decode(bytes)?),
            ROUTE_FEES_ID => Self::RouteFees(RouteFees::decode(bytes)?),
            RELEASE_COL_TRANCHE_ID => {
                Self::ReleaseColTranche(ReleaseColTranche::decode(bytes)?)
            }
            MINT_VAI_ID => Self::MintVai(MintVai::decode(bytes)?),
            BURN_VAI_ID => Self::BurnVai(BurnVai::decode(bytes)?),
            CREATE_POOL_ID => Self::CreatePool(CreatePool::decode(bytes)?),
            ADD_LIQUIDITY_ID => Self::AddLiquidity(AddLiquidity::decode(bytes)?),
            REMOVE_LIQUIDITY_ID => Self::RemoveLiquidity(RemoveLiquidity::decode(bytes)?),
            SWAP_EXACT_IN_ID => Self::SwapExactIn(SwapExactIn::decode(bytes)?),
            UPDATE_RESERVE_STATE_ID => {
                Self::UpdateReserveState(UpdateReserveState::decode(bytes)?)
            }
            SET_RISK_PARAMS_ID => Self::SetRiskParams(SetRiskParams::decode(bytes)?),
            SUBMIT_BATCH_PROOF_ID => Self::SubmitBatchProof(SubmitBatchProof::decode(bytes)?),
            SET_PROOF_CONFIG_ID => Self::SetProofConfig(SetProofConfig::decode(bytes)?),
            other => return Err(ActionError::Codec(CodecError::UnknownTypeId(other))),
        })
    }

    pub fn type_id(&self) -> u8 {
        for_each_action!(self, inner => {
            fn id<A: Action>(_: &A) -> u8 {
                A::TYPE_ID
            }
            id(inner)
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        for_each_action!(self, inner => inner.encode())
    }

    pub fn state_keys(&self, actor: &Address) -> KeySet {
        for_each_action!(self, inner => inner.state_keys(actor))
    }

    pub fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        for_each_action!(self, inner => inner.execute(store, ctx))
    }
}

/// Decode helper shared by every action: strip and check the type byte.
pub(crate) fn body_decoder(bytes: &[u8], type_id: u8) -> Result<Decoder<'_>, ActionError> {
    let mut dec = Decoder::new(bytes);
    dec.expect_type_id(type_id)?;
    Ok(dec)
}
