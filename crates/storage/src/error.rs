//! Error taxonomy for the state schema and every action built on it.

use thiserror::Error;

/// Failures surfaced by the host key/value store itself.
///
/// `Cancelled` must propagate to the transaction result unchanged; it is
/// never reclassified as a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store operation cancelled")]
    Cancelled,

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Typed failure modes of state access and the actions above it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    // Arithmetic.
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("division by zero")]
    DivideByZero,

    // Balances.
    #[error("invalid balance")]
    InvalidBalance,
    #[error("insufficient LP balance")]
    InsufficientLpBalance,

    // Markets.
    #[error("market not found")]
    MarketNotFound,
    #[error("market already exists")]
    MarketExists,
    #[error("market is not active")]
    MarketNotActive,
    #[error("market is not resolved")]
    MarketNotResolved,
    #[error("invalid outcome")]
    InvalidOutcome,
    #[error("invalid market record length: {0}")]
    InvalidMarketRecord(usize),
    #[error("batch already cleared")]
    BatchAlreadyCleared,
    #[error("invalid batch record length: {0}")]
    InvalidBatchRecord(usize),
    #[error("validator index is reserved")]
    ReservedValidatorIndex,

    // AMM.
    #[error("pool not found")]
    PoolNotFound,
    #[error("pool already exists")]
    PoolExists,
    #[error("unsupported asset")]
    UnsupportedAsset,
    #[error("invalid asset pair")]
    InvalidAssetPair,
    #[error("invalid pool fee")]
    InvalidPoolFee,
    #[error("invalid pool record length: {0}")]
    InvalidPoolRecord(usize),
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("slippage exceeded")]
    SlippageExceeded,
    #[error("invalid swap amount")]
    InvalidSwapAmount,
    #[error("invalid liquidity amount")]
    InvalidLiquidityAmount,

    // Fee router / treasury / VAI.
    #[error("invalid fee amount")]
    InvalidFeeAmount,
    #[error("invalid VAI amount")]
    InvalidVaiAmount,
    #[error("VAI debt ceiling exceeded")]
    VaiDebtCeilingExceeded,
    #[error("VAI epoch mint limit exceeded")]
    VaiEpochMintLimitExceeded,
    #[error("VAI debt invariant violated")]
    VaiDebtInvariant,
    #[error("backing ratio violation")]
    BackingRatioViolation,
    #[error("invalid release amount")]
    InvalidReleaseAmount,
    #[error("release too early")]
    ReleaseTooEarly,
    #[error("release cap exceeded")]
    ReleaseCapExceeded,
    #[error("insufficient locked COL")]
    InsufficientLockedCol,

    // Authorization and configuration.
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid tokenomics config")]
    InvalidTokenomicsConfig,
    #[error("invalid fee router config")]
    InvalidFeeRouterConfig,
    #[error("invalid risk config")]
    InvalidRiskConfig,
    #[error("invalid reserve state")]
    InvalidReserveState,
    #[error("invalid proof config")]
    InvalidProofConfig,

    // Proof pipeline.
    #[error("proof not found")]
    ProofNotFound,
    #[error("proof already submitted")]
    ProofAlreadySubmitted,
    #[error("proof type mismatch")]
    ProofTypeMismatch,
    #[error("proof circuit mismatch")]
    ProofCircuitMismatch,
    #[error("unsupported proof circuit")]
    UnsupportedProofCircuit,
    #[error("proof deadline missed")]
    ProofDeadlineMissed,
    #[error("proof commitment mismatch")]
    ProofCommitmentMismatch,
    #[error("proof fills hash mismatch")]
    ProofFillsMismatch,
    #[error("proof public inputs mismatch")]
    ProofPublicInputsMismatch,
    #[error("invalid proof envelope")]
    InvalidProofEnvelope,
    #[error("proof verification failed: {0}")]
    ProofVerificationFailed(String),
    #[error("proof verifier unavailable")]
    ProofVerifierUnavailable,
    #[error("invalid vellum proof")]
    InvalidVellumProof,
    #[error("vellum proof not found")]
    VellumProofNotFound,

    // Prover identity.
    #[error("invalid bloodsworn record")]
    InvalidBloodsworn,
    #[error("invalid glyph record")]
    InvalidGlyph,
    #[error("glyph not found")]
    GlyphNotFound,
}
