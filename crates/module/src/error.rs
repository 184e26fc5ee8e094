//! Action-level errors.
//!
//! Every failure aborts the transaction's mutations; there is no local
//! recovery inside an action. State and codec failures convert through and
//! keep their typed identity.

use thiserror::Error;

use veil_storage::StateError;
use veil_types::CodecError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    // Transfer.
    #[error("value is zero")]
    ValueZero,
    #[error("memo is too large")]
    MemoTooLarge,

    // Market lifecycle.
    #[error("outcomes must be >= 2")]
    InvalidOutcomes,
    #[error("invalid resolution time")]
    InvalidResolutionTime,
    #[error("creator bond is zero")]
    CreatorBondZero,
    #[error("question too large")]
    QuestionTooLarge,
    #[error("signature is empty")]
    SignatureEmpty,
    #[error("signature is too large")]
    SignatureTooLarge,
    #[error("bond is zero")]
    BondZero,
    #[error("evidence is empty")]
    EvidenceEmpty,
    #[error("evidence is too large")]
    EvidenceTooLarge,

    // Batch pipeline.
    #[error("envelope is empty")]
    EnvelopeEmpty,
    #[error("envelope is too large")]
    EnvelopeTooLarge,
    #[error("commitment is empty")]
    CommitmentEmpty,
    #[error("commitment is too large")]
    CommitmentTooLarge,
    #[error("decryption share is empty")]
    DecryptionShareEmpty,
    #[error("decryption share is too large")]
    DecryptionShareTooLarge,
    #[error("clear price is zero")]
    ClearPriceZero,
    #[error("fills hash is empty")]
    FillsHashEmpty,
    #[error("fills hash is too large")]
    FillsHashTooLarge,
    #[error("fills hash has invalid size")]
    FillsHashWrongSize,
}
