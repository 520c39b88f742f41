use thiserror::Error;

use super::GateId;

/// The result of a network operation.
pub type Result<T> = std::result::Result<T, NetError>;

/// Error returned when a network operation failed.
#[derive(Debug, Error)]
pub enum NetError {
    /// The gate with the given index does not exist in the network.
    #[error("gate with index={0} does not exist")]
    GateDoesNotExist(GateId),

    /// A transformation needed the complementary twin of a gate that has none.
    /// Dual-rail passes must run on a network produced by `conv_dual_rail`.
    #[error("gate {0} has no complementary twin")]
    MissingComplement(String),

    /// The network has reached an invalid state. This should never happen:
    /// every rewrite is supposed to keep the driver/follower lists of both
    /// endpoints consistent.
    #[error("the network has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),

    /// Just forwarding a [`ParserError`].
    #[error("{0}")]
    ParserError(#[from] ParserError),
}

/// Error returned when loading a circuit from a file failed.
///
/// It is defined here because the `parser` module is private.
#[derive(Debug, Error)]
pub enum ParserError {
    /// All AIGER features are not supported (only the combinational basics).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Invalid token, something else was expected.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The header counts do not satisfy M = I + L + A.
    #[error("incorrect header counts: M != I + L + A")]
    HeaderMismatch,

    /// The design contains latches. This tool only handles combinational
    /// circuits; remove the latches from the design first.
    #[error("latches present: remove latches from the design")]
    LatchesUnsupported,

    /// An IO error occured (file doesn't exist, or doesn't have the right extension, ...).
    #[error("io error: {0}")]
    IoError(String),
}
