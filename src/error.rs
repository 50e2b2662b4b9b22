use thiserror::Error;

/// Errors surfaced by the LMS engine.
///
/// [`Error::VerifyFailed`] is deliberately opaque: it carries no indication
/// of which verification sub-check rejected the signature.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown parameter set, malformed buffer, or unusable key state")]
    BadInputData,
    #[error("Output buffer is too small to hold the result")]
    BufferTooSmall,
    #[error("All one-time leaf keys of this private key have been consumed")]
    OutOfPrivateKeys,
    #[error("Failed to allocate storage for the leaf key array")]
    AllocFailed,
    #[error("Signature verification failed")]
    VerifyFailed,
}

pub type Result<T> = core::result::Result<T, Error>;
