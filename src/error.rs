use std::io;

/// Errors surfaced while packing or unpacking a PSARC archive, or while
/// encoding/decoding an embedded SNG payload.
#[derive(thiserror::Error, Debug)]
pub enum PsarcError {
    #[error("bad archive magic: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("TOC decryption produced an unparseable entry table")]
    TocCryptoFailure,

    #[error("decompressed SNG size {actual} does not match declared size {expected}")]
    SngSizeMismatch { expected: u32, actual: u32 },

    #[error("two input files map to the same archive path: {0}")]
    PathConflict(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PsarcError>;
