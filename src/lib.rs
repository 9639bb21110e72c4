//! Codec for PSARC archives and their embedded SNG song payloads.
//!
//! The archive engine covers both pack and unpack, the stream cipher
//! matches the per-block rekeying construction the format actually uses,
//! and the song compiler turns a parsed arrangement into the resolved
//! structure a binary SNG writer would expect.

pub mod archive;
pub mod block;
pub mod cipher;
pub mod error;
pub mod sng;
pub mod song;
pub mod toc;

pub use error::{PsarcError, Result};
