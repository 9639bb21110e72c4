//! The SNG payload codec: frames an inner binary blob as
//! `header ‖ IV ‖ ciphertext(size ‖ zlib bytes) ‖ trailer`.
//!
//! Uses the zero-IV counter key pair and the same per-block rekeyed stream
//! cipher as the archive TOC, so the size prefix and zlib body can be
//! recovered without knowing the inner length up front.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Cursor, Read, Write};

use crate::cipher;
use crate::error::{PsarcError, Result};

const HEADER_MAGIC: u32 = 0x0000_004A;
const HEADER_VERSION: u32 = 0x0000_0003;
const IV_LEN: usize = 16;
const TRAILER_LEN: usize = 56;

/// Encrypts and zlib-compresses `plaintext` into the inner SNG payload
/// framing: header, zero IV, ciphertext(size ‖ zlib bytes), trailer.
pub fn encode(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    let mut compressed = Vec::new();
    {
        let mut encoder = ZlibEncoder::new(&mut compressed, Compression::best());
        encoder.write_all(plaintext)?;
        encoder.finish()?;
    }

    let mut body = Vec::with_capacity(4 + compressed.len());
    body.write_u32::<LittleEndian>(plaintext.len() as u32)?;
    body.extend_from_slice(&compressed);

    let iv = [0u8; IV_LEN];
    let ciphertext = cipher::encrypt(&body, key, &iv);

    let mut out = Vec::with_capacity(8 + IV_LEN + ciphertext.len() + TRAILER_LEN);
    out.write_u32::<LittleEndian>(HEADER_MAGIC)?;
    out.write_u32::<LittleEndian>(HEADER_VERSION)?;
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out.extend_from_slice(&[0u8; TRAILER_LEN]);

    Ok(out)
}

/// Decodes an SNG-framed payload back into its plaintext inner blob.
pub fn decode(framed: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&framed[8..24]);

    let ciphertext = &framed[24..];
    let plain = cipher::decrypt(ciphertext, key, &iv);

    let mut cursor = Cursor::new(&plain);
    let expected_len = cursor.read_u32::<LittleEndian>()?;

    let mut decoder = ZlibDecoder::new(&plain[4..]);
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload)?;

    if payload.len() as u32 != expected_len {
        return Err(PsarcError::SngSizeMismatch {
            expected: expected_len,
            actual: payload.len() as u32,
        });
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{MAC_KEY, PC_KEY};

    #[test]
    fn round_trips_under_mac_key() {
        let data = b"rocksmith compiled song payload bytes go here".repeat(50);
        let framed = encode(&data, &MAC_KEY).unwrap();
        assert_eq!(decode(&framed, &MAC_KEY).unwrap(), data);
    }

    #[test]
    fn round_trips_under_pc_key() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let framed = encode(&data, &PC_KEY).unwrap();
        assert_eq!(decode(&framed, &PC_KEY).unwrap(), data);
    }

    #[test]
    fn frame_has_expected_header_and_trailer() {
        let framed = encode(b"x", &MAC_KEY).unwrap();
        assert_eq!(&framed[0..4], &0x4Au32.to_le_bytes());
        assert_eq!(&framed[4..8], &3u32.to_le_bytes());
        assert_eq!(&framed[8..24], &[0u8; 16]);
        assert_eq!(&framed[framed.len() - 56..], &[0u8; 56]);
    }

    #[test]
    fn size_mismatch_is_detected() {
        let mut framed = encode(b"hello world", &MAC_KEY).unwrap();
        // Corrupt the declared plaintext size inside the encrypted region
        // by re-encrypting a body with a different declared length.
        let iv = [0u8; 16];
        let mut body = Vec::new();
        body.write_u32::<LittleEndian>(999).unwrap();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(b"hello world").unwrap();
        body.extend_from_slice(&encoder.finish().unwrap());
        let ciphertext = cipher::encrypt(&body, &MAC_KEY, &iv);
        framed.truncate(24);
        framed.extend_from_slice(&ciphertext);
        framed.extend_from_slice(&[0u8; 56]);

        assert!(matches!(
            decode(&framed, &MAC_KEY),
            Err(PsarcError::SngSizeMismatch { expected: 999, .. })
        ));
    }
}
