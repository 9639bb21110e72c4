//! The block codec: splits a byte stream into fixed-size
//! logical blocks, each compressed (or stored raw) independently.
//!
//! Each logical block is zlib-framed (`ZlibEncoder`/`ZlibDecoder`) to match
//! the archive header's `compression = "zlib"` tag and the Python reference's
//! `zlib.compress`/`zlib.decompress`; a block whose compressed form would be
//! no smaller than the raw bytes is stored raw instead.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::Result;

pub const BLOCK_SIZE: usize = 65536;

/// Result of encoding one entry's uncompressed bytes: the concatenated
/// on-disk block bodies, and the per-block length array to store in the TOC.
pub struct EncodedBlocks {
    pub data: Vec<u8>,
    pub lengths: Vec<u16>,
}

/// Splits `raw` into `BLOCK_SIZE` chunks and independently zlib-compresses
/// each one, falling back to a raw copy when compression doesn't shrink it.
pub fn encode(raw: &[u8]) -> Result<EncodedBlocks> {
    let mut data = Vec::with_capacity(raw.len());
    let mut lengths = Vec::new();

    for chunk in raw.chunks(BLOCK_SIZE) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(chunk)?;
        let compressed = encoder.finish()?;

        if compressed.len() < chunk.len() {
            lengths.push(compressed.len() as u16);
            data.extend_from_slice(&compressed);
        } else {
            // Incompressible (or the final, short block): store verbatim.
            // A full-size raw block encodes as 0; any shorter raw block
            // encodes as its own length, which can never collide with 0
            // unless it actually is a full BLOCK_SIZE block.
            lengths.push((chunk.len() % BLOCK_SIZE) as u16);
            data.extend_from_slice(chunk);
        }
    }

    Ok(EncodedBlocks { data, lengths })
}

/// Reads `total_length` decompressed bytes starting at the current position
/// of `reader`, consuming block lengths from `block_lengths` in order.
pub fn decode<R: Read + Seek>(
    reader: &mut R,
    block_lengths: &[u16],
    total_length: u64,
) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(total_length as usize);

    for &len in block_lengths {
        if output.len() as u64 >= total_length {
            break;
        }

        if len == 0 {
            let mut buf = vec![0u8; BLOCK_SIZE];
            reader.read_exact(&mut buf)?;
            output.extend_from_slice(&buf);
        } else {
            let mut buf = vec![0u8; len as usize];
            reader.read_exact(&mut buf)?;

            match try_zlib_decompress(&buf) {
                Some(decompressed) => output.extend_from_slice(&decompressed),
                None => {
                    tracing::debug!(
                        physical_len = len,
                        "block failed to decompress, falling back to raw bytes"
                    );
                    output.extend_from_slice(&buf);
                }
            }
        }
    }

    output.truncate(total_length as usize);
    Ok(output)
}

fn try_zlib_decompress(data: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(Cursor::new(data));
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    Some(out)
}

/// Reads `total_length` decompressed bytes from an in-memory buffer starting
/// at `offset`, used by the archive engine against the whole archive file.
pub fn decode_from(
    data: &[u8],
    offset: u64,
    block_lengths: &[u16],
    total_length: u64,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(data);
    cursor.seek(SeekFrom::Start(offset))?;
    decode(&mut cursor, block_lengths, total_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(raw: &[u8]) -> Vec<u8> {
        let encoded = encode(raw).unwrap();
        decode_from(&encoded.data, 0, &encoded.lengths, raw.len() as u64).unwrap()
    }

    #[test]
    fn round_trips_compressible_data() {
        let raw = vec![b'a'; 200_000];
        assert_eq!(round_trip(&raw), raw);
    }

    #[test]
    fn round_trips_incompressible_data() {
        let raw: Vec<u8> = (0..70 * 1024).map(|i| (i * 2654435761u32) as u8).collect();
        assert_eq!(round_trip(&raw), raw);
    }

    #[test]
    fn incompressible_70kib_blob_encodes_as_s3_describes() {
        // S3: a 70 KiB incompressible blob splits into one full raw block
        // (length 0) and one short raw tail (length 4464).
        let raw: Vec<u8> = (0..70 * 1024).map(|i| (i * 2654435761u32) as u8).collect();
        let encoded = encode(&raw).unwrap();
        assert_eq!(encoded.lengths.len(), 2);
        assert_eq!(encoded.lengths[0], 0);
        assert_eq!(encoded.lengths[1] as usize, raw.len() % BLOCK_SIZE);
        assert_eq!(encoded.lengths[1], 4464);
    }

    #[test]
    fn zero_length_block_reads_full_block_size_raw() {
        // S4: a stored length of 0 appends BLOCK_SIZE raw bytes without
        // invoking zlib.
        let raw = vec![0xABu8; BLOCK_SIZE];
        let data = raw.clone();
        let out = decode_from(&data, 0, &[0], BLOCK_SIZE as u64).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn falls_back_to_raw_when_decompression_fails() {
        let raw = vec![1u8, 2, 3, 4, 5];
        // Not valid zlib but carries a nonzero length: must be treated as
        // verbatim bytes rather than erroring out.
        let out = decode_from(&raw, 0, &[raw.len() as u16], raw.len() as u64).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn empty_input_encodes_to_no_blocks() {
        let encoded = encode(&[]).unwrap();
        assert!(encoded.lengths.is_empty());
        assert!(encoded.data.is_empty());
    }
}
