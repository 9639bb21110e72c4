//! The archive TOC: the fixed header, the encrypted entry
//! table, and the block-length array, plus entry-zero's path manifest.
//!
//! Entry zero is always the path manifest itself: a newline-joined,
//! reverse-lexicographically sorted list of every other entry's path.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use md5::{Digest, Md5};
use std::io::{Read, Write};

use crate::block::{self, EncodedBlocks};
use crate::cipher::{self, ARC_IV, ARC_KEY};
use crate::error::{PsarcError, Result};

pub const MAGIC: [u8; 4] = *b"PSAR";
pub const VERSION: u32 = 0x0001_0004;
pub const COMPRESSION: [u8; 4] = *b"zlib";
pub const ENTRY_RECORD_SIZE: u32 = 30;
pub const BLOCK_SIZE: u32 = 65536;
pub const ARCHIVE_FLAGS: u32 = 4;
const HEADER_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct ArchiveHeader {
    pub toc_size: u32,
    pub entry_count: u32,
}

#[derive(Debug, Clone)]
pub struct TocEntry {
    pub path: String,
    pub digest: [u8; 16],
    pub zindex: u32,
    pub length: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct Toc {
    pub header: ArchiveHeader,
    pub entries: Vec<TocEntry>,
    pub block_lengths: Vec<u16>,
}

impl TocEntry {
    /// Block lengths for this entry, taken as the suffix of the global
    /// array starting at `zindex`.
    pub fn block_lengths<'a>(&self, all: &'a [u16]) -> &'a [u16] {
        &all[self.zindex as usize..]
    }
}

fn digest_for_path(path: &str) -> [u8; 16] {
    if path.is_empty() {
        return [0u8; 16];
    }
    let mut hasher = Md5::new();
    hasher.update(path.as_bytes());
    hasher.finalize().into()
}

fn read_u40_be(buf: &[u8]) -> u64 {
    let mut v = 0u64;
    for &b in &buf[..5] {
        v = (v << 8) | b as u64;
    }
    v
}

fn write_u40_be(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes()[3..8]);
}

/// Parses the header, decrypted entry table, block-length array, and
/// entry-zero path manifest from a whole archive buffer.
pub fn parse(data: &[u8]) -> Result<Toc> {
    if data.len() < HEADER_SIZE {
        return Err(PsarcError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "archive shorter than the fixed header",
        )));
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&data[0..4]);
    if magic != MAGIC {
        return Err(PsarcError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }

    let mut header_reader = &data[4..32];
    let _version = header_reader.read_u32::<BigEndian>()?;
    let _compression = {
        let mut buf = [0u8; 4];
        header_reader.read_exact(&mut buf)?;
        buf
    };
    let toc_size = header_reader.read_u32::<BigEndian>()?;
    let entry_size = header_reader.read_u32::<BigEndian>()?;
    let entry_count = header_reader.read_u32::<BigEndian>()?;
    let _block_size = header_reader.read_u32::<BigEndian>()?;
    let _archive_flags = header_reader.read_u32::<BigEndian>()?;

    let content_len = (toc_size as usize).saturating_sub(HEADER_SIZE);
    let ciphertext = data
        .get(HEADER_SIZE..HEADER_SIZE + content_len)
        .ok_or(PsarcError::TocCryptoFailure)?;
    let plaintext = cipher::decrypt(ciphertext, &ARC_KEY, &ARC_IV);
    let plaintext = plaintext
        .get(..content_len)
        .ok_or(PsarcError::TocCryptoFailure)?;

    let record_bytes = entry_size as usize * entry_count as usize;
    if record_bytes > plaintext.len() {
        return Err(PsarcError::TocCryptoFailure);
    }

    let mut entries = Vec::with_capacity(entry_count as usize);
    for i in 0..entry_count as usize {
        let record = &plaintext[i * entry_size as usize..(i + 1) * entry_size as usize];
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&record[0..16]);
        let zindex = (&record[16..20]).read_u32::<BigEndian>()?;
        let length = read_u40_be(&record[20..25]);
        let offset = read_u40_be(&record[25..30]);
        entries.push(TocEntry {
            path: String::new(),
            digest,
            zindex,
            length,
            offset,
        });
    }

    let block_length_bytes = &plaintext[record_bytes..];
    let z = block_length_bytes.len() / 2;
    let mut block_lengths = Vec::with_capacity(z);
    for i in 0..z {
        let mut chunk = &block_length_bytes[i * 2..i * 2 + 2];
        block_lengths.push(chunk.read_u16::<BigEndian>()?);
    }

    if entries.is_empty() {
        return Ok(Toc {
            header: ArchiveHeader {
                toc_size,
                entry_count,
            },
            entries,
            block_lengths,
        });
    }

    let manifest_bytes = block::decode_from(
        data,
        entries[0].offset,
        entries[0].block_lengths(&block_lengths),
        entries[0].length,
    )?;
    let manifest = String::from_utf8_lossy(&manifest_bytes);
    let paths: Vec<&str> = manifest.split_whitespace().collect();

    for (entry, path) in entries.iter_mut().skip(1).zip(paths.into_iter()) {
        entry.path = path.to_string();
    }

    Ok(Toc {
        header: ArchiveHeader {
            toc_size,
            entry_count,
        },
        entries,
        block_lengths,
    })
}

/// One entry's already block-encoded body, ready to be placed into an
/// archive by `build`.
pub struct PendingEntry {
    pub path: String,
    pub raw_length: u64,
    pub encoded: EncodedBlocks,
}

/// Builds the header and encrypted TOC for an ordered list of pending
/// entries (entry zero, carrying the manifest, must be `entries[0]`).
///
/// Returns the header-plus-ciphertext bytes and the fully resolved
/// `TocEntry` list (with `offset`/`zindex` assigned), so the caller can
/// concatenate entry bodies in the same order to finish the archive.
pub fn build(entries: &[PendingEntry]) -> Result<(Vec<u8>, Vec<TocEntry>)> {
    let mut resolved = Vec::with_capacity(entries.len());
    let mut zindex = 0u32;
    let mut all_block_lengths: Vec<u16> = Vec::new();

    let record_bytes = ENTRY_RECORD_SIZE as usize * entries.len();

    let mut body_offset = 0u64;
    for entry in entries {
        resolved.push(TocEntry {
            path: entry.path.clone(),
            digest: digest_for_path(&entry.path),
            zindex,
            length: entry.raw_length,
            offset: body_offset, // patched to an absolute offset below.
        });
        zindex += entry.encoded.lengths.len() as u32;
        all_block_lengths.extend_from_slice(&entry.encoded.lengths);
        body_offset += entry.encoded.data.len() as u64;
    }

    let toc_size = HEADER_SIZE + record_bytes + 2 * all_block_lengths.len();

    for resolved_entry in &mut resolved {
        resolved_entry.offset += toc_size as u64;
    }

    let mut plaintext = Vec::with_capacity(toc_size - HEADER_SIZE);
    for entry in &resolved {
        plaintext.extend_from_slice(&entry.digest);
        plaintext.write_u32::<BigEndian>(entry.zindex)?;
        write_u40_be(&mut plaintext, entry.length);
        write_u40_be(&mut plaintext, entry.offset);
    }
    for &len in &all_block_lengths {
        plaintext.write_u16::<BigEndian>(len)?;
    }

    // The stream cipher always rounds its ciphertext up to a 16-byte
    // multiple internally; the bytes actually written to disk are
    // truncated back to the logical (unpadded) TOC content length so that
    // `toc_size` and the offsets computed above stay the single source of
    // truth for where entry bodies physically begin (see DESIGN.md).
    let ciphertext = cipher::encrypt(&plaintext, &ARC_KEY, &ARC_IV);
    let ciphertext = &ciphertext[..plaintext.len()];

    let mut out = Vec::with_capacity(toc_size);
    out.extend_from_slice(&MAGIC);
    out.write_u32::<BigEndian>(VERSION)?;
    out.extend_from_slice(&COMPRESSION);
    out.write_u32::<BigEndian>(toc_size as u32)?;
    out.write_u32::<BigEndian>(ENTRY_RECORD_SIZE)?;
    out.write_u32::<BigEndian>(resolved.len() as u32)?;
    out.write_u32::<BigEndian>(BLOCK_SIZE)?;
    out.write_u32::<BigEndian>(ARCHIVE_FLAGS)?;
    out.write_all(ciphertext)?;

    Ok((out, resolved))
}

/// Joins entry paths (excluding entry zero) into the newline-separated
/// manifest stored as entry zero's payload.
pub fn join_manifest(paths: &[String]) -> Vec<u8> {
    paths.join("\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pending(path: &str, raw: &[u8]) -> PendingEntry {
        PendingEntry {
            path: path.to_string(),
            raw_length: raw.len() as u64,
            encoded: block::encode(raw).unwrap(),
        }
    }

    #[test]
    fn header_round_trip_preserves_digests_lengths_and_offsets() {
        let manifest = join_manifest(&["a.txt".to_string(), "b/c.txt".to_string()]);
        let entries = vec![
            make_pending("", &manifest),
            make_pending("a.txt", b"hi\n"),
            make_pending("b/c.txt", b"ok"),
        ];
        let (toc_bytes, resolved) = build(&entries).unwrap();

        let mut data = toc_bytes.clone();
        for e in &entries {
            data.extend_from_slice(&e.encoded.data);
        }

        let toc = parse(&data).unwrap();
        assert_eq!(toc.entries.len(), resolved.len());
        for (parsed, built) in toc.entries.iter().zip(resolved.iter()) {
            assert_eq!(parsed.digest, built.digest);
            assert_eq!(parsed.length, built.length);
            assert_eq!(parsed.offset, built.offset);
        }
        assert_eq!(toc.entries[0].digest, [0u8; 16]);
        assert_eq!(toc.entries[1].path, "a.txt");
        assert_eq!(toc.entries[2].path, "b/c.txt");
    }

    #[test]
    fn smallest_offset_equals_toc_size() {
        let manifest = join_manifest(&["x".to_string()]);
        let entries = vec![make_pending("", &manifest), make_pending("x", b"data")];
        let (toc_bytes, resolved) = build(&entries).unwrap();
        let smallest = resolved.iter().map(|e| e.offset).min().unwrap();
        assert_eq!(smallest, toc_bytes.len() as u64);
    }

    #[test]
    fn offsets_are_strictly_monotonic() {
        let manifest = join_manifest(&["a".to_string(), "b".to_string(), "c".to_string()]);
        let entries = vec![
            make_pending("", &manifest),
            make_pending("a", &vec![1u8; 1000]),
            make_pending("b", &vec![2u8; 2000]),
            make_pending("c", &vec![3u8; 3000]),
        ];
        let (_, resolved) = build(&entries).unwrap();
        let offsets: Vec<u64> = resolved.iter().map(|e| e.offset).collect();
        for w in offsets.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn entry_zero_digest_is_all_zero_and_nonempty_paths_hash() {
        assert_eq!(digest_for_path(""), [0u8; 16]);
        assert_ne!(digest_for_path("a.txt"), [0u8; 16]);
    }
}
