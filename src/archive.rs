//! The archive engine: orchestrates the block codec, the SNG
//! payload codec, and the TOC to pack a directory into a PSARC archive or
//! unpack one back out.
//!
//! Path prefixes decide whether an entry's bytes go straight through the
//! block codec or get unwrapped from SNG framing first.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::block;
use crate::cipher::{MAC_KEY, PC_KEY};
use crate::error::{PsarcError, Result};
use crate::sng;
use crate::toc::{self, PendingEntry, Toc};

const MAC_SNG_PREFIX: &str = "songs/bin/macos/";
const PC_SNG_PREFIX: &str = "songs/bin/generic/";

fn sng_key_for(path: &str) -> Option<&'static [u8; 32]> {
    if path.starts_with(MAC_SNG_PREFIX) {
        Some(&MAC_KEY)
    } else if path.starts_with(PC_SNG_PREFIX) {
        Some(&PC_KEY)
    } else {
        None
    }
}

/// A fully unpacked archive as an in-memory association list, in storage
/// (reverse-lexicographic, entry-zero-first) order.
pub struct Unpacked {
    pub files: Vec<(String, Vec<u8>)>,
}

/// Parses `data` as a whole PSARC archive and materializes every entry's
/// bytes, applying the SNG payload codec where the path prefix calls for it.
pub fn unpack_bytes(data: &[u8]) -> Result<Unpacked> {
    let toc = toc::parse(data)?;
    let mut files = Vec::with_capacity(toc.entries.len().saturating_sub(1));

    for entry in toc.entries.iter().skip(1) {
        let raw = block::decode_from(
            data,
            entry.offset,
            entry.block_lengths(&toc.block_lengths),
            entry.length,
        )?;
        let bytes = match sng_key_for(&entry.path) {
            Some(key) => sng::decode(&raw, key)?,
            None => raw,
        };
        tracing::trace!(path = %entry.path, bytes = bytes.len(), "unpacked entry");
        files.push((entry.path.clone(), bytes));
    }

    Ok(Unpacked { files })
}

/// Builds a PSARC archive from an association list of relative path to file
/// contents, applying the SNG payload codec where the path prefix calls for
/// it. Returns the archive bytes in storage order (manifest first, then
/// entries in reverse-lexicographic path order).
pub fn pack_files(inputs: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>> {
    let mut paths: Vec<&String> = inputs.keys().collect();
    paths.sort();
    paths.reverse();

    let manifest = toc::join_manifest(&paths.iter().map(|s| s.to_string()).collect::<Vec<_>>());

    let mut pending = Vec::with_capacity(inputs.len() + 1);
    pending.push(PendingEntry {
        path: String::new(),
        raw_length: manifest.len() as u64,
        encoded: block::encode(&manifest)?,
    });

    for path in &paths {
        let data = &inputs[*path];
        let framed = match sng_key_for(path) {
            Some(key) => sng::encode(data, key)?,
            None => data.clone(),
        };
        pending.push(PendingEntry {
            path: (*path).clone(),
            raw_length: framed.len() as u64,
            encoded: block::encode(&framed)?,
        });
    }

    let (toc_bytes, resolved) = toc::build(&pending)?;

    let mut out = toc_bytes;
    for entry in &pending {
        out.extend_from_slice(&entry.encoded.data);
    }
    debug_assert_eq!(resolved.len(), pending.len());

    Ok(out)
}

/// Walks `dir` recursively and packs it into `<normalized-dir>.psarc` next
/// to it, returning the archive's path.
pub fn pack_directory(dir: &Path) -> Result<std::path::PathBuf> {
    let mut inputs = BTreeMap::new();
    collect_files(dir, dir, &mut inputs)?;

    let archive_bytes = pack_files(&inputs)?;

    let normalized = dir
        .to_str()
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| dir.display().to_string());
    let out_path = std::path::PathBuf::from(format!("{normalized}.psarc"));
    fs::write(&out_path, archive_bytes)?;
    tracing::info!(archive = %out_path.display(), "packed archive");
    Ok(out_path)
}

fn collect_files(
    root: &Path,
    current: &Path,
    out: &mut BTreeMap<String, Vec<u8>>,
) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .expect("walked entry is always under root")
                .to_string_lossy()
                .replace('\\', "/");
            if out.contains_key(&rel) {
                return Err(PsarcError::PathConflict(rel));
            }
            out.insert(rel, fs::read(&path)?);
        }
    }
    Ok(())
}

/// Reads `file` as a PSARC archive and explodes it into `<file-stem>/...`
/// next to it, creating intermediate directories as needed.
pub fn unpack_file(file: &Path) -> Result<std::path::PathBuf> {
    let data = fs::read(file)?;
    let unpacked = unpack_bytes(&data)?;

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    let out_dir = file
        .parent()
        .map(|p| p.join(&stem))
        .unwrap_or_else(|| std::path::PathBuf::from(&stem));

    for (path, bytes) in &unpacked.files {
        let dest = out_dir.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, bytes)?;
    }

    tracing::info!(dir = %out_dir.display(), files = unpacked.files.len(), "unpacked archive");
    Ok(out_dir)
}

/// Parses just the TOC, without materializing entry bodies. Exposed for
/// callers that only need the directory listing.
pub fn read_toc(data: &[u8]) -> Result<Toc> {
    toc::parse(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(p, d)| (p.to_string(), d.to_vec()))
            .collect()
    }

    #[test]
    fn s1_round_trips_two_plain_files_in_reverse_lex_storage_order() {
        let map = inputs(&[("a.txt", b"hi\n"), ("b/c.txt", b"ok")]);
        let archive = pack_files(&map).unwrap();
        let unpacked = unpack_bytes(&archive).unwrap();

        let paths: Vec<&str> = unpacked.files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["b/c.txt", "a.txt"]);

        let result: BTreeMap<String, Vec<u8>> = unpacked.files.into_iter().collect();
        assert_eq!(result, map);
    }

    #[test]
    fn s2_sng_payload_round_trips_and_is_framed_smaller_than_raw_for_zeros() {
        let random: Vec<u8> = (0..100_000u32).map(|i| (i * 48271) as u8).collect();
        let map = inputs(&[("songs/bin/generic/foo.sng", &random)]);
        let archive = pack_files(&map).unwrap();
        let unpacked = unpack_bytes(&archive).unwrap();
        assert_eq!(unpacked.files[0].1, random);

        let zeros = vec![0u8; 100_000];
        let zero_map = inputs(&[("songs/bin/generic/foo.sng", &zeros)]);
        let sng_archive = pack_files(&zero_map).unwrap();

        let plain_map = inputs(&[("plain/foo.bin", &zeros)]);
        let plain_archive = pack_files(&plain_map).unwrap();

        // SNG framing adds header/IV/trailer overhead before block
        // compression; the wrapped archive's body should differ in size
        // from the unwrapped equivalent, showing the SNG path was taken.
        assert_ne!(sng_archive.len(), plain_archive.len());
    }

    #[test]
    fn every_entry_decompresses_to_its_declared_length() {
        let map = inputs(&[("a", &[1u8; 5000]), ("b", &[2u8; 200_000])]);
        let archive = pack_files(&map).unwrap();
        let toc = read_toc(&archive).unwrap();
        for entry in toc.entries.iter().skip(1) {
            let raw = block::decode_from(
                &archive,
                entry.offset,
                entry.block_lengths(&toc.block_lengths),
                entry.length,
            )
            .unwrap();
            assert_eq!(raw.len() as u64, entry.length);
        }
    }

    #[test]
    fn entry_zero_digest_and_manifest_match_other_paths() {
        let map = inputs(&[("x", b"1"), ("y", b"2"), ("z", b"3")]);
        let archive = pack_files(&map).unwrap();
        let toc = read_toc(&archive).unwrap();
        assert_eq!(toc.entries[0].digest, [0u8; 16]);

        let mut other_paths: Vec<String> =
            toc.entries.iter().skip(1).map(|e| e.path.clone()).collect();
        other_paths.sort();
        other_paths.reverse();
        let mut expected: Vec<String> = map.keys().cloned().collect();
        expected.sort();
        expected.reverse();
        assert_eq!(other_paths, expected);
    }

    #[test]
    fn collect_files_rejects_duplicate_relative_paths_across_two_roots() {
        let first_root = tempfile::tempdir().unwrap();
        let second_root = tempfile::tempdir().unwrap();
        fs::write(first_root.path().join("same.txt"), b"1").unwrap();
        fs::write(second_root.path().join("same.txt"), b"2").unwrap();

        let mut out = BTreeMap::new();
        collect_files(first_root.path(), first_root.path(), &mut out).unwrap();
        let err = collect_files(second_root.path(), second_root.path(), &mut out).unwrap_err();
        assert!(matches!(err, PsarcError::PathConflict(path) if path == "same.txt"));
    }
}
