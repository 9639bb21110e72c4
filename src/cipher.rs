//! The PSARC stream cipher.
//!
//! This is *not* standard AES-CTR, and it is not a single AES-CFB keystream
//! over the whole buffer either (either shortcut produces wrong bytes past
//! the first 16). It is AES in CFB-128 mode, re-instantiated every 16 input
//! bytes against the *current* value of an IV that the caller increments
//! externally as a 128-bit big-endian counter between blocks.

use aes::Aes256;
use aes::cipher::{generic_array::GenericArray, AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};

pub const ARC_KEY: [u8; 32] = hex_bytes_32(
    "C53DB23870A1A2F71CAE64061FDD0E1157309DC85204D4C5BFDF25090DF2572C",
);
pub const ARC_IV: [u8; 16] = hex_bytes_16("E915AA018FEF71FC508132E4BB4CEB42");

pub const MAC_KEY: [u8; 32] = hex_bytes_32(
    "9821330E34B91F70D0A48CBD625993126970CEA09192C0E6CDA676CC9838289D",
);
pub const PC_KEY: [u8; 32] = hex_bytes_32(
    "CB648DF3D12A16BF71701414E69619EC171CCA5D2A142E3E59DE7ADDA18A3A30",
);

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'F' => c - b'A' + 10,
        b'a'..=b'f' => c - b'a' + 10,
        _ => panic!("invalid hex digit"),
    }
}

const fn hex_bytes_32(hex: &str) -> [u8; 32] {
    let bytes = hex.as_bytes();
    assert!(bytes.len() == 64);
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        out[i] = (hex_nibble(bytes[2 * i]) << 4) | hex_nibble(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

const fn hex_bytes_16(hex: &str) -> [u8; 16] {
    let bytes = hex.as_bytes();
    assert!(bytes.len() == 32);
    let mut out = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        out[i] = (hex_nibble(bytes[2 * i]) << 4) | hex_nibble(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

/// Increments a 16-byte big-endian counter by one, carrying from the
/// low-order (last) byte upward.
fn increment_iv(iv: &mut [u8; 16]) {
    for byte in iv.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Zero-pads `block` up to 16 bytes in a scratch buffer and returns the
/// number of real bytes it held.
fn padded_block(block: &[u8]) -> ([u8; 16], usize) {
    let mut buf = [0u8; 16];
    buf[..block.len()].copy_from_slice(block);
    (buf, block.len())
}

/// Runs the PSARC stream cipher over `data`, producing output padded with
/// zeros up to the next 16-byte multiple. `encrypt` selects direction; both
/// directions consume the same IV sequence.
fn run(data: &[u8], key: &[u8; 32], iv: &[u8; 16], encrypt: bool) -> Vec<u8> {
    let key = GenericArray::from_slice(key);
    let mut current_iv = *iv;
    let mut output = Vec::with_capacity(data.len().div_ceil(16) * 16);

    for chunk in data.chunks(16) {
        let (mut buf, _) = padded_block(chunk);
        let iv_array = GenericArray::from_slice(&current_iv);
        if encrypt {
            Encryptor::<Aes256>::new(key, iv_array).encrypt(&mut buf);
        } else {
            Decryptor::<Aes256>::new(key, iv_array).decrypt(&mut buf);
        }
        output.extend_from_slice(&buf);
        increment_iv(&mut current_iv);
    }

    output
}

pub fn encrypt(data: &[u8], key: &[u8; 32], iv: &[u8; 16]) -> Vec<u8> {
    run(data, key, iv, true)
}

pub fn decrypt(data: &[u8], key: &[u8; 32], iv: &[u8; 16]) -> Vec<u8> {
    run(data, key, iv, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_length() {
        let data = b"the quick brown fox jumps over the lazy dog, several times over";
        let ct = encrypt(data, &ARC_KEY, &ARC_IV);
        assert_eq!(ct.len(), data.len().div_ceil(16) * 16);
        let pt = decrypt(&ct, &ARC_KEY, &ARC_IV);
        assert_eq!(&pt[..data.len()], &data[..]);
        assert!(pt[data.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trips_exact_multiple_of_16() {
        let data = vec![7u8; 64];
        let ct = encrypt(&data, &MAC_KEY, &[0u8; 16]);
        let pt = decrypt(&ct, &MAC_KEY, &[0u8; 16]);
        assert_eq!(pt, data);
    }

    #[test]
    fn empty_input_round_trips_to_empty() {
        let ct = encrypt(&[], &PC_KEY, &[0u8; 16]);
        assert!(ct.is_empty());
        assert!(decrypt(&ct, &PC_KEY, &[0u8; 16]).is_empty());
    }

    #[test]
    fn iv_counter_carries_across_all_bytes() {
        let mut iv = [0xFFu8; 16];
        increment_iv(&mut iv);
        assert_eq!(iv, [0u8; 16]);

        let mut iv2 = [0u8; 16];
        iv2[15] = 0xFF;
        increment_iv(&mut iv2);
        assert_eq!(iv2[15], 0);
        assert_eq!(iv2[14], 1);
    }

    #[test]
    fn distinct_blocks_use_distinct_keystream() {
        // Two identical 16-byte plaintext blocks must not produce identical
        // ciphertext blocks, since the IV increments between them.
        let data = [5u8; 32];
        let ct = encrypt(&data, &ARC_KEY, &ARC_IV);
        assert_ne!(&ct[0..16], &ct[16..32]);
    }
}
