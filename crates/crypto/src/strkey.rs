//! Stellar StrKey encoding and decoding.
//!
//! A StrKey is `base32(version || payload || crc16(version || payload))`
//! without padding. The version byte fixes the first character.
//!
//! | Prefix | Payload |
//! |--------|---------|
//! | G | Ed25519 public key |
//! | M | Ed25519 public key + 64-bit id |
//! | T | Pre-authorized transaction hash |
//! | X | SHA-256 hash (hash-x signer) |
//! | P | Ed25519 public key + length-prefixed payload |

use crate::error::CryptoError;

const ALPHABET: base32::Alphabet = base32::Alphabet::Rfc4648 { padding: false };

const VERSION_ACCOUNT_ID: u8 = 6 << 3;
const VERSION_MUXED_ACCOUNT: u8 = 12 << 3;
const VERSION_SIGNED_PAYLOAD: u8 = 15 << 3;
const VERSION_PRE_AUTH_TX: u8 = 19 << 3;
const VERSION_SHA256_HASH: u8 = 23 << 3;

/// Encodes an Ed25519 public key as an account id (G...).
pub fn encode_account_id(key: &[u8; 32]) -> String {
    encode_check(VERSION_ACCOUNT_ID, key)
}

/// Decodes an account id (G...) to raw key bytes.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidStrKey`] if the string is not a valid account id.
pub fn decode_account_id(s: &str) -> Result<[u8; 32], CryptoError> {
    fixed_32(decode_check(VERSION_ACCOUNT_ID, s)?)
}

/// Encodes a muxed account (M...): the key followed by the big-endian id.
pub fn encode_muxed_account(key: &[u8; 32], id: u64) -> String {
    let mut data = Vec::with_capacity(40);
    data.extend_from_slice(key);
    data.extend_from_slice(&id.to_be_bytes());
    encode_check(VERSION_MUXED_ACCOUNT, &data)
}

/// Decodes a muxed account (M...) to key bytes and id.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidStrKey`] if the string is not a valid muxed account.
pub fn decode_muxed_account(s: &str) -> Result<([u8; 32], u64), CryptoError> {
    let data = decode_check(VERSION_MUXED_ACCOUNT, s)?;
    if data.len() != 40 {
        return Err(CryptoError::InvalidStrKey(format!(
            "muxed account data length {} != 40",
            data.len()
        )));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[..32]);
    let mut id = [0u8; 8];
    id.copy_from_slice(&data[32..]);
    Ok((key, u64::from_be_bytes(id)))
}

/// Encodes a pre-authorized transaction hash (T...).
pub fn encode_pre_auth_tx(hash: &[u8; 32]) -> String {
    encode_check(VERSION_PRE_AUTH_TX, hash)
}

/// Encodes a hash-x signer (X...).
pub fn encode_sha256_hash(hash: &[u8; 32]) -> String {
    encode_check(VERSION_SHA256_HASH, hash)
}

/// Encodes an Ed25519 signed payload signer (P...).
///
/// The payload is length-prefixed and zero-padded to a multiple of four bytes,
/// matching its XDR `opaque<64>` encoding.
pub fn encode_signed_payload(key: &[u8; 32], payload: &[u8]) -> String {
    let padded_len = payload.len().div_ceil(4) * 4;
    let mut data = Vec::with_capacity(32 + 4 + padded_len);
    data.extend_from_slice(key);
    data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    data.extend_from_slice(payload);
    data.resize(32 + 4 + padded_len, 0);
    encode_check(VERSION_SIGNED_PAYLOAD, &data)
}

fn encode_check(version: u8, data: &[u8]) -> String {
    let mut payload = Vec::with_capacity(data.len() + 3);
    payload.push(version);
    payload.extend_from_slice(data);
    let checksum = crc16_xmodem(&payload);
    payload.extend_from_slice(&checksum.to_le_bytes());
    base32::encode(ALPHABET, &payload)
}

/// Verifies the version byte and checksum and returns the payload.
fn decode_check(expected_version: u8, s: &str) -> Result<Vec<u8>, CryptoError> {
    let decoded = base32::decode(ALPHABET, s)
        .ok_or_else(|| CryptoError::InvalidStrKey("invalid base32".to_string()))?;

    if decoded.len() < 3 {
        return Err(CryptoError::InvalidStrKey("too short".to_string()));
    }
    // Re-encoding must reproduce the input exactly; this rejects
    // non-canonical trailing bits that base32 decoders otherwise accept.
    if base32::encode(ALPHABET, &decoded) != s {
        return Err(CryptoError::InvalidStrKey("non-canonical encoding".to_string()));
    }

    if decoded[0] != expected_version {
        return Err(CryptoError::InvalidStrKey(format!(
            "version byte {:02x} != {:02x}",
            decoded[0], expected_version
        )));
    }

    let checksum_pos = decoded.len() - 2;
    let checksum = u16::from_le_bytes([decoded[checksum_pos], decoded[checksum_pos + 1]]);
    if checksum != crc16_xmodem(&decoded[..checksum_pos]) {
        return Err(CryptoError::InvalidStrKey("checksum mismatch".to_string()));
    }

    Ok(decoded[1..checksum_pos].to_vec())
}

fn fixed_32(data: Vec<u8>) -> Result<[u8; 32], CryptoError> {
    let got = data.len();
    data.try_into()
        .map_err(|_| CryptoError::InvalidLength { expected: 32, got })
}

/// CRC16-XModem: polynomial 0x1021, initial value 0.
fn crc16_xmodem(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |mut crc, byte| {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
        crc
    })
}
