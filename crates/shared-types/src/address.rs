//! # Lisk32 Addresses
//!
//! An address is the first 20 bytes of SHA-256 over the account's public key.
//! Its textual form is `lsk` followed by 32 data characters and a 6 character
//! BCH checksum, all drawn from a custom base32 alphabet.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha2::{Digest, Sha256};

use crate::entities::PublicKey;
use crate::errors::ParseError;

/// Address length in bytes.
pub const ADDRESS_LENGTH: usize = 20;

const PREFIX: &str = "lsk";
const CHARSET: &[u8; 32] = b"zxvcpmbn3465o978uyrtkqew2adsjhfg";
const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];
const DATA_CHARS: usize = 32;
const CHECKSUM_CHARS: usize = 6;
const ENCODED_LENGTH: usize = 3 + DATA_CHARS + CHECKSUM_CHARS;

/// A 20-byte account address.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Derive the address owned by `public_key`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    /// Build an address from raw bytes, e.g. a storage key segment.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| ParseError::InvalidLength {
                kind: "address",
                expected: ADDRESS_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Render as a lisk32 string.
    pub fn to_lisk32(&self) -> String {
        let mut data = convert_bits(&self.0, 8, 5);
        let checksum = create_checksum(&data);
        data.extend_from_slice(&checksum);

        let mut out = String::with_capacity(ENCODED_LENGTH);
        out.push_str(PREFIX);
        for v in data {
            out.push(CHARSET[v as usize] as char);
        }
        out
    }

    /// Parse and verify a lisk32 string.
    pub fn from_lisk32(s: &str) -> Result<Self, ParseError> {
        let body = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| ParseError::InvalidPrefix(s.to_string()))?;
        if s.len() != ENCODED_LENGTH {
            return Err(ParseError::InvalidLength {
                kind: "lisk32 address",
                expected: ENCODED_LENGTH,
                actual: s.len(),
            });
        }

        let mut values = Vec::with_capacity(DATA_CHARS + CHECKSUM_CHARS);
        for c in body.chars() {
            let idx = CHARSET
                .iter()
                .position(|&b| b as char == c)
                .ok_or(ParseError::InvalidCharacter(c))?;
            values.push(idx as u8);
        }

        if polymod(&values) != 1 {
            return Err(ParseError::InvalidChecksum(s.to_string()));
        }

        let bytes = convert_bits(&values[..DATA_CHARS], 5, 8);
        Self::from_slice(&bytes[..ADDRESS_LENGTH.min(bytes.len())])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lisk32())
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_lisk32(s)
    }
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(v);
        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn create_checksum(data: &[u8]) -> [u8; CHECKSUM_CHARS] {
    let mut values = data.to_vec();
    values.extend_from_slice(&[0u8; CHECKSUM_CHARS]);
    let m = polymod(&values) ^ 1;

    let mut out = [0u8; CHECKSUM_CHARS];
    for (p, slot) in out.iter_mut().enumerate() {
        *slot = ((m >> (5 * (CHECKSUM_CHARS - 1 - p))) & 31) as u8;
    }
    out
}

/// Regroup a big-endian bit stream from `from`-bit to `to`-bit words.
/// A trailing partial word is zero-padded.
fn convert_bits(data: &[u8], from: u32, to: u32) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max = (1u32 << to) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if bits > 0 && to < from {
        out.push(((acc << (to - bits)) & max) as u8);
    }
    out
}
