//! # Natural Key Types
//!
//! Typed wrappers for every identifier a client may supply in a request
//! path: block heights, 64-hex hashes and public keys, 16-hex mosaic and
//! namespace ids, and 25-byte account addresses in either their base32
//! or hex spelling.
//!
//! Parsers are strict about length and alphabet; a rejected key maps to
//! HTTP 409 at the API boundary, so no parser ever guesses.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use thiserror::Error;

/// Reasons a supplied key fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("expected {expected} characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid hexadecimal input")]
    Hex,

    #[error("invalid base32 input")]
    Base32,

    #[error("invalid decimal number")]
    Decimal,
}

fn parse_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], KeyParseError> {
    if s.len() != 2 * N {
        return Err(KeyParseError::Length {
            expected: 2 * N,
            actual: s.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out).map_err(|_| KeyParseError::Hex)?;
    Ok(out)
}

fn parse_hex_u64(s: &str) -> Result<u64, KeyParseError> {
    if s.len() != 16 {
        return Err(KeyParseError::Length {
            expected: 16,
            actual: s.len(),
        });
    }
    u64::from_str_radix(s, 16).map_err(|_| KeyParseError::Hex)
}

/// Block height. Parsed from a plain decimal path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Height(pub u64);

impl FromStr for Height {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Height).map_err(|_| KeyParseError::Decimal)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mosaic id, the 64-bit identifier of a mosaic. Parsed from 16 hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MosaicId(pub u64);

impl FromStr for MosaicId {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_u64(s).map(MosaicId)
    }
}

impl fmt::Display for MosaicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Namespace id, the 64-bit identifier of a namespace. Parsed from 16 hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespaceId(pub u64);

impl FromStr for NamespaceId {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_u64(s).map(NamespaceId)
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// A 32-byte entity hash, spelled as 64 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash256(pub [u8; 32]);

impl FromStr for Hash256 {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex::<32>(s).map(Hash256)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// A 32-byte account public key, spelled as 64 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl FromStr for PublicKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex::<32>(s).map(PublicKey)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// A 25-byte account address: one network version byte, the 160-bit key
/// hash, and a 4-byte checksum.
///
/// Accepted spellings are the 40-character base32 form clients usually
/// carry and the raw 50-character hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 25]);

impl Address {
    /// Encoded length of the base32 spelling.
    pub const ENCODED_LEN: usize = 40;

    pub fn from_base32(s: &str) -> Result<Self, KeyParseError> {
        if s.len() != Self::ENCODED_LEN {
            return Err(KeyParseError::Length {
                expected: Self::ENCODED_LEN,
                actual: s.len(),
            });
        }
        let decoded = BASE32_NOPAD
            .decode(s.to_ascii_uppercase().as_bytes())
            .map_err(|_| KeyParseError::Base32)?;
        let mut out = [0u8; 25];
        // 40 base32 chars decode to exactly 25 bytes
        out.copy_from_slice(&decoded);
        Ok(Address(out))
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyParseError> {
        parse_fixed_hex::<25>(s).map(Address)
    }
}

impl FromStr for Address {
    type Err = KeyParseError;

    /// Accepts base32 first (the public spelling), then hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.len() {
            Self::ENCODED_LEN => Self::from_base32(s),
            50 => Self::from_hex(s),
            actual => Err(KeyParseError::Length {
                expected: Self::ENCODED_LEN,
                actual,
            }),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE32_NOPAD.encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_parses_decimal() {
        assert_eq!("42".parse::<Height>(), Ok(Height(42)));
        assert_eq!("0".parse::<Height>(), Ok(Height(0)));
        assert_eq!("abc".parse::<Height>(), Err(KeyParseError::Decimal));
        assert_eq!("-1".parse::<Height>(), Err(KeyParseError::Decimal));
    }

    #[test]
    fn mosaic_id_requires_sixteen_hex_chars() {
        assert_eq!(
            "85BBEA6CC462B244".parse::<MosaicId>(),
            Ok(MosaicId(0x85BB_EA6C_C462_B244))
        );
        assert_eq!(
            "85BBEA6C".parse::<MosaicId>(),
            Err(KeyParseError::Length {
                expected: 16,
                actual: 8
            })
        );
        assert_eq!("85BBEA6CC462B24G".parse::<MosaicId>(), Err(KeyParseError::Hex));
    }

    #[test]
    fn hash_rejects_wrong_length() {
        let valid = "C8FCFD25A88C5CA0B52E1EFF4C2CCF4E93B4A60BF1421D5F35B2CBC3E2B6261A";
        assert!(valid.parse::<Hash256>().is_ok());

        // one character too long, the literal 66-char case from the routes
        let long = format!("{valid}AB");
        assert_eq!(
            long.parse::<Hash256>(),
            Err(KeyParseError::Length {
                expected: 64,
                actual: 66
            })
        );
    }

    #[test]
    fn address_roundtrips_base32() {
        let raw = {
            let mut bytes = [0u8; 25];
            bytes[0] = 0x98;
            for (i, b) in bytes.iter_mut().enumerate().skip(1) {
                *b = i as u8;
            }
            Address(bytes)
        };
        let encoded = raw.to_string();
        assert_eq!(encoded.len(), Address::ENCODED_LEN);
        assert_eq!(encoded.parse::<Address>(), Ok(raw));
    }

    #[test]
    fn address_accepts_hex_spelling() {
        let hex_form = format!("98{}", "01".repeat(24));
        assert_eq!(hex_form.len(), 50);
        let parsed = hex_form.parse::<Address>().unwrap();
        assert_eq!(parsed.0[0], 0x98);
        assert_eq!(parsed.0[24], 0x01);
    }

    #[test]
    fn address_rejects_other_lengths() {
        assert!(matches!(
            "TOOSHORT".parse::<Address>(),
            Err(KeyParseError::Length { .. })
        ));
    }
}
