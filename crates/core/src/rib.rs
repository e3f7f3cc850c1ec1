//! Moroccan RIB (relevé d'identité bancaire) checksum.
//!
//! A RIB is 24 digits: a 22-digit body followed by a 2-digit key. The key is
//! `97 - (body * 100 mod 97)`, which always falls in `1..=97`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const RIB_LENGTH: usize = 24;
const BODY_LENGTH: usize = 22;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RibError {
    #[error("RIB must have 24 digits, got {0}")]
    InvalidLength(usize),
    #[error("RIB contains a non-digit character")]
    NonDigit,
    #[error("RIB key {found:02} does not match expected key {expected:02}")]
    BadKey { expected: u8, found: u8 },
}

/// Returns true when `rib` (spaces ignored) is 24 digits with a correct key.
/// Never panics.
pub fn validate_rib(rib: &str) -> bool {
    Rib::from_str(rib).is_ok()
}

/// Computes the key for a 22-digit body, or `None` if the body is malformed.
pub fn rib_key(body: &str) -> Option<u8> {
    if body.len() != BODY_LENGTH || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(key_of(body.as_bytes()))
}

fn key_of(body: &[u8]) -> u8 {
    let remainder = body
        .iter()
        .fold(0u32, |acc, b| (acc * 10 + u32::from(b - b'0')) % 97);
    // Key position is taken as "00".
    let remainder = (remainder * 100) % 97;
    (97 - remainder) as u8
}

/// A RIB whose key has been verified. Deserialising runs the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rib(String);

impl Rib {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Three-digit bank code at the start of the RIB.
    pub fn bank_code(&self) -> &str {
        &self.0[..3]
    }

    pub fn key(&self) -> u8 {
        let b = self.0.as_bytes();
        (b[22] - b'0') * 10 + (b[23] - b'0')
    }
}

impl FromStr for Rib {
    type Err = RibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != ' ').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(RibError::NonDigit);
        }
        if digits.len() != RIB_LENGTH {
            return Err(RibError::InvalidLength(digits.len()));
        }

        let bytes = digits.as_bytes();
        let expected = key_of(&bytes[..BODY_LENGTH]);
        let found = (bytes[22] - b'0') * 10 + (bytes[23] - b'0');
        if found != expected {
            return Err(RibError::BadKey { expected, found });
        }
        Ok(Rib(digits))
    }
}

impl TryFrom<String> for Rib {
    type Error = RibError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rib> for String {
    fn from(rib: Rib) -> Self {
        rib.0
    }
}

impl fmt::Display for Rib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
