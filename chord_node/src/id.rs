//! Identifier algebra for the 160-bit ring.
//!
//! An [`Id`] is a SHA-1 digest interpreted as an unsigned big-endian 160-bit
//! integer. Byte-lexicographic ordering on the raw digest is the same as
//! numeric ordering under that interpretation, which is why `Id` can derive
//! `Ord` directly instead of hand-rolling comparisons.

use sha1::{Digest, Sha1};
use std::fmt;

/// Number of bits in the identifier space; also the size of the finger table.
pub const BITS: usize = 160;
const BYTES: usize = BITS / 8;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; BYTES]);

impl Id {
    pub const ZERO: Id = Id([0u8; BYTES]);

    pub fn from_bytes(bytes: [u8; BYTES]) -> Self {
        Id(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BYTES] {
        &self.0
    }

    /// `SHA1(host + ":" + port)`, interpreted as a big-endian unsigned integer.
    pub fn compute(host: &str, port: u16) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(host.as_bytes());
        hasher.update(b":");
        hasher.update(port.to_string().as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; BYTES];
        bytes.copy_from_slice(&digest);
        Id(bytes)
    }

    /// `(self + 2^power) mod 2^160`, used to compute finger table starts.
    pub fn add_power_of_two(&self, power: u32) -> Id {
        debug_assert!((power as usize) < BITS);

        let mut addend = [0u8; BYTES];
        // Bit `power` from the least-significant end, addend stored big-endian.
        let byte_index = BYTES - 1 - (power as usize / 8);
        addend[byte_index] = 1u8 << (power % 8);

        Id(add_mod(&self.0, &addend))
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(BYTES * 2);
        for byte in &self.0 {
            out.push(HEX_CHARS[(byte >> 4) as usize] as char);
            out.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        out
    }

    pub fn from_hex(s: &str) -> Result<Id, IdParseError> {
        if s.len() != BYTES * 2 {
            return Err(IdParseError::WrongLength(s.len()));
        }

        let mut bytes = [0u8; BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_value(s.as_bytes()[i * 2]).ok_or(IdParseError::NotHex)?;
            let lo = hex_value(s.as_bytes()[i * 2 + 1]).ok_or(IdParseError::NotHex)?;
            *byte = (hi << 4) | lo;
        }
        Ok(Id(bytes))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_hex())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("expected a 40-character hex string, got {0} characters")]
    WrongLength(usize),
    #[error("expected only hex digits")]
    NotHex,
}

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn add_mod(a: &[u8; BYTES], b: &[u8; BYTES]) -> [u8; BYTES] {
    let mut out = [0u8; BYTES];
    let mut carry: u16 = 0;
    for i in (0..BYTES).rev() {
        let sum = a[i] as u16 + b[i] as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    // Overflow past 2^160 wraps around, i.e. is simply discarded.
    out
}

/// `isIdInRange`: half-open arc `(start, end]`, wrapping through zero when
/// `start >= end`. The whole ring when `start == end`.
pub fn is_id_in_range(id: Id, start: Id, end: Id) -> bool {
    if start == end {
        return true;
    }
    if start < end {
        id > start && id <= end
    } else {
        id > start || id <= end
    }
}

/// `fingerInRange`: open arc `(start, end)`, same wrap-around rule. The whole
/// ring when `start == end`.
pub fn finger_in_range(key: Id, start: Id, end: Id) -> bool {
    if start == end {
        return true;
    }
    if start < end {
        key > start && key < end
    } else {
        key > start || key < end
    }
}
