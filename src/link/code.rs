//! Party code validation and address decoding.
//!
//! A party code is the hex tail of a `diep.io/#` link. Its first eight
//! digits carry the server's IPv4 address, one byte per digit pair, with
//! the two nibbles of every byte stored swapped.

use std::fmt;
use std::net::Ipv4Addr;

/// Shortest accepted party code.
pub const MIN_CODE_LEN: usize = 20;

/// Longest accepted party code.
pub const MAX_CODE_LEN: usize = 24;

/// Codes of exactly this length are issued for sandbox rooms.
pub const SANDBOX_CODE_LEN: usize = 22;

/// Number of leading hex digits that encode the server address.
const ADDRESS_DIGITS: usize = 8;

/// Check whether a candidate string is a syntactically valid party code.
///
/// The length must be even and within `MIN_CODE_LEN..=MAX_CODE_LEN`, and
/// every character must be a hex digit (either case).
pub fn is_valid(code: &str) -> bool {
    let len = code.len();
    len % 2 == 0
        && (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len)
        && code.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Decode the server address from the first eight hex digits of a code.
///
/// Each digit pair is one octet with its nibbles swapped, so `"0A"` is
/// `0xA0`. Octets are taken in the order they appear. Returns `None` if
/// the code is shorter than eight digits or the prefix is not hex.
pub fn decode_address(code: &str) -> Option<Ipv4Addr> {
    let digits = code.as_bytes().get(..ADDRESS_DIGITS)?;

    let mut octets = [0u8; 4];
    for (octet, pair) in octets.iter_mut().zip(digits.chunks_exact(2)) {
        let first = hex_value(pair[0])?;
        let second = hex_value(pair[1])?;
        *octet = (second << 4) | first;
    }

    Some(Ipv4Addr::from(octets))
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

/// A validated party code together with the address it decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InviteCode {
    code: String,
    address: Ipv4Addr,
}

impl InviteCode {
    /// Validate and decode a raw candidate.
    ///
    /// Invalid candidates yield `None`; they are an expected negative
    /// case, not an error.
    pub fn parse(raw: &str) -> Option<Self> {
        if !is_valid(raw) {
            return None;
        }
        let address = decode_address(raw)?;
        Some(Self {
            code: raw.to_string(),
            address,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// The decoded server address.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// True for codes of the dedicated sandbox length.
    pub fn is_sandbox_length(&self) -> bool {
        self.code.len() == SANDBOX_CODE_LEN
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
