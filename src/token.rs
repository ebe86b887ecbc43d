//! Correlation tokens for outbound commands.
//!
//! Every command is prefixed with a token and the server repeats it on the
//! framing lines of the reply. Tokens look like `GS01234`: a fixed `GS`
//! prefix followed by five zero-padded decimal digits.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ProtocolError;

/// Fixed token prefix; keeps tokens apart from server-originated identifiers.
pub const TOKEN_PREFIX: &str = "GS";

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An opaque ASCII correlation identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token(String);

impl Token {
    /// Build the token for a numeric value, e.g. `7` becomes `GS00007`.
    pub fn from_number(n: u16) -> Self {
        Self(format!("{}{:05}", TOKEN_PREFIX, n))
    }

    /// Returns the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Token {
    type Err = ProtocolError;

    /// Accepts any non-empty run of printable ASCII without whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(ProtocolError::InvalidToken(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }
}

/// Produces a fresh token for each command.
///
/// Values are drawn uniformly from `0..=65535`. Uniqueness is not global;
/// the generator only guarantees that it never hands out the same token
/// twice in a row, which is all a non-pipelined session needs.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    last: Option<u16>,
}

impl TokenGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Token {
        let mut n = random_u16();
        while Some(n) == self.last {
            n = random_u16();
        }
        self.last = Some(n);
        Token::from_number(n)
    }
}

fn random_u16() -> u16 {
    let mut buf = [0u8; 2];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u16::from_le_bytes(buf),
        Err(e) => {
            tracing::warn!("system randomness unavailable, using clock: {}", e);
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos() as u64;
            let counter = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
            (nanos ^ counter.wrapping_mul(0x9E37_79B9)) as u16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        assert_eq!(Token::from_number(0).as_str(), "GS00000");
        assert_eq!(Token::from_number(42).as_str(), "GS00042");
        assert_eq!(Token::from_number(65535).as_str(), "GS65535");
    }

    #[test]
    fn test_generated_tokens_are_well_formed() {
        let mut gen = TokenGenerator::new();
        for _ in 0..100 {
            let token = gen.next();
            let s = token.as_str();
            assert_eq!(s.len(), 7);
            assert!(s.starts_with(TOKEN_PREFIX));
            assert!(s[2..].bytes().all(|b| b.is_ascii_digit()));
            assert!(s[2..].parse::<u32>().unwrap() <= 65535);
        }
    }

    #[test]
    fn test_no_immediate_repeat() {
        let mut gen = TokenGenerator::new();
        let mut prev = gen.next();
        for _ in 0..1000 {
            let token = gen.next();
            assert_ne!(token, prev);
            prev = token;
        }
    }

    #[test]
    fn test_parse_token() {
        let token: Token = "GS12345".parse().unwrap();
        assert_eq!(token.to_string(), "GS12345");

        assert!("".parse::<Token>().is_err());
        assert!("GS 1".parse::<Token>().is_err());
        assert!("GS\n1".parse::<Token>().is_err());
    }
}
