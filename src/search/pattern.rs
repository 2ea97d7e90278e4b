//! Base58 pattern matching and difficulty estimation

use super::errors::SearchError;

/// The Base58 alphabet used by Solana addresses (no 0, O, I, l)
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Searches with more expected attempts than this are rejected up front
/// (58^5); anything beyond it would hang a session for hours.
pub const MAX_EXPECTED_ATTEMPTS: f64 = 656_356_768.0;

fn in_alphabet(c: char) -> bool {
    BASE58_ALPHABET.contains(c)
}

/// How many alphabet characters an address position can take and still
/// match the pattern character `c`
fn alternatives(c: char, case_insensitive: bool) -> u32 {
    if !case_insensitive || !c.is_ascii_alphabetic() {
        return 1;
    }
    let mut n = 0;
    if in_alphabet(c.to_ascii_lowercase()) {
        n += 1;
    }
    if in_alphabet(c.to_ascii_uppercase()) {
        n += 1;
    }
    n.max(1)
}

/// Prefix/suffix predicate over Base58 addresses
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    prefix: Option<String>,
    suffix: Option<String>,
    case_insensitive: bool,
}

impl PatternMatcher {
    /// Validate and build a matcher. Empty strings count as absent; at
    /// least one of prefix/suffix is required. Every pattern character
    /// must be reachable in the address alphabet (under case folding when
    /// `case_insensitive` is set).
    pub fn new(
        prefix: Option<String>,
        suffix: Option<String>,
        case_insensitive: bool,
    ) -> Result<Self, SearchError> {
        let prefix = prefix.filter(|p| !p.is_empty());
        let suffix = suffix.filter(|s| !s.is_empty());
        if prefix.is_none() && suffix.is_none() {
            return Err(SearchError::EmptyPattern);
        }
        for part in [&prefix, &suffix].into_iter().flatten() {
            for c in part.chars() {
                let valid = if case_insensitive {
                    in_alphabet(c.to_ascii_lowercase()) || in_alphabet(c.to_ascii_uppercase())
                } else {
                    in_alphabet(c)
                };
                if !valid {
                    return Err(SearchError::InvalidCharacter(c));
                }
            }
        }
        Ok(Self {
            prefix,
            suffix,
            case_insensitive,
        })
    }

    pub fn matches(&self, address: &str) -> bool {
        let bytes = address.as_bytes();
        if let Some(prefix) = &self.prefix {
            let p = prefix.as_bytes();
            if bytes.len() < p.len() {
                return false;
            }
            let head = &bytes[..p.len()];
            let ok = if self.case_insensitive {
                head.eq_ignore_ascii_case(p)
            } else {
                head == p
            };
            if !ok {
                return false;
            }
        }
        if let Some(suffix) = &self.suffix {
            let s = suffix.as_bytes();
            if bytes.len() < s.len() {
                return false;
            }
            let tail = &bytes[bytes.len() - s.len()..];
            let ok = if self.case_insensitive {
                tail.eq_ignore_ascii_case(s)
            } else {
                tail == s
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Expected attempts for a uniformly random address to match:
    /// 58^len, divided by the per-character case-fold alternatives when
    /// matching case-insensitively.
    pub fn expected_attempts(&self) -> f64 {
        let mut expected = 1.0;
        for part in [&self.prefix, &self.suffix].into_iter().flatten() {
            for c in part.chars() {
                expected *= 58.0 / alternatives(c, self.case_insensitive) as f64;
            }
        }
        expected
    }

    /// Reject patterns whose expected attempts exceed the ceiling
    pub fn check_difficulty(&self) -> Result<(), SearchError> {
        let expected = self.expected_attempts();
        if expected > MAX_EXPECTED_ATTEMPTS {
            return Err(SearchError::DifficultyCeiling {
                expected,
                ceiling: MAX_EXPECTED_ATTEMPTS,
            });
        }
        Ok(())
    }

    /// Human-readable pattern summary, e.g. `"abc*"` or `"*XYZ"`
    pub fn describe(&self) -> String {
        format!(
            "{}*{}",
            self.prefix.as_deref().unwrap_or(""),
            self.suffix.as_deref().unwrap_or("")
        )
    }
}
