//! Dotted wildcard patterns.

use std::fmt;

/// Token that matches any single signal token.
pub const WILDCARD: &str = "*";

/// A parsed handler pattern such as `auth.*.login`.
///
/// Patterns and signal names are compared token by token. The shorter side is
/// padded with a sentinel that nothing matches, so `a.*` matches `a.b` but not
/// a bare `a`, and `a.*.c` does not match `a.b.c.d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
	raw: Box<str>,
	tokens: Box<[Box<str>]>,
}

impl Pattern {
	pub fn new(raw: &str) -> Self {
		Self {
			raw: raw.into(),
			tokens: raw.split('.').map(Into::into).collect(),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Returns true if the pattern contains at least one wildcard token.
	pub fn is_wildcard(&self) -> bool {
		self.tokens.iter().any(|t| &**t == WILDCARD)
	}

	pub fn matches(&self, signal: &str) -> bool {
		let mut pattern = self.tokens.iter();
		let mut signal = signal.split('.');
		loop {
			match (pattern.next(), signal.next()) {
				(None, None) => return true,
				(Some(p), Some(s)) if &**p == WILDCARD || &**p == s => {}
				_ => return false,
			}
		}
	}
}

impl From<&str> for Pattern {
	fn from(raw: &str) -> Self {
		Self::new(raw)
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}
