//! Tag types and qualified public names.

use std::fmt;

/// Namespace used by tags declared without one.
pub const DEFAULT_NAMESPACE: &str = "";

/// A `(namespace, tag name)` pair identifying a kind of declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagType {
	namespace: Box<str>,
	name: Box<str>,
}

impl TagType {
	pub fn new(namespace: impl Into<Box<str>>, name: impl Into<Box<str>>) -> Self {
		Self {
			namespace: namespace.into(),
			name: name.into(),
		}
	}

	/// A tag in [`DEFAULT_NAMESPACE`].
	pub fn local(name: impl Into<Box<str>>) -> Self {
		Self::new(DEFAULT_NAMESPACE, name)
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Display for TagType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.namespace.is_empty() {
			write!(f, "<{}>", self.name)
		} else {
			write!(f, "<{{{}}}{}>", self.namespace, self.name)
		}
	}
}

/// A public name, optionally qualified with a library: `lib#name`.
///
/// `#name` and a bare `name` both refer to the library doing the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedName<'a> {
	pub library: Option<&'a str>,
	pub name: &'a str,
}

impl<'a> QualifiedName<'a> {
	pub fn parse(raw: &'a str) -> Self {
		match raw.split_once('#') {
			Some(("", name)) => Self { library: None, name },
			Some((library, name)) => Self {
				library: Some(library),
				name,
			},
			None => Self {
				library: None,
				name: raw,
			},
		}
	}
}

impl fmt::Display for QualifiedName<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.library {
			Some(library) => write!(f, "{library}#{}", self.name),
			None => f.write_str(self.name),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_qualified_names() {
		assert_eq!(
			QualifiedName::parse("auth#login"),
			QualifiedName {
				library: Some("auth"),
				name: "login"
			}
		);
		assert_eq!(QualifiedName::parse("#login").library, None);
		assert_eq!(QualifiedName::parse("login").name, "login");
	}

	#[test]
	fn display_tags() {
		assert_eq!(TagType::local("def").to_string(), "<def>");
		assert_eq!(TagType::new("http://example.org/db", "model").to_string(), "<{http://example.org/db}model>");
	}
}
