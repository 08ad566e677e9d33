use std::fmt;
use std::sync::Arc;

/// Where a declaration appears in its source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
	pub path: Arc<str>,
	pub line: u32,
	pub column: Option<u32>,
}

impl SourceLocation {
	pub fn new(path: impl Into<Arc<str>>, line: u32) -> Self {
		Self {
			path: path.into(),
			line,
			column: None,
		}
	}

	pub fn with_column(mut self, column: u32) -> Self {
		self.column = Some(column);
		self
	}
}

impl fmt::Display for SourceLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.column {
			Some(column) => write!(f, "{}:{}:{}", self.path, self.line, column),
			None => write!(f, "{}:{}", self.path, self.line),
		}
	}
}
