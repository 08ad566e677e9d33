use std::fmt;

use crate::validate::ValidationIssue;

/// A declaration that could not be built, with enough context to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
	pub path: String,
	pub snippet: Option<String>,
	pub line: u32,
	pub column: Option<u32>,
	pub message: String,
	pub suggestion: Option<String>,
}

impl fmt::Display for FailedDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.path, self.line)?;
		if let Some(column) = self.column {
			write!(f, ":{column}")?;
		}
		write!(f, ": {}", self.message)?;
		if let Some(suggestion) = &self.suggestion {
			write!(f, " ({suggestion})")?;
		}
		Ok(())
	}
}

/// Counters collected by one build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
	/// Nodes that produced an element.
	pub built: usize,
	/// Nodes dropped as inapplicable.
	pub inapplicable: usize,
	/// `NotReady` answers that were re-queued.
	pub deferred: usize,
	/// Finalize hooks invoked.
	pub finalized: usize,
}

/// Outcome of [`Runtime::build`](crate::Runtime::build).
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
	pub success: bool,
	pub failed: Vec<FailedDocument>,
	/// Attribute problems found after a successful build. Never fatal.
	pub validation: Vec<ValidationIssue>,
	pub stats: BuildStats,
}

impl BuildReport {
	pub fn is_success(&self) -> bool {
		self.success
	}
}
