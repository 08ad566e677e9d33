//! Best-effort attribute checks over freshly built declarations.

use std::fmt;

use tracing::{debug, warn};

use crate::element::ElementSlot;
use crate::error::ValidationError;
use crate::registry::DeclarationRegistry;

/// A validation problem tied to where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
	pub path: String,
	pub line: u32,
	pub column: Option<u32>,
	pub error: ValidationError,
}

impl fmt::Display for ValidationIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}: {}", self.path, self.line, self.error)?;
		if let Some(suggestion) = self.error.suggestion() {
			write!(f, " ({suggestion})")?;
		}
		Ok(())
	}
}

pub(crate) fn validate_slots<'a>(
	registry: &DeclarationRegistry,
	slots: impl Iterator<Item = &'a ElementSlot>,
) -> Vec<ValidationIssue> {
	let mut issues = Vec::new();
	let mut checked = 0usize;
	for slot in slots {
		checked += 1;
		let node = slot.node();
		let location = node.location();
		for error in node.validate(registry) {
			warn!(path = %location.path, line = location.line, "{error}");
			issues.push(ValidationIssue {
				path: slot.document().to_string(),
				line: location.line,
				column: location.column,
				error,
			});
		}
	}
	debug!(checked, issues = issues.len(), "validation finished");
	issues
}
