//! Turns hard build failures into actionable [`FailedDocument`]s.

use std::sync::Arc;

use crate::build::report::FailedDocument;
use crate::error::BuildError;
use crate::node::NodeRef;
use crate::registry::DeclarationRegistry;

#[derive(Debug)]
pub(crate) enum Cause {
	/// Still `NotReady` after a full round without progress.
	Stuck,
	Error(BuildError),
}

#[derive(Debug)]
pub(crate) struct Failure {
	pub node: NodeRef,
	pub path: Arc<str>,
	pub cause: Cause,
}

impl Failure {
	pub(crate) fn stuck(node: NodeRef, path: Arc<str>) -> Self {
		Self {
			node,
			path,
			cause: Cause::Stuck,
		}
	}

	pub(crate) fn error(node: NodeRef, path: Arc<str>, error: BuildError) -> Self {
		Self {
			node,
			path,
			cause: Cause::Error(error),
		}
	}

	pub(crate) fn describe(&self, registry: &DeclarationRegistry) -> FailedDocument {
		let tag = self.node.tag();
		let path = &self.path;
		let (message, suggestion) = match &self.cause {
			Cause::Stuck if !registry.contains(tag) => (
				format!("unknown tag {tag} in {path}"),
				registry.suggest(tag).map(|s| s.to_string()),
			),
			Cause::Stuck => (
				format!("unable to build {tag} in {path}: a dependency was never resolved"),
				None,
			),
			Cause::Error(error) => (format!("{tag} in {path}: {error}"), None),
		};
		let location = self.node.location();
		FailedDocument {
			path: path.to_string(),
			snippet: self.node.snippet().map(str::to_owned),
			line: location.line,
			column: location.column,
			message,
			suggestion,
		}
	}
}
