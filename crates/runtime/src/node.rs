//! The declaration-tree interface consumed from the parser.

use std::fmt;
use std::sync::Arc;

use crate::context::BuildContext;
use crate::element::Element;
use crate::error::ValidationError;
use crate::ids::{DocId, LibraryId};
use crate::location::SourceLocation;
use crate::registry::DeclarationRegistry;
use crate::tag::TagType;

/// Shared handle to an immutable declaration node.
pub type NodeRef = Arc<dyn DeclarationNode>;

/// Result of attempting to build one declaration.
///
/// `Inapplicable` and `NotReady` must stay distinct: the first is dropped
/// silently and never retried, the second is retried until the scheduler
/// proves no further progress is possible.
pub enum BuildOutcome {
	/// The declaration produced an element.
	Built(Box<dyn Element>),
	/// The declaration does not apply in this context.
	Inapplicable,
	/// A dependency is not available yet.
	NotReady,
}

impl BuildOutcome {
	pub fn built(element: impl Element) -> Self {
		Self::Built(Box::new(element))
	}
}

impl fmt::Debug for BuildOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Built(element) => f.debug_tuple("Built").field(element).finish(),
			Self::Inapplicable => f.write_str("Inapplicable"),
			Self::NotReady => f.write_str("NotReady"),
		}
	}
}

/// One parsed declaration. Produced once by the parser, never mutated.
pub trait DeclarationNode: Send + Sync + fmt::Debug {
	/// Ordering key among siblings.
	fn doc_id(&self) -> DocId;

	fn tag(&self) -> &TagType;

	fn location(&self) -> &SourceLocation;

	/// Library that owns the document this node was parsed from.
	fn library(&self) -> LibraryId;

	/// Children in document order.
	fn children(&self) -> &[NodeRef];

	/// Public name claimed by the element built from this node.
	///
	/// `lib#name` claims `name` in another library (replace intent).
	fn public_name(&self) -> Option<&str> {
		None
	}

	/// Source text shown in diagnostics.
	fn snippet(&self) -> Option<&str> {
		None
	}

	fn build(&self, cx: &mut BuildContext<'_>) -> BuildOutcome;

	/// Attribute and shape checks run after a successful build.
	fn validate(&self, registry: &DeclarationRegistry) -> Vec<ValidationError> {
		let _ = registry;
		Vec::new()
	}
}

/// Position of a declaration in load order.
///
/// Ordered by library load order, then document order within the library,
/// then `doc_id`. Independent of the order in which builds complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclOrder {
	pub library: LibraryId,
	pub document: u32,
	pub doc_id: DocId,
}

/// A parsed document: one root declaration owned by a library.
#[derive(Debug, Clone)]
pub struct Document {
	library: LibraryId,
	ordinal: u32,
	path: Arc<str>,
	root: NodeRef,
}

impl Document {
	/// Creates a document. `ordinal` is its position within `library`.
	pub fn new(library: LibraryId, ordinal: u32, path: impl Into<Arc<str>>, root: NodeRef) -> Self {
		Self {
			library,
			ordinal,
			path: path.into(),
			root,
		}
	}

	pub fn library(&self) -> LibraryId {
		self.library
	}

	pub fn ordinal(&self) -> u32 {
		self.ordinal
	}

	pub fn path(&self) -> &Arc<str> {
		&self.path
	}

	pub fn root(&self) -> &NodeRef {
		&self.root
	}
}

impl fmt::Display for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.path)
	}
}
