//! A ready-made [`DeclarationNode`] for parsers that produce plain
//! tag/attribute trees.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::BuildContext;
use crate::error::ValidationError;
use crate::ids::{DocId, LibraryId};
use crate::location::SourceLocation;
use crate::node::{BuildOutcome, DeclarationNode, NodeRef};
use crate::registry::{DeclarationRegistry, nearest, parse_bool, parse_int};
use crate::tag::TagType;

/// Attribute carrying a declaration's public name.
pub const PUBLIC_NAME_ATTR: &str = "libname";

/// A parsed tag with ordered attributes, optional text and children.
///
/// Building defers until the tag is registered, then hands the declaration
/// to the tag's factory.
#[derive(Debug, Clone)]
pub struct Declaration {
	doc_id: DocId,
	tag: TagType,
	library: LibraryId,
	location: SourceLocation,
	attributes: IndexMap<Box<str>, Box<str>>,
	text: Option<Box<str>>,
	snippet: Option<Box<str>>,
	children: Vec<NodeRef>,
}

impl Declaration {
	pub fn new(library: LibraryId, doc_id: DocId, tag: TagType, location: SourceLocation) -> Self {
		Self {
			doc_id,
			tag,
			library,
			location,
			attributes: IndexMap::new(),
			text: None,
			snippet: None,
			children: Vec::new(),
		}
	}

	pub fn attr(mut self, name: &str, value: &str) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	pub fn with_text(mut self, text: &str) -> Self {
		self.text = Some(text.into());
		self
	}

	pub fn with_snippet(mut self, snippet: &str) -> Self {
		self.snippet = Some(snippet.into());
		self
	}

	pub fn child(mut self, child: impl DeclarationNode + 'static) -> Self {
		self.children.push(Arc::new(child));
		self
	}

	pub fn child_ref(mut self, child: NodeRef) -> Self {
		self.children.push(child);
		self
	}

	pub fn into_ref(self) -> NodeRef {
		Arc::new(self)
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(|v| &**v)
	}

	pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
		self.attributes.iter().map(|(k, v)| (&**k, &**v))
	}

	/// Parses a boolean attribute; `None` when absent.
	pub fn bool_attribute(&self, name: &str) -> Result<Option<bool>, String> {
		self.attribute(name).map(parse_bool).transpose()
	}

	/// Parses an integer attribute; `None` when absent.
	pub fn int_attribute(&self, name: &str) -> Result<Option<i64>, String> {
		self.attribute(name).map(parse_int).transpose()
	}

	pub fn text(&self) -> Option<&str> {
		self.text.as_deref()
	}
}

impl DeclarationNode for Declaration {
	fn doc_id(&self) -> DocId {
		self.doc_id
	}

	fn tag(&self) -> &TagType {
		&self.tag
	}

	fn location(&self) -> &SourceLocation {
		&self.location
	}

	fn library(&self) -> LibraryId {
		self.library
	}

	fn children(&self) -> &[NodeRef] {
		&self.children
	}

	fn public_name(&self) -> Option<&str> {
		self.attribute(PUBLIC_NAME_ATTR)
	}

	fn snippet(&self) -> Option<&str> {
		self.snippet.as_deref()
	}

	fn build(&self, cx: &mut BuildContext<'_>) -> BuildOutcome {
		// Tags defined by elements of other documents may not exist yet.
		let Some(spec) = cx.registry().get(&self.tag) else {
			return BuildOutcome::NotReady;
		};
		(spec.factory())(self, cx)
	}

	fn validate(&self, registry: &DeclarationRegistry) -> Vec<ValidationError> {
		let Some(spec) = registry.get(&self.tag) else {
			return Vec::new();
		};
		let mut errors = Vec::new();

		for attribute in spec.attributes() {
			match self.attribute(&attribute.name) {
				Some(value) => {
					if let Err(reason) = attribute.kind.check(value) {
						errors.push(ValidationError::InvalidValue {
							tag: self.tag.clone(),
							attribute: attribute.name.to_string(),
							reason,
						});
					}
				}
				None if attribute.required => errors.push(ValidationError::MissingAttribute {
					tag: self.tag.clone(),
					attribute: attribute.name.to_string(),
				}),
				None => {}
			}
		}

		if !spec.allows_extra_attributes() {
			let known = || spec.attributes().iter().map(|a| &*a.name);
			for name in self.attributes.keys() {
				if &**name == PUBLIC_NAME_ATTR || spec.attribute_spec(name).is_some() {
					continue;
				}
				errors.push(ValidationError::UnknownAttribute {
					tag: self.tag.clone(),
					attribute: name.to_string(),
					suggestion: nearest(name, known(), registry.suggestion_distance()).map(str::to_owned),
				});
			}
		}
		errors
	}
}
