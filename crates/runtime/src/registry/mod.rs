//! Declaration registry: the per-namespace catalogue of known tag types.
//!
//! The registry maps each [`TagType`] to a [`TagSpec`] carrying the factory
//! used by [`Declaration`](crate::Declaration) nodes and the attribute schema
//! used by the validation pass. The build scheduler consults it when a node
//! stays stuck, to tell an unknown tag from an unresolved reference and to
//! suggest the tag that was probably meant.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::BuildContext;
use crate::decl::Declaration;
use crate::error::RegistryError;
use crate::ids::LibraryId;
use crate::node::BuildOutcome;
use crate::tag::TagType;


/// Builds an element for a [`Declaration`] of a registered tag.
pub type TagFactory = Arc<dyn Fn(&Declaration, &mut BuildContext<'_>) -> BuildOutcome + Send + Sync>;

/// Default edit-distance bound for suggestions (exclusive).
pub const DEFAULT_SUGGESTION_DISTANCE: usize = 3;

/// Expected shape of an attribute value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttributeKind {
	#[default]
	Text,
	Integer,
	Boolean,
}

impl AttributeKind {
	/// Checks that `value` parses as this kind.
	pub fn check(self, value: &str) -> Result<(), String> {
		match self {
			Self::Text => Ok(()),
			Self::Integer => parse_int(value).map(drop),
			Self::Boolean => parse_bool(value).map(drop),
		}
	}
}

/// Parse a boolean value from common string representations.
pub fn parse_bool(value: &str) -> Result<bool, String> {
	match value.to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(format!("invalid boolean: '{value}' (expected true/false, yes/no, on/off, 1/0)")),
	}
}

/// Parse an integer value.
pub fn parse_int(value: &str) -> Result<i64, String> {
	value.parse::<i64>().map_err(|_| format!("invalid integer: '{value}'"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
	pub name: Box<str>,
	pub required: bool,
	pub kind: AttributeKind,
}

/// Registration record for one tag type.
#[derive(Clone)]
pub struct TagSpec {
	tag: TagType,
	attributes: Vec<AttributeSpec>,
	allow_extra: bool,
	defined_by: Option<LibraryId>,
	factory: TagFactory,
}

impl TagSpec {
	pub fn new<F>(tag: TagType, factory: F) -> Self
	where
		F: Fn(&Declaration, &mut BuildContext<'_>) -> BuildOutcome + Send + Sync + 'static,
	{
		Self {
			tag,
			attributes: Vec::new(),
			allow_extra: false,
			defined_by: None,
			factory: Arc::new(factory),
		}
	}

	pub fn required(self, name: &str) -> Self {
		self.attribute(name, true, AttributeKind::Text)
	}

	pub fn optional(self, name: &str) -> Self {
		self.attribute(name, false, AttributeKind::Text)
	}

	pub fn attribute(mut self, name: &str, required: bool, kind: AttributeKind) -> Self {
		self.attributes.push(AttributeSpec {
			name: name.into(),
			required,
			kind,
		});
		self
	}

	/// Accept attributes not listed in the schema.
	pub fn allow_extra_attributes(mut self) -> Self {
		self.allow_extra = true;
		self
	}

	pub(crate) fn defined_by(mut self, library: LibraryId) -> Self {
		self.defined_by.get_or_insert(library);
		self
	}

	pub fn tag(&self) -> &TagType {
		&self.tag
	}

	pub fn attributes(&self) -> &[AttributeSpec] {
		&self.attributes
	}

	pub fn attribute_spec(&self, name: &str) -> Option<&AttributeSpec> {
		self.attributes.iter().find(|a| &*a.name == name)
	}

	pub fn allows_extra_attributes(&self) -> bool {
		self.allow_extra
	}

	/// Library whose element defined this tag, or `None` for host tags.
	pub fn library(&self) -> Option<LibraryId> {
		self.defined_by
	}

	pub fn factory(&self) -> &TagFactory {
		&self.factory
	}
}

impl fmt::Debug for TagSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TagSpec")
			.field("tag", &self.tag)
			.field("attributes", &self.attributes)
			.field("allow_extra", &self.allow_extra)
			.field("defined_by", &self.defined_by)
			.finish_non_exhaustive()
	}
}

/// Hint attached to a hard failure for an unknown tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
	/// A close tag name in the same namespace.
	NearestTag(String),
	/// The same tag name exists under another namespace.
	OtherNamespace { tag: String, namespace: String },
}

impl fmt::Display for Suggestion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NearestTag(tag) => write!(f, "did you mean <{tag}>?"),
			Self::OtherNamespace { tag, namespace } => {
				write!(f, "did you mean <{tag}> in namespace '{namespace}'?")
			}
		}
	}
}

/// Returns the candidate closest to `word`, if it is within `max_distance`
/// (exclusive). Ties go to the lexicographically smaller candidate.
pub fn nearest<'c>(word: &str, candidates: impl IntoIterator<Item = &'c str>, max_distance: usize) -> Option<&'c str> {
	candidates
		.into_iter()
		.map(|c| (strsim::levenshtein(word, c), c))
		.filter(|&(d, _)| d < max_distance)
		.min()
		.map(|(_, c)| c)
}

/// Known tag types grouped by namespace.
#[derive(Debug)]
pub struct DeclarationRegistry {
	namespaces: BTreeMap<Box<str>, IndexMap<Box<str>, TagSpec>>,
	suggestion_distance: usize,
}

impl Default for DeclarationRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl DeclarationRegistry {
	pub fn new() -> Self {
		Self::with_suggestion_distance(DEFAULT_SUGGESTION_DISTANCE)
	}

	pub fn with_suggestion_distance(suggestion_distance: usize) -> Self {
		Self {
			namespaces: BTreeMap::new(),
			suggestion_distance,
		}
	}

	pub fn suggestion_distance(&self) -> usize {
		self.suggestion_distance
	}

	pub(crate) fn set_suggestion_distance(&mut self, distance: usize) {
		self.suggestion_distance = distance;
	}

	/// Adds a tag type. Fails if the tag is already registered.
	pub fn register(&mut self, spec: TagSpec) -> Result<(), RegistryError> {
		let tags = self
			.namespaces
			.entry(spec.tag.namespace().into())
			.or_default();
		if let Some(existing) = tags.get(spec.tag.name()) {
			return Err(RegistryError::DuplicateTag {
				tag: spec.tag.clone(),
				defined_by: existing.defined_by,
			});
		}
		tags.insert(spec.tag.name().into(), spec);
		Ok(())
	}

	/// Removes a tag type, dropping its namespace once empty.
	pub fn unregister(&mut self, tag: &TagType) -> Option<TagSpec> {
		let tags = self.namespaces.get_mut(tag.namespace())?;
		let spec = tags.shift_remove(tag.name());
		if tags.is_empty() {
			self.namespaces.remove(tag.namespace());
		}
		spec
	}

	pub fn get(&self, tag: &TagType) -> Option<&TagSpec> {
		self.namespaces.get(tag.namespace())?.get(tag.name())
	}

	pub fn contains(&self, tag: &TagType) -> bool {
		self.get(tag).is_some()
	}

	pub fn has_namespace(&self, namespace: &str) -> bool {
		self.namespaces.contains_key(namespace)
	}

	/// Tag names registered in `namespace`, in registration order.
	pub fn tags_in<'r>(&'r self, namespace: &str) -> impl Iterator<Item = &'r str> + 'r {
		self.namespaces
			.get(namespace)
			.into_iter()
			.flat_map(|tags| tags.keys().map(|k| &**k))
	}

	/// Tags defined by elements of `library`.
	pub fn tags_defined_by(&self, library: LibraryId) -> Vec<&TagType> {
		self.namespaces
			.values()
			.flat_map(IndexMap::values)
			.filter(|spec| spec.defined_by == Some(library))
			.map(|spec| &spec.tag)
			.collect()
	}

	/// First namespace, in sorted order, that contains a tag called `name`.
	pub fn find_namespace(&self, name: &str) -> Option<&str> {
		self.namespaces
			.iter()
			.find(|(_, tags)| tags.contains_key(name))
			.map(|(ns, _)| &**ns)
	}

	/// Suggests what an unknown `tag` was meant to be.
	pub fn suggest(&self, tag: &TagType) -> Option<Suggestion> {
		if let Some(near) = nearest(tag.name(), self.tags_in(tag.namespace()), self.suggestion_distance) {
			return Some(Suggestion::NearestTag(near.to_string()));
		}
		self.find_namespace(tag.name())
			.filter(|ns| *ns != tag.namespace())
			.map(|ns| Suggestion::OtherNamespace {
				tag: tag.name().to_string(),
				namespace: ns.to_string(),
			})
	}

	pub fn len(&self) -> usize {
		self.namespaces.values().map(IndexMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.namespaces.is_empty()
	}
}
