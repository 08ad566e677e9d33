//! Libraries: named bundles of documents and the indexes over what they built.

use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use crate::ids::{ElementId, LibraryId};
use crate::node::Document;
use crate::tag::TagType;

/// Load-time description of a library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySpec {
	pub name: String,
	pub version: Option<String>,
	pub priority: i32,
}

impl LibrarySpec {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	pub fn version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());
		self
	}

	pub fn priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}
}

/// A loaded library.
///
/// `by_name` maps each public name to exactly one element. `by_type` keeps
/// every element per tag in commit order, except those committed only to
/// replace a name in another library.
#[derive(Debug)]
pub struct Library {
	id: LibraryId,
	name: Box<str>,
	version: Option<Box<str>>,
	priority: i32,
	documents: Vec<Document>,
	built: Vec<bool>,
	by_name: HashMap<Box<str>, ElementId>,
	by_type: HashMap<TagType, Vec<ElementId>>,
}

impl Library {
	pub(crate) fn new(id: LibraryId, spec: LibrarySpec) -> Self {
		Self {
			id,
			name: spec.name.into(),
			version: spec.version.map(Into::into),
			priority: spec.priority,
			documents: Vec::new(),
			built: Vec::new(),
			by_name: HashMap::default(),
			by_type: HashMap::default(),
		}
	}

	pub fn id(&self) -> LibraryId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> Option<&str> {
		self.version.as_deref()
	}

	pub fn priority(&self) -> i32 {
		self.priority
	}

	pub(crate) fn set_priority(&mut self, priority: i32) {
		self.priority = priority;
	}

	pub fn documents(&self) -> &[Document] {
		&self.documents
	}

	/// True once every added document has been built.
	pub fn is_built(&self) -> bool {
		self.built.iter().all(|&built| built)
	}

	pub fn get_named_element(&self, name: &str) -> Option<ElementId> {
		self.by_name.get(name).copied()
	}

	pub fn get_elements_by_type(&self, tag: &TagType) -> &[ElementId] {
		self.by_type.get(tag).map_or(&[], Vec::as_slice)
	}

	pub fn named_elements(&self) -> impl Iterator<Item = (&str, ElementId)> {
		self.by_name.iter().map(|(name, &id)| (&**name, id))
	}

	pub(crate) fn push_document(&mut self, document: Document) {
		self.documents.push(document);
		self.built.push(false);
	}

	pub(crate) fn unbuilt_documents(&self) -> impl Iterator<Item = &Document> {
		self.documents
			.iter()
			.zip(&self.built)
			.filter_map(|(document, &built)| (!built).then_some(document))
	}

	/// Flags `document` as built if it is one of this library's own.
	pub(crate) fn mark_built(&mut self, document: &Document) {
		let index = document.ordinal() as usize;
		if let Some(own) = self.documents.get(index)
			&& Arc::ptr_eq(own.root(), document.root())
			&& let Some(built) = self.built.get_mut(index)
		{
			*built = true;
		}
	}

	/// Claims `name` for `id`. Returns `false` if the name is taken.
	pub(crate) fn insert_named(&mut self, name: &str, id: ElementId) -> bool {
		if self.by_name.contains_key(name) {
			return false;
		}
		self.by_name.insert(name.into(), id);
		true
	}

	/// Points `name` at `id`, replacing any current holder.
	pub(crate) fn rebind_named(&mut self, name: &str, id: ElementId) {
		self.by_name.insert(name.into(), id);
	}

	pub(crate) fn remove_named(&mut self, name: &str) -> Option<ElementId> {
		self.by_name.remove(name)
	}

	pub(crate) fn register_type(&mut self, tag: TagType, id: ElementId) {
		self.by_type.entry(tag).or_default().push(id);
	}

	/// Removes the last registration of `id` under `tag`.
	pub(crate) fn pop_type(&mut self, tag: &TagType, id: ElementId) {
		let Some(ids) = self.by_type.get_mut(tag) else {
			return;
		};
		if let Some(pos) = ids.iter().rposition(|&e| e == id) {
			ids.remove(pos);
		}
		if ids.is_empty() {
			self.by_type.remove(tag);
		}
	}

	/// Puts `winner` in `previous`'s place under `name` and at the same
	/// position of `previous`'s by-type list.
	pub(crate) fn substitute(&mut self, name: &str, previous: ElementId, previous_tag: &TagType, winner: ElementId) {
		if let Some(slot) = self.by_name.get_mut(name) {
			*slot = winner;
		}
		if let Some(ids) = self.by_type.get_mut(previous_tag)
			&& let Some(pos) = ids.iter().position(|&e| e == previous)
		{
			ids[pos] = winner;
		}
	}
}
