//! What a declaration can see and request while it is being built.

use crate::element::Element;
use crate::ids::{ElementId, LibraryId};
use crate::library::Library;
use crate::node::Document;
use crate::registry::{DeclarationRegistry, TagSpec};
use crate::runtime::Runtime;
use crate::tag::QualifiedName;

/// Side effects requested by a node during [`DeclarationNode::build`].
///
/// They are applied only if the node returns
/// [`BuildOutcome::Built`](crate::BuildOutcome::Built); a deferred or
/// inapplicable attempt leaves no trace.
///
/// [`DeclarationNode::build`]: crate::DeclarationNode::build
#[derive(Debug, Default)]
pub(crate) struct BuildEffects {
	pub names: Vec<String>,
	pub subscriptions: Vec<(String, Option<String>)>,
	pub tags: Vec<TagSpec>,
}

/// Read access to the runtime plus a request buffer, handed to each build attempt.
pub struct BuildContext<'a> {
	runtime: &'a Runtime,
	owner: Option<ElementId>,
	library: &'a Library,
	document: &'a Document,
	effects: BuildEffects,
}

impl<'a> BuildContext<'a> {
	pub(crate) fn new(runtime: &'a Runtime, owner: Option<ElementId>, library: &'a Library, document: &'a Document) -> Self {
		Self {
			runtime,
			owner,
			library,
			document,
			effects: BuildEffects::default(),
		}
	}

	/// Element built from the parent declaration, if any.
	pub fn owner(&self) -> Option<ElementId> {
		self.owner
	}

	pub fn owner_element(&self) -> Option<&'a dyn Element> {
		self.owner.and_then(|id| self.element(id))
	}

	pub fn library_id(&self) -> LibraryId {
		self.library.id()
	}

	/// Library owning the declaration being built.
	pub fn library(&self) -> &'a Library {
		self.library
	}

	pub fn document(&self) -> &'a Document {
		self.document
	}

	pub fn registry(&self) -> &'a DeclarationRegistry {
		self.runtime.registry()
	}

	/// Resolves a public name. Bare and `#name` forms look in the current library.
	///
	/// Returns `None` while the name is not registered yet; callers usually
	/// answer [`BuildOutcome::NotReady`](crate::BuildOutcome::NotReady).
	pub fn lookup(&self, name: &str) -> Option<ElementId> {
		let name = QualifiedName::parse(name);
		let library = match name.library {
			Some(library) => self.runtime.library_by_name(library)?,
			None => self.library,
		};
		library.get_named_element(name.name)
	}

	pub fn element(&self, id: ElementId) -> Option<&'a dyn Element> {
		self.runtime.element(id)
	}

	/// Looks up a public name and downcasts the element behind it.
	pub fn get<T: Element>(&self, name: &str) -> Option<&'a T> {
		self.lookup(name)
			.and_then(|id| self.element(id))
			.and_then(|element| element.downcast_ref::<T>())
	}

	/// Claims an additional public name for the element being built.
	pub fn claim_name(&mut self, name: impl Into<String>) {
		self.effects.names.push(name.into());
	}

	/// Subscribes the element being built to signals matching `pattern`.
	pub fn subscribe(&mut self, pattern: impl Into<String>, sender: Option<&str>) {
		self.effects
			.subscriptions
			.push((pattern.into(), sender.map(str::to_owned)));
	}

	/// Registers a new tag once the element being built is committed.
	pub fn define_tag(&mut self, spec: TagSpec) {
		self.effects.tags.push(spec);
	}

	pub(crate) fn into_effects(self) -> BuildEffects {
		self.effects
	}
}
