//! Built elements and the arena that owns them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ElementError;
use crate::ids::{ElementId, LibraryId};
use crate::node::{DeclOrder, NodeRef};

/// A live runtime object built from a declaration.
pub trait Element: Any + Send + Sync + fmt::Debug + 'static {
	/// Called once every child of this element has been built.
	fn finalize(&mut self, cx: &FinalizeContext<'_>) -> Result<(), ElementError> {
		let _ = cx;
		Ok(())
	}
}

impl dyn Element {
	pub fn is<T: Element>(&self) -> bool {
		(self as &dyn Any).is::<T>()
	}

	pub fn downcast_ref<T: Element>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}

	pub fn downcast_mut<T: Element>(&mut self) -> Option<&mut T> {
		(self as &mut dyn Any).downcast_mut::<T>()
	}
}

/// View handed to [`Element::finalize`].
pub struct FinalizeContext<'a> {
	id: ElementId,
	library: LibraryId,
	children: &'a [ElementId],
	/// Slots allocated after `id`, which is where all children live.
	later: &'a [ElementSlot],
}

impl<'a> FinalizeContext<'a> {
	pub fn id(&self) -> ElementId {
		self.id
	}

	pub fn library(&self) -> LibraryId {
		self.library
	}

	pub fn child_ids(&self) -> &'a [ElementId] {
		self.children
	}

	/// Children in build order.
	pub fn children(&self) -> impl Iterator<Item = &'a dyn Element> + '_ {
		self.children.iter().filter_map(|&id| self.child(id))
	}

	pub fn child(&self, id: ElementId) -> Option<&'a dyn Element> {
		let offset = id.index().checked_sub(self.id.index() + 1)?;
		self.later.get(offset).map(|slot| &*slot.element)
	}
}

/// Arena entry: an element plus its back-reference to the declaring node.
pub struct ElementSlot {
	element: Box<dyn Element>,
	node: NodeRef,
	document: Arc<str>,
	library: LibraryId,
	parent: Option<ElementId>,
	children: Vec<ElementId>,
	order: DeclOrder,
}

impl ElementSlot {
	pub(crate) fn new(
		element: Box<dyn Element>,
		node: NodeRef,
		document: Arc<str>,
		parent: Option<ElementId>,
		order: DeclOrder,
	) -> Self {
		Self {
			element,
			library: order.library,
			node,
			document,
			parent,
			children: Vec::new(),
			order,
		}
	}

	pub fn element(&self) -> &dyn Element {
		&*self.element
	}

	pub fn element_mut(&mut self) -> &mut dyn Element {
		&mut *self.element
	}

	/// The declaration this element was built from.
	pub fn node(&self) -> &NodeRef {
		&self.node
	}

	/// Path of the document the declaration came from.
	pub fn document(&self) -> &Arc<str> {
		&self.document
	}

	pub fn library(&self) -> LibraryId {
		self.library
	}

	pub fn parent(&self) -> Option<ElementId> {
		self.parent
	}

	pub fn children(&self) -> &[ElementId] {
		&self.children
	}

	pub fn order(&self) -> DeclOrder {
		self.order
	}
}

impl fmt::Debug for ElementSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementSlot")
			.field("element", &self.element)
			.field("tag", self.node.tag())
			.field("library", &self.library)
			.field("parent", &self.parent)
			.field("children", &self.children)
			.finish()
	}
}

/// Append-only storage for built elements.
#[derive(Debug, Default)]
pub struct ElementArena {
	slots: Vec<ElementSlot>,
}

impl ElementArena {
	pub(crate) fn insert(&mut self, slot: ElementSlot) -> ElementId {
		let id = ElementId::from_index(self.slots.len());
		if let Some(parent) = slot.parent
			&& let Some(parent) = self.slots.get_mut(parent.index())
		{
			parent.children.push(id);
		}
		self.slots.push(slot);
		id
	}

	pub fn get(&self, id: ElementId) -> Option<&ElementSlot> {
		self.slots.get(id.index())
	}

	pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementSlot> {
		self.slots.get_mut(id.index())
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (ElementId, &ElementSlot)> {
		self.slots
			.iter()
			.enumerate()
			.map(|(i, slot)| (ElementId::from_index(i), slot))
	}

	/// Slots allocated at or after `start`.
	pub(crate) fn since(&self, start: usize) -> impl Iterator<Item = (ElementId, &ElementSlot)> {
		self.iter().skip(start)
	}

	/// Runs the finalize hook of `id` with read access to its children.
	pub(crate) fn finalize(&mut self, id: ElementId) -> Result<(), ElementError> {
		let index = id.index();
		if index >= self.slots.len() {
			return Ok(());
		}
		let (head, later) = self.slots.split_at_mut(index + 1);
		let slot = &mut head[index];
		let cx = FinalizeContext {
			id,
			library: slot.library,
			children: &slot.children,
			later,
		};
		slot.element.finalize(&cx)
	}

	/// Drops every slot allocated at or after `len`, detaching them from
	/// surviving parents.
	pub(crate) fn truncate(&mut self, len: usize) {
		if len >= self.slots.len() {
			return;
		}
		let parents: Vec<ElementId> = self.slots[len..]
			.iter()
			.filter_map(|slot| slot.parent)
			.filter(|p| p.index() < len)
			.collect();
		self.slots.truncate(len);
		for parent in parents {
			if let Some(slot) = self.slots.get_mut(parent.index()) {
				slot.children.retain(|c| c.index() < len);
			}
		}
	}
}
