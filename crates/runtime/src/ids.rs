//! Dense identifiers for arena-allocated runtime objects.

use std::fmt;

/// Index of a built element in the runtime's element arena.
///
/// Ids are allocated in build order, so a parent always has a smaller id
/// than any of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
	#[inline]
	pub fn as_u32(self) -> u32 {
		self.0
	}

	#[inline]
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}

	pub(crate) fn from_index(index: usize) -> Self {
		Self(u32::try_from(index).unwrap_or(u32::MAX))
	}
}

impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ElementId({})", self.0)
	}
}

/// Identifier of a loaded library. Also its load ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryId(pub(crate) u32);

impl LibraryId {
	#[inline]
	pub fn as_u32(self) -> u32 {
		self.0
	}

	#[inline]
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}

	pub(crate) fn from_index(index: usize) -> Self {
		Self(u32::try_from(index).unwrap_or(u32::MAX))
	}
}

impl fmt::Display for LibraryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "LibraryId({})", self.0)
	}
}

/// Ordering key of a declaration among its siblings, assigned by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub u32);

impl fmt::Display for DocId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
