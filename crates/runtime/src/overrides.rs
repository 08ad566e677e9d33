//! Cross-library override bookkeeping and resolution.
//!
//! Claims that could not be indexed at commit time (a taken own name, or a
//! `lib#name` replace claim) are parked in a [`ConflictTable`]. Once every
//! library is built, [`resolve`] settles each key: the latest duplicate inside
//! the library takes the name, then the best claim from another library
//! replaces it only from a strictly higher priority.

use std::cmp::Ordering;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::element::ElementArena;
use crate::ids::{ElementId, LibraryId};
use crate::library::Library;
use crate::node::DeclOrder;

/// A public name inside a specific library.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimKey {
	pub library: LibraryId,
	pub name: Box<str>,
}

impl ClaimKey {
	pub fn new(library: LibraryId, name: &str) -> Self {
		Self {
			library,
			name: name.into(),
		}
	}
}

/// Pending claims, keyed by the name they target.
#[derive(Debug, Default)]
pub struct ConflictTable {
	entries: IndexMap<ClaimKey, Vec<ElementId>>,
}

impl ConflictTable {
	pub(crate) fn push(&mut self, key: ClaimKey, candidate: ElementId) {
		self.entries.entry(key).or_default().push(candidate);
	}

	/// Removes the most recent candidate for `key`.
	pub(crate) fn pop(&mut self, key: &ClaimKey) {
		if let Some(candidates) = self.entries.get_mut(key) {
			candidates.pop();
			if candidates.is_empty() {
				self.entries.shift_remove(key);
			}
		}
	}

	pub fn candidates(&self, key: &ClaimKey) -> &[ElementId] {
		self.entries.get(key).map_or(&[], Vec::as_slice)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&ClaimKey, &[ElementId])> {
		self.entries.iter().map(|(k, v)| (k, v.as_slice()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// One side of an override decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Party {
	pub element: ElementId,
	pub priority: i32,
	pub order: DeclOrder,
}

/// Orders parties by library priority, then declaration order. The greater
/// party wins.
pub fn cmp_party(a: &Party, b: &Party) -> Ordering {
	a.priority
		.cmp(&b.priority)
		.then_with(|| a.order.cmp(&b.order))
}

/// What the resolver did with one key.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
	/// The current holder outranks every claimant.
	KeptExisting,
	/// The winning claimant took the holder's place.
	ReplacedExisting,
	/// Nothing holds the name in the target library; the claim was ignored.
	NoTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideResolution {
	pub key: ClaimKey,
	pub previous: Option<ElementId>,
	pub winner: ElementId,
	pub action: Resolution,
}

fn party(id: ElementId, libraries: &[Library], arena: &ElementArena) -> Option<Party> {
	let slot = arena.get(id)?;
	let library = libraries.get(slot.library().index())?;
	Some(Party {
		element: id,
		priority: library.priority(),
		order: slot.order(),
	})
}

/// Resolves every pending claim in key order and empties the table.
///
/// Duplicates inside the target library rebind the name in declaration
/// order. A claim from another library then replaces the holder only when
/// its library has a strictly higher priority than the holder's.
pub(crate) fn resolve(
	conflicts: &mut ConflictTable,
	libraries: &mut [Library],
	arena: &ElementArena,
) -> Vec<OverrideResolution> {
	let mut entries = std::mem::take(&mut conflicts.entries);
	entries.sort_unstable_keys();

	let mut resolutions = Vec::with_capacity(entries.len());
	for (key, candidates) in entries {
		let (own, foreign): (Vec<Party>, Vec<Party>) = candidates
			.iter()
			.filter_map(|&id| party(id, libraries, arena))
			.partition(|p| p.order.library == key.library);
		let Some(target) = libraries.get(key.library.index()) else {
			continue;
		};

		let previous = target.get_named_element(&key.name);
		let holder = previous
			.and_then(|id| party(id, libraries, arena))
			.into_iter()
			.chain(own)
			.max_by(cmp_party);
		if let Some(latest) = holder
			&& previous != Some(latest.element)
			&& let Some(target) = libraries.get_mut(key.library.index())
		{
			target.rebind_named(&key.name, latest.element);
		}

		let claimant = foreign.into_iter().max_by(cmp_party);
		let Some(current) = holder else {
			let Some(claimant) = claimant else {
				continue;
			};
			warn!(
				library = %key.library,
				name = &*key.name,
				claimant = %claimant.element,
				"replace target does not exist; claim ignored"
			);
			resolutions.push(OverrideResolution {
				key,
				previous: None,
				winner: claimant.element,
				action: Resolution::NoTarget,
			});
			continue;
		};

		let mut winner = current.element;
		if let Some(claimant) = claimant
			&& current.priority < claimant.priority
			&& let Some(slot) = arena.get(current.element)
			&& let Some(target) = libraries.get_mut(key.library.index())
		{
			target.substitute(&key.name, current.element, slot.node().tag(), claimant.element);
			winner = claimant.element;
		}

		let action = if previous == Some(winner) {
			Resolution::KeptExisting
		} else {
			Resolution::ReplacedExisting
		};
		debug!(
			library = %key.library,
			name = &*key.name,
			previous = ?previous,
			%winner,
			?action,
			"override resolved"
		);
		resolutions.push(OverrideResolution {
			key,
			previous,
			winner,
			action,
		});
	}
	resolutions
}
