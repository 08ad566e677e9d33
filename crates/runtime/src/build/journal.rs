//! Undo log for one build run.

use crate::ids::{ElementId, LibraryId};
use crate::overrides::ClaimKey;
use crate::runtime::Runtime;
use crate::tag::TagType;

/// One reversible index write.
#[derive(Debug)]
pub(crate) enum Entry {
	Named { library: LibraryId, name: Box<str> },
	Typed { library: LibraryId, tag: TagType, id: ElementId },
	Conflict(ClaimKey),
	Tag(TagType),
}

/// Everything a build wrote, so a failed build can be undone.
///
/// Arena slots and signal handlers are append-only, so their length at the
/// start of the run is enough to discard what the run added.
#[derive(Debug)]
pub(crate) struct Journal {
	arena_len: usize,
	handlers_len: usize,
	entries: Vec<Entry>,
}

impl Journal {
	pub(crate) fn begin(runtime: &Runtime) -> Self {
		Self {
			arena_len: runtime.arena.len(),
			handlers_len: runtime.signals.len(),
			entries: Vec::new(),
		}
	}

	pub(crate) fn record(&mut self, entry: Entry) {
		self.entries.push(entry);
	}

	pub(crate) fn arena_start(&self) -> usize {
		self.arena_len
	}

	/// Reverts every recorded write, newest first.
	pub(crate) fn rollback(self, runtime: &mut Runtime) {
		for entry in self.entries.into_iter().rev() {
			match entry {
				Entry::Named { library, name } => {
					if let Some(lib) = runtime.libraries.get_mut(library.index()) {
						lib.remove_named(&name);
					}
				}
				Entry::Typed { library, tag, id } => {
					if let Some(lib) = runtime.libraries.get_mut(library.index()) {
						lib.pop_type(&tag, id);
					}
				}
				Entry::Conflict(key) => runtime.conflicts.pop(&key),
				Entry::Tag(tag) => {
					runtime.registry.unregister(&tag);
				}
			}
		}
		runtime.signals.truncate(self.handlers_len);
		runtime.arena.truncate(self.arena_len);
	}
}
