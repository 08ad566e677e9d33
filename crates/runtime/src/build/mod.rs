//! Fixpoint build scheduler.
//!
//! Declarations may reference things that are only defined later, in the same
//! document, another document or another library. The scheduler walks every
//! document tree with an explicit queue of frames and defers any node that
//! answers [`BuildOutcome::NotReady`], rotating to other work until either
//! the node builds or a full round passes without progress.
//!
//! A frame is the list of siblings still to build under one owner. Building a
//! node pushes a frame for its children at the head of the queue, so each
//! subtree is built depth-first before its owner is finalized. A deferred node
//! goes to the tail of its frame and the frame goes to the tail of the queue.
//! Any success or finalize clears the stuck set; a node seen stuck twice with
//! no progress in between is a hard failure and its remaining siblings are
//! abandoned.

mod diagnostics;
mod journal;
mod report;


use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashSet as HashSet;
use tracing::{debug, trace, warn};

use self::diagnostics::Failure;
use self::journal::{Entry, Journal};
pub use self::report::{BuildReport, BuildStats, FailedDocument};
use crate::context::{BuildContext, BuildEffects};
use crate::element::{Element, ElementSlot};
use crate::error::BuildError;
use crate::ids::ElementId;
use crate::node::{BuildOutcome, DeclOrder, Document, NodeRef};
use crate::overrides::ClaimKey;
use crate::runtime::Runtime;
use crate::tag::QualifiedName;
use crate::validate;

struct Frame {
	siblings: VecDeque<NodeRef>,
	owner: Option<ElementId>,
	/// Index into the documents being built.
	document: usize,
}

impl Frame {
	fn new(mut nodes: Vec<NodeRef>, owner: Option<ElementId>, document: usize) -> Self {
		nodes.sort_by_key(|node| node.doc_id());
		Self {
			siblings: nodes.into(),
			owner,
			document,
		}
	}
}

/// Identity of a node allocation.
fn node_key(node: &NodeRef) -> usize {
	Arc::as_ptr(node).cast::<()>().addr()
}

impl Runtime {
	/// Builds a forest of documents into elements.
	///
	/// Either every reachable declaration builds or the runtime is left
	/// exactly as it was before the call, and the report lists every hard
	/// failure found. On success, documents added to a library through
	/// [`Runtime::add_document`] count as built, so
	/// [`Runtime::build_libraries`] will not build them again.
	pub fn build(&mut self, documents: &[Document]) -> BuildReport {
		let start = Instant::now();
		let mut journal = Journal::begin(self);
		let mut stats = BuildStats::default();
		let mut failures: Vec<Failure> = Vec::new();

		let mut queue: VecDeque<Frame> = documents
			.iter()
			.enumerate()
			.map(|(i, doc)| Frame::new(vec![doc.root().clone()], None, i))
			.collect();
		let mut stuck: HashSet<usize> = HashSet::default();

		while let Some(frame) = queue.front_mut() {
			let Some(node) = frame.siblings.pop_front() else {
				if let Some(Frame {
					owner: Some(owner),
					document,
					..
				}) = queue.pop_front()
				{
					stuck.clear();
					stats.finalized += 1;
					if let Err(error) = self.arena.finalize(owner)
						&& let Some(slot) = self.arena.get(owner)
					{
						failures.push(Failure::error(
							slot.node().clone(),
							documents[document].path().clone(),
							error.into(),
						));
					}
				}
				continue;
			};
			let (owner, doc_index) = (frame.owner, frame.document);
			let document = &documents[doc_index];

			let (outcome, effects) = match self.attempt(&node, owner, document) {
				Ok(attempt) => attempt,
				Err(error) => {
					failures.push(Failure::error(node, document.path().clone(), error));
					continue;
				}
			};

			match outcome {
				BuildOutcome::Built(element) => {
					stuck.clear();
					stats.built += 1;
					let (id, errors) = self.commit(&node, element, effects, owner, document, &mut journal);
					for error in errors {
						failures.push(Failure::error(node.clone(), document.path().clone(), error));
					}
					queue.push_front(Frame::new(node.children().to_vec(), Some(id), doc_index));
				}
				BuildOutcome::Inapplicable => {
					stats.inapplicable += 1;
					trace!(tag = %node.tag(), document = %document, "declaration inapplicable");
				}
				BuildOutcome::NotReady if stuck.insert(node_key(&node)) => {
					stats.deferred += 1;
					trace!(tag = %node.tag(), document = %document, "declaration deferred");
					if let Some(frame) = queue.front_mut() {
						frame.siblings.push_back(node);
					}
					queue.rotate_left(1);
				}
				BuildOutcome::NotReady => {
					queue.pop_front();
					failures.push(Failure::stuck(node, document.path().clone()));
				}
			}
		}

		let failed: Vec<FailedDocument> = failures.iter().map(|f| f.describe(&self.registry)).collect();
		let success = failed.is_empty();

		let validation = if success && self.config.build.validate {
			validate::validate_slots(
				&self.registry,
				self.arena.since(journal.arena_start()).map(|(_, slot)| slot),
			)
		} else {
			Vec::new()
		};

		if success {
			for document in documents {
				if let Some(lib) = self.libraries.get_mut(document.library().index()) {
					lib.mark_built(document);
				}
			}
		} else {
			for failure in &failed {
				warn!(
					path = %failure.path,
					line = failure.line,
					suggestion = failure.suggestion.as_deref(),
					"{}",
					failure.message
				);
			}
			journal.rollback(self);
		}

		debug!(
			documents = documents.len(),
			built = stats.built,
			deferred = stats.deferred,
			inapplicable = stats.inapplicable,
			failed = failed.len(),
			elapsed_ms = start.elapsed().as_millis() as u64,
			success,
			"build finished"
		);

		BuildReport {
			success,
			failed,
			validation,
			stats,
		}
	}

	fn attempt(
		&self,
		node: &NodeRef,
		owner: Option<ElementId>,
		document: &Document,
	) -> Result<(BuildOutcome, BuildEffects), BuildError> {
		let library = self
			.libraries
			.get(node.library().index())
			.ok_or(BuildError::MissingLibrary(node.library()))?;
		let mut cx = BuildContext::new(self, owner, library, document);
		let outcome = node.build(&mut cx);
		Ok((outcome, cx.into_effects()))
	}

	/// Stores a freshly built element and applies what its node requested.
	///
	/// The element is committed even when a claim or tag definition fails;
	/// those failures come back to the caller and fail the run.
	fn commit(
		&mut self,
		node: &NodeRef,
		element: Box<dyn Element>,
		effects: BuildEffects,
		owner: Option<ElementId>,
		document: &Document,
		journal: &mut Journal,
	) -> (ElementId, Vec<BuildError>) {
		let library = node.library();
		let order = DeclOrder {
			library,
			document: document.ordinal(),
			doc_id: node.doc_id(),
		};
		let id = self.arena.insert(ElementSlot::new(
			element,
			node.clone(),
			document.path().clone(),
			owner,
			order,
		));

		let mut errors = Vec::new();
		let mut replacing = false;
		let names = node.public_name().map(str::to_owned).into_iter().chain(effects.names);
		for raw in names {
			let claim = QualifiedName::parse(&raw);
			let target = match claim.library {
				None => library,
				Some(name) => match self.library_ids.get(name) {
					Some(&target) => target,
					None => {
						errors.push(BuildError::UnknownLibrary {
							library: name.to_owned(),
							reference: raw.clone(),
						});
						continue;
					}
				},
			};

			if target == library
				&& let Some(lib) = self.libraries.get_mut(library.index())
				&& lib.insert_named(claim.name, id)
			{
				journal.record(Entry::Named {
					library,
					name: claim.name.into(),
				});
				continue;
			}

			trace!(%id, claim = %claim, "name claim pending override resolution");
			replacing |= target != library;
			let key = ClaimKey::new(target, claim.name);
			self.conflicts.push(key.clone(), id);
			journal.record(Entry::Conflict(key));
		}

		for spec in effects.tags {
			let tag = spec.tag().clone();
			match self.registry.register(spec.defined_by(library)) {
				Ok(()) => {
					debug!(%tag, %library, "tag defined");
					journal.record(Entry::Tag(tag));
				}
				Err(error) => errors.push(error.into()),
			}
		}

		for (pattern, sender) in effects.subscriptions {
			self.signals.register(pattern.as_str(), id, sender.as_deref());
		}

		if !replacing && let Some(lib) = self.libraries.get_mut(library.index()) {
			let tag = node.tag().clone();
			lib.register_type(tag.clone(), id);
			journal.record(Entry::Typed { library, tag, id });
		}

		(id, errors)
	}
}
