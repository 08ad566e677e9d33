#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use trellis_runtime::{
	BuildContext, BuildOutcome, DeclarationNode, DocId, Element, ElementError, ElementId, FinalizeContext, LibraryId,
	LibrarySpec, NodeRef, Runtime, RuntimeConfig, SourceLocation, TagSpec, TagType,
};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// What a [`TestNode`] does when asked to build.
#[derive(Debug, Clone)]
pub enum Behavior {
	/// Builds a container element.
	Root,
	/// Builds and claims the given public name.
	Def(&'static str),
	/// Builds once the given name resolves.
	Ref(&'static str),
	/// Never builds.
	Stuck,
	/// Always inapplicable.
	Skip,
	/// Builds an element whose finalize hook fails.
	FailFinalize,
	/// Builds and subscribes to the pattern.
	Listen(&'static str),
	/// Builds and defines a new local tag.
	DefineTag(&'static str),
}

impl Behavior {
	fn tag(&self) -> &'static str {
		match self {
			Self::Root => "root",
			Self::Def(_) => "def",
			Self::Ref(_) => "ref",
			Self::Stuck => "stuck",
			Self::Skip => "skip",
			Self::FailFinalize => "failing",
			Self::Listen(_) => "listener",
			Self::DefineTag(_) => "tagdef",
		}
	}
}

pub const FIXTURE_TAGS: &[&str] = &["root", "def", "ref", "stuck", "skip", "failing", "listener", "tagdef"];

#[derive(Debug)]
pub struct TestNode {
	doc_id: DocId,
	tag: TagType,
	library: LibraryId,
	location: SourceLocation,
	label: String,
	behavior: Behavior,
	children: Vec<NodeRef>,
	attempts: AtomicUsize,
}

impl TestNode {
	pub fn new(library: LibraryId, doc_id: u32, behavior: Behavior) -> Self {
		Self {
			doc_id: DocId(doc_id),
			tag: TagType::local(behavior.tag()),
			library,
			location: SourceLocation::new("test.xml", doc_id + 1),
			label: String::new(),
			behavior,
			children: Vec::new(),
			attempts: AtomicUsize::new(0),
		}
	}

	pub fn label(mut self, label: &str) -> Self {
		self.label = label.to_owned();
		self
	}

	pub fn child(mut self, child: NodeRef) -> Self {
		self.children.push(child);
		self
	}

	pub fn with_children(mut self, children: impl IntoIterator<Item = NodeRef>) -> Self {
		self.children.extend(children);
		self
	}

	pub fn shared(self) -> Arc<Self> {
		Arc::new(self)
	}

	pub fn into_ref(self) -> NodeRef {
		Arc::new(self)
	}

	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::Relaxed)
	}
}

impl DeclarationNode for TestNode {
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
		match self.behavior {
			Behavior::Def(name) => Some(name),
			_ => None,
		}
	}

	fn build(&self, cx: &mut BuildContext<'_>) -> BuildOutcome {
		self.attempts.fetch_add(1, Ordering::Relaxed);
		let marker = Marker::new(&self.label);
		match &self.behavior {
			Behavior::Root | Behavior::Def(_) => BuildOutcome::built(marker),
			Behavior::Ref(name) => match cx.lookup(name) {
				Some(target) => BuildOutcome::built(Marker {
					target: Some(target),
					..marker
				}),
				None => BuildOutcome::NotReady,
			},
			Behavior::Stuck => BuildOutcome::NotReady,
			Behavior::Skip => BuildOutcome::Inapplicable,
			Behavior::FailFinalize => BuildOutcome::built(Failing),
			Behavior::Listen(pattern) => {
				cx.subscribe(*pattern, None);
				BuildOutcome::built(marker)
			}
			Behavior::DefineTag(name) => {
				let label = format!("made by <{name}>");
				cx.define_tag(TagSpec::new(TagType::local(*name), move |_, _| {
					BuildOutcome::built(Marker::new(&label))
				}));
				BuildOutcome::built(marker)
			}
		}
	}
}

/// General-purpose element used by the fixtures.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Marker {
	pub label: String,
	pub target: Option<ElementId>,
	/// Child count seen by the finalize hook.
	pub finalized_children: Option<usize>,
}

impl Marker {
	pub fn new(label: &str) -> Self {
		Self {
			label: label.to_owned(),
			..Self::default()
		}
	}
}

impl Element for Marker {
	fn finalize(&mut self, cx: &FinalizeContext<'_>) -> Result<(), ElementError> {
		self.finalized_children = Some(cx.children().count());
		Ok(())
	}
}

#[derive(Debug)]
pub struct Failing;

impl Element for Failing {
	fn finalize(&mut self, _cx: &FinalizeContext<'_>) -> Result<(), ElementError> {
		Err(ElementError::Failed("finalize refused".into()))
	}
}

/// A runtime with the fixture tags registered and the given libraries loaded.
pub fn runtime_with(libraries: &[(&str, i32)]) -> (Runtime, Vec<LibraryId>) {
	runtime_with_config(RuntimeConfig::default(), libraries)
}

pub fn runtime_with_config(config: RuntimeConfig, libraries: &[(&str, i32)]) -> (Runtime, Vec<LibraryId>) {
	init_tracing();
	let mut runtime = Runtime::with_config(config);
	for tag in FIXTURE_TAGS {
		runtime
			.register_tag(TagSpec::new(TagType::local(*tag), |_, _| BuildOutcome::Inapplicable))
			.unwrap();
	}
	let ids = libraries
		.iter()
		.map(|&(name, priority)| runtime.add_library(LibrarySpec::new(name).priority(priority)).unwrap())
		.collect();
	(runtime, ids)
}

pub fn marker(runtime: &Runtime, id: ElementId) -> &Marker {
	runtime
		.element(id)
		.and_then(|e| e.downcast_ref::<Marker>())
		.unwrap()
}

/// Label of the element registered under `name`.
pub fn label_of<'r>(runtime: &'r Runtime, name: &str) -> Option<&'r str> {
	let id = runtime.get_element(name, None)?;
	Some(marker(runtime, id).label.as_str())
}
