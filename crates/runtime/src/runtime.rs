use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, info, warn};
use trellis_signals::{CachePolicy, FireReport, Signal, SignalRouter};

use crate::build::BuildReport;
use crate::config::RuntimeConfig;
use crate::element::{Element, ElementArena, ElementSlot};
use crate::error::{RegistryError, RuntimeError};
use crate::ids::{ElementId, LibraryId};
use crate::library::{Library, LibrarySpec};
use crate::node::{Document, NodeRef};
use crate::overrides::{self, ConflictTable, OverrideResolution};
use crate::registry::{DeclarationRegistry, TagSpec};
use crate::tag::{QualifiedName, TagType};

/// Owns every library, the built element graph and the signal table.
#[derive(Debug)]
pub struct Runtime {
	pub(crate) config: RuntimeConfig,
	pub(crate) registry: DeclarationRegistry,
	pub(crate) libraries: Vec<Library>,
	pub(crate) library_ids: HashMap<Box<str>, LibraryId>,
	pub(crate) arena: ElementArena,
	pub(crate) conflicts: ConflictTable,
	pub(crate) signals: SignalRouter<ElementId>,
	resolved: bool,
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

impl Runtime {
	pub fn new() -> Self {
		Self::with_config(RuntimeConfig::default())
	}

	pub fn with_config(config: RuntimeConfig) -> Self {
		Self {
			registry: DeclarationRegistry::with_suggestion_distance(config.build.suggestion_distance),
			signals: SignalRouter::with_policy(config.signals.cache.into()),
			config,
			libraries: Vec::new(),
			library_ids: HashMap::default(),
			arena: ElementArena::default(),
			conflicts: ConflictTable::default(),
			resolved: false,
		}
	}

	pub fn config(&self) -> &RuntimeConfig {
		&self.config
	}

	pub fn registry(&self) -> &DeclarationRegistry {
		&self.registry
	}

	pub fn registry_mut(&mut self) -> &mut DeclarationRegistry {
		&mut self.registry
	}

	/// Registers a host tag.
	pub fn register_tag(&mut self, spec: TagSpec) -> Result<(), RegistryError> {
		self.registry.register(spec)
	}

	/// Replaces the configuration. A cache policy change only applies while
	/// no signal handler is registered; otherwise it is logged and dropped.
	pub fn set_config(&mut self, config: RuntimeConfig) {
		self.registry
			.set_suggestion_distance(config.build.suggestion_distance);
		let policy: CachePolicy = config.signals.cache.into();
		if self.signals.is_empty() {
			self.signals = SignalRouter::with_policy(policy);
		} else if policy != self.signals.policy() {
			warn!(
				current = ?self.signals.policy(),
				requested = ?policy,
				handlers = self.signals.len(),
				"signal handlers already registered; cache policy unchanged"
			);
		}
		for library in &mut self.libraries {
			if let Some(priority) = config.priority_for(library.name()) {
				library.set_priority(priority);
			}
		}
		self.config = config;
	}

	/// Loads a library. Its configured priority, if any, wins over `spec`'s.
	pub fn add_library(&mut self, mut spec: LibrarySpec) -> Result<LibraryId, RuntimeError> {
		if self.library_ids.contains_key(spec.name.as_str()) {
			return Err(RuntimeError::DuplicateLibrary(spec.name));
		}
		if let Some(priority) = self.config.priority_for(&spec.name) {
			spec.priority = priority;
		}
		let id = LibraryId::from_index(self.libraries.len());
		debug!(library = %spec.name, version = spec.version.as_deref(), priority = spec.priority, "library loaded");
		self.library_ids.insert(spec.name.as_str().into(), id);
		self.libraries.push(Library::new(id, spec));
		Ok(id)
	}

	/// Adds a parsed document to `library`, to be built by
	/// [`build_libraries`](Self::build_libraries).
	pub fn add_document(
		&mut self,
		library: LibraryId,
		path: &str,
		root: NodeRef,
	) -> Result<Document, RuntimeError> {
		let lib = self
			.libraries
			.get_mut(library.index())
			.ok_or(RuntimeError::InvalidLibrary(library))?;
		let ordinal = u32::try_from(lib.documents().len()).unwrap_or(u32::MAX);
		let document = Document::new(library, ordinal, path, root);
		lib.push_document(document.clone());
		Ok(document)
	}

	pub fn library(&self, id: LibraryId) -> Option<&Library> {
		self.libraries.get(id.index())
	}

	pub fn library_by_name(&self, name: &str) -> Option<&Library> {
		self.library_ids
			.get(name)
			.and_then(|id| self.libraries.get(id.index()))
	}

	/// Loaded libraries, in load order.
	pub fn libraries(&self) -> &[Library] {
		&self.libraries
	}

	/// Builds every document not built yet, across all libraries, as one forest.
	pub fn build_libraries(&mut self) -> BuildReport {
		let documents: Vec<Document> = self
			.libraries
			.iter()
			.flat_map(|lib| lib.unbuilt_documents().cloned())
			.collect();
		self.build(&documents)
	}

	/// Reconciles pending name claims across libraries. Runs once.
	pub fn resolve_overrides(&mut self) -> Result<Vec<OverrideResolution>, RuntimeError> {
		if self.resolved {
			return Err(RuntimeError::AlreadyResolved);
		}
		if let Some(lib) = self.libraries.iter().find(|lib| !lib.is_built()) {
			return Err(RuntimeError::LibraryNotBuilt(lib.name().to_owned()));
		}
		let resolutions = overrides::resolve(&mut self.conflicts, &mut self.libraries, &self.arena);
		self.resolved = true;
		info!(conflicts = resolutions.len(), "overrides resolved");
		Ok(resolutions)
	}

	pub fn is_resolved(&self) -> bool {
		self.resolved
	}

	/// Builds all libraries, then resolves overrides.
	pub fn startup(&mut self) -> Result<Vec<OverrideResolution>, RuntimeError> {
		let report = self.build_libraries();
		if !report.success {
			return Err(RuntimeError::StartupFailed {
				failed: report.failed.len(),
				report: Box::new(report),
			});
		}
		self.resolve_overrides()
	}

	pub fn element(&self, id: ElementId) -> Option<&dyn Element> {
		self.arena.get(id).map(ElementSlot::element)
	}

	pub fn element_mut(&mut self, id: ElementId) -> Option<&mut dyn Element> {
		self.arena.get_mut(id).map(ElementSlot::element_mut)
	}

	pub fn slot(&self, id: ElementId) -> Option<&ElementSlot> {
		self.arena.get(id)
	}

	pub fn elements(&self) -> &ElementArena {
		&self.arena
	}

	/// Resolves `lib#name`; a bare name or `#name` looks in `default_library`.
	pub fn get_element(&self, name: &str, default_library: Option<LibraryId>) -> Option<ElementId> {
		let name = QualifiedName::parse(name);
		let library = match name.library {
			Some(library) => self.library_by_name(library)?,
			None => self.library(default_library?)?,
		};
		library.get_named_element(name.name)
	}

	/// Every registered element of `tag`, across libraries in load order.
	pub fn elements_by_type<'a>(&'a self, tag: &'a TagType) -> impl Iterator<Item = ElementId> + 'a {
		self.libraries
			.iter()
			.flat_map(move |lib| lib.get_elements_by_type(tag).iter().copied())
	}

	pub fn signals(&self) -> &SignalRouter<ElementId> {
		&self.signals
	}

	/// Pending name claims not yet resolved.
	pub fn conflicts(&self) -> &ConflictTable {
		&self.conflicts
	}

	/// Fires `signal` at every subscribed element.
	///
	/// `call` runs once per live target. Its errors and panics are logged and
	/// counted in the report, never propagated.
	pub fn fire<E, F>(&self, signal: &str, sender: Option<&str>, data: serde_json::Value, mut call: F) -> FireReport
	where
		E: std::fmt::Display,
		F: FnMut(ElementId, &dyn Element, &Signal<'_, serde_json::Value>) -> Result<(), E>,
	{
		if self.config.signals.log {
			info!(signal, sender, %data, "signal");
		}
		let signal = Signal::new(signal, sender, &data);
		self.signals.fire(&signal, |&id, signal| {
			let element = self
				.element(id)
				.ok_or_else(|| format!("{id} is not a live element"))?;
			call(id, element, signal).map_err(|e| e.to_string())
		})
	}
}
