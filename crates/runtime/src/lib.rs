//! Declaration-forest runtime.
//!
//! A parser hands over trees of [`DeclarationNode`]s grouped into
//! [`Document`]s, each owned by a [`Library`]. The [`Runtime`] turns them into
//! a graph of live [`Element`]s:
//!
//! * [`Runtime::build`] resolves forward references with a fixpoint queue and
//!   reports declarations that can never be built, with suggestions drawn from
//!   the [`DeclarationRegistry`].
//! * [`Runtime::resolve_overrides`] settles public names claimed by more than
//!   one library, by library priority and then declaration order.
//! * [`Runtime::fire`] delivers signals to elements that subscribed while
//!   being built.
//!
//! [`Runtime::startup`] runs the first two steps in order.

mod build;
mod config;
mod context;
mod decl;
mod element;
mod error;
mod ids;
mod library;
mod location;
mod node;
mod overrides;
mod registry;
mod runtime;
mod tag;
mod validate;

pub use build::{BuildReport, BuildStats, FailedDocument};
pub use config::{BuildConfig, CacheMode, LibraryConfig, RuntimeConfig, SignalsConfig};
pub use context::BuildContext;
pub use decl::{Declaration, PUBLIC_NAME_ATTR};
pub use element::{Element, ElementArena, ElementSlot, FinalizeContext};
pub use error::{BuildError, ConfigError, ElementError, RegistryError, RuntimeError, ValidationError};
pub use ids::{DocId, ElementId, LibraryId};
pub use library::{Library, LibrarySpec};
pub use location::SourceLocation;
pub use node::{BuildOutcome, DeclOrder, DeclarationNode, Document, NodeRef};
pub use overrides::{ClaimKey, ConflictTable, OverrideResolution, Party, Resolution, cmp_party};
pub use registry::{
	AttributeKind, AttributeSpec, DEFAULT_SUGGESTION_DISTANCE, DeclarationRegistry, Suggestion, TagFactory, TagSpec,
	nearest, parse_bool, parse_int,
};
pub use runtime::Runtime;
pub use tag::{DEFAULT_NAMESPACE, QualifiedName, TagType};
pub use trellis_signals::{CachePolicy, FireReport, Signal, SignalRouter};
pub use validate::ValidationIssue;
