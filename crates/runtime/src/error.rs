use std::path::PathBuf;

use thiserror::Error;

use crate::build::BuildReport;
use crate::ids::LibraryId;
use crate::tag::TagType;

/// Errors returned by [`Runtime`](crate::Runtime) entry points.
#[derive(Debug, Error)]
pub enum RuntimeError {
	/// A library with this name was already loaded.
	#[error("library `{0}` is already loaded")]
	DuplicateLibrary(String),
	/// The id does not belong to this runtime.
	#[error("invalid library id: {0}")]
	InvalidLibrary(LibraryId),
	/// Overrides were requested before every library was built.
	#[error("library `{0}` has not been built")]
	LibraryNotBuilt(String),
	/// [`Runtime::resolve_overrides`](crate::Runtime::resolve_overrides) runs once.
	#[error("overrides have already been resolved")]
	AlreadyResolved,
	/// Startup stopped because documents failed to build.
	#[error("{failed} document(s) failed to build")]
	StartupFailed {
		failed: usize,
		report: Box<BuildReport>,
	},
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Errors raised by the declaration registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
	#[error("{tag} is already registered")]
	DuplicateTag {
		tag: TagType,
		defined_by: Option<LibraryId>,
	},
}

/// Failures raised by elements themselves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElementError {
	/// General failure with message.
	#[error("{0}")]
	Failed(String),
	/// A child element the element requires was not built.
	#[error("missing child: {0}")]
	MissingChild(String),
}

/// Hard failures recorded while committing or finalizing an element.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
	/// A public name refers to a library that is not loaded.
	#[error("`{reference}` refers to unknown library `{library}`")]
	UnknownLibrary { library: String, reference: String },
	/// The element tried to define a tag that already exists.
	#[error(transparent)]
	Registry(#[from] RegistryError),
	/// The element's finalize hook failed.
	#[error(transparent)]
	Element(#[from] ElementError),
	/// The node belongs to a library that is not loaded.
	#[error("declaration belongs to unloaded library {0}")]
	MissingLibrary(LibraryId),
}

/// Non-fatal problems found by the attribute validation pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
	#[error("missing required attribute `{attribute}` on {tag}")]
	MissingAttribute { tag: TagType, attribute: String },
	#[error("unknown attribute `{attribute}` on {tag}")]
	UnknownAttribute {
		tag: TagType,
		attribute: String,
		suggestion: Option<String>,
	},
	#[error("invalid value for `{attribute}` on {tag}: {reason}")]
	InvalidValue {
		tag: TagType,
		attribute: String,
		reason: String,
	},
}

impl ValidationError {
	/// Human-readable hint, if the validator found a likely intended value.
	pub fn suggestion(&self) -> Option<String> {
		match self {
			Self::UnknownAttribute {
				suggestion: Some(s),
				..
			} => Some(format!("did you mean `{s}`?")),
			_ => None,
		}
	}
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {}: {error}", path.display())]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}
