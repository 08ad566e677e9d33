//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! [build]
//! validate = true
//! suggestion_distance = 3
//!
//! [signals]
//! log = false
//! cache = "invalidate"   # or "retain", "disabled"
//!
//! [libraries.auth]
//! priority = 10
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trellis_signals::CachePolicy;

use crate::error::ConfigError;
use crate::registry::DEFAULT_SUGGESTION_DISTANCE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
	pub build: BuildConfig,
	pub signals: SignalsConfig,
	/// Per-library settings keyed by library name.
	pub libraries: BTreeMap<String, LibraryConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
	/// Run attribute validation after a successful build.
	pub validate: bool,
	/// Tag suggestions must be strictly closer than this edit distance.
	pub suggestion_distance: usize,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			validate: true,
			suggestion_distance: DEFAULT_SUGGESTION_DISTANCE,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalsConfig {
	/// Log every fired signal at info level.
	pub log: bool,
	pub cache: CacheMode,
}

/// Serialized form of [`CachePolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
	#[default]
	Invalidate,
	Retain,
	Disabled,
}

impl From<CacheMode> for CachePolicy {
	fn from(mode: CacheMode) -> Self {
		match mode {
			CacheMode::Invalidate => CachePolicy::InvalidateOnRegister,
			CacheMode::Retain => CachePolicy::Retain,
			CacheMode::Disabled => CachePolicy::Disabled,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
	/// Overrides the priority the library was loaded with.
	pub priority: Option<i32>,
}

impl RuntimeConfig {
	pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml(&input)
	}

	/// Configured priority for `library`, if any.
	pub fn priority_for(&self, library: &str) -> Option<i32> {
		self.libraries.get(library).and_then(|lib| lib.priority)
	}
}
