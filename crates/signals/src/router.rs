use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap as HashMap;

use crate::pattern::Pattern;

/// How [`SignalRouter::route`] memoizes its results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
	/// Cache by exact `(signal, sender)` and drop the cache on every registration.
	#[default]
	InvalidateOnRegister,
	/// Cache by exact `(signal, sender)` for the router's lifetime.
	///
	/// A handler registered after a pair was first routed is never seen for
	/// that pair.
	Retain,
	/// Scan the handler table on every call.
	Disabled,
}

/// One append-only handler registration.
#[derive(Debug, Clone)]
pub struct Handler<T> {
	pub pattern: Pattern,
	pub target: T,
	/// Restricts the handler to this exact sender; `None` accepts any sender.
	pub sender: Option<Box<str>>,
}

impl<T> Handler<T> {
	pub fn accepts(&self, signal: &str, sender: Option<&str>) -> bool {
		if let Some(filter) = &self.sender
			&& sender != Some(&**filter)
		{
			return false;
		}
		self.pattern.matches(signal)
	}
}

type RouteKey = (Box<str>, Option<Box<str>>);

/// Signal handler table with a per-`(signal, sender)` match cache.
#[derive(Debug)]
pub struct SignalRouter<T> {
	handlers: RwLock<Vec<Handler<T>>>,
	cache: Mutex<HashMap<RouteKey, Arc<[T]>>>,
	policy: CachePolicy,
	scans: AtomicUsize,
}

impl<T: Clone> Default for SignalRouter<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone> SignalRouter<T> {
	pub fn new() -> Self {
		Self::with_policy(CachePolicy::default())
	}

	pub fn with_policy(policy: CachePolicy) -> Self {
		Self {
			handlers: RwLock::new(Vec::new()),
			cache: Mutex::new(HashMap::default()),
			policy,
			scans: AtomicUsize::new(0),
		}
	}

	pub fn policy(&self) -> CachePolicy {
		self.policy
	}

	/// Adds a handler for `pattern`, optionally restricted to one sender.
	pub fn register(&self, pattern: impl Into<Pattern>, target: T, sender: Option<&str>) {
		self.handlers.write().push(Handler {
			pattern: pattern.into(),
			target,
			sender: sender.map(Into::into),
		});
		if self.policy == CachePolicy::InvalidateOnRegister {
			self.cache.lock().clear();
		}
	}

	/// Returns the targets whose handlers accept `signal` from `sender`.
	///
	/// Targets are returned in registration order.
	pub fn route(&self, signal: &str, sender: Option<&str>) -> Arc<[T]> {
		if self.policy == CachePolicy::Disabled {
			return self.scan(signal, sender);
		}

		// Held across the scan so a concurrent register cannot clear the cache
		// between our scan and our insert.
		let mut cache = self.cache.lock();
		let key: RouteKey = (signal.into(), sender.map(Into::into));
		if let Some(hit) = cache.get(&key) {
			return hit.clone();
		}
		let targets = self.scan(signal, sender);
		cache.insert(key, targets.clone());
		targets
	}

	fn scan(&self, signal: &str, sender: Option<&str>) -> Arc<[T]> {
		self.scans.fetch_add(1, Ordering::Relaxed);
		self.handlers
			.read()
			.iter()
			.filter(|h| h.accepts(signal, sender))
			.map(|h| h.target.clone())
			.collect()
	}

	/// Number of full handler-table scans performed so far.
	pub fn scan_count(&self) -> usize {
		self.scans.load(Ordering::Relaxed)
	}

	pub fn len(&self) -> usize {
		self.handlers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.read().is_empty()
	}

	/// Snapshot of every registration, in order.
	pub fn handlers(&self) -> Vec<Handler<T>> {
		self.handlers.read().clone()
	}

	/// Drops registrations past `len` and clears the cache.
	///
	/// Used to discard the registrations of a build that failed.
	pub fn truncate(&self, len: usize) {
		let dropped = {
			let mut handlers = self.handlers.write();
			let dropped = len < handlers.len();
			handlers.truncate(len);
			dropped
		};
		// Lock order is cache before handlers, so the handler guard is released first.
		if dropped {
			self.cache.lock().clear();
		}
	}
}
