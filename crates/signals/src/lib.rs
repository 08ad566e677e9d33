//! Publish/subscribe routing between built elements.
//!
//! Handlers register a dotted pattern (`auth.user.*`), a target and an
//! optional sender filter. [`SignalRouter::route`] returns the targets whose
//! handlers accept a `(signal, sender)` pair and memoizes the answer according
//! to its [`CachePolicy`]. [`SignalRouter::fire`] delivers a [`Signal`] to every
//! routed target, isolating failures per handler.
//!
//! The router knows nothing about what a target is; the runtime uses element
//! ids and resolves them at delivery time.

mod fire;
mod pattern;
mod router;

pub use fire::{FireReport, Signal};
pub use pattern::{Pattern, WILDCARD};
pub use router::{CachePolicy, Handler, SignalRouter};
