//! Signal delivery with per-handler failure isolation.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::router::SignalRouter;

/// A fired signal as seen by handlers.
#[derive(Debug, Clone, Copy)]
pub struct Signal<'a, P> {
	pub name: &'a str,
	pub sender: Option<&'a str>,
	pub payload: &'a P,
}

impl<'a, P> Signal<'a, P> {
	pub fn new(name: &'a str, sender: Option<&'a str>, payload: &'a P) -> Self {
		Self {
			name,
			sender,
			payload,
		}
	}
}

/// Outcome counts of one [`SignalRouter::fire`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
	pub delivered: usize,
	pub failed: usize,
}

impl FireReport {
	pub fn handlers(&self) -> usize {
		self.delivered + self.failed
	}
}

impl<T: Clone> SignalRouter<T> {
	/// Routes `signal` and hands it to `deliver` once per matching target.
	///
	/// An error or panic from one target is logged and counted; it never
	/// reaches the caller and never stops delivery to the remaining targets.
	pub fn fire<P, E, F>(&self, signal: &Signal<'_, P>, mut deliver: F) -> FireReport
	where
		E: fmt::Display,
		F: FnMut(&T, &Signal<'_, P>) -> Result<(), E>,
	{
		let targets = self.route(signal.name, signal.sender);
		debug!(
			signal = signal.name,
			sender = signal.sender,
			targets = targets.len(),
			"firing signal"
		);

		let mut report = FireReport::default();
		for target in targets.iter() {
			match panic::catch_unwind(AssertUnwindSafe(|| deliver(target, signal))) {
				Ok(Ok(())) => report.delivered += 1,
				Ok(Err(e)) => {
					report.failed += 1;
					error!(signal = signal.name, "{e} unhandled in signal handler");
				}
				Err(payload) => {
					report.failed += 1;
					error!(
						signal = signal.name,
						panic = panic_message(payload.as_ref()),
						"signal handler panicked"
					);
				}
			}
		}
		report
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		msg
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg
	} else {
		"<non-string panic payload>"
	}
}
