//! Forced-logout side channel surfaced to the hosting application.

// crates.io
use tokio::sync::watch;
// self
use crate::{_prelude::*, error::RenewalError};

/// Fire-and-forget hook invoked when the relay abandons the session.
///
/// The coordinator calls this exactly once per definitive renewal failure, no matter how many
/// requests were waiting on that renewal. Implementations must not block; the hook runs on
/// the task that resolved the renewal.
pub trait LogoutHook
where
	Self: Send + Sync,
{
	/// Reacts to the session ending; typically forces a logged-out navigation state.
	fn on_forced_logout(&self, error: &RenewalError);
}

/// No-op hook for hosts that observe the session through other means.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogoutHook;
impl LogoutHook for NullLogoutHook {
	fn on_forced_logout(&self, _: &RenewalError) {}
}

/// Watch-channel-backed hook so hosting applications can await the forced-logout signal
/// instead of installing a callback.
///
/// Receivers obtained from [`subscribe`](LogoutSignal::subscribe) observe the latest recorded
/// failure; subscribers that arrive after the signal fired still see it.
#[derive(Debug)]
pub struct LogoutSignal {
	sender: watch::Sender<Option<RenewalError>>,
}
impl LogoutSignal {
	/// Creates a signal with no logout recorded yet.
	pub fn new() -> Self {
		Self { sender: watch::channel(None).0 }
	}

	/// Returns a receiver that yields the renewal failure once the session ends.
	pub fn subscribe(&self) -> watch::Receiver<Option<RenewalError>> {
		self.sender.subscribe()
	}
}
impl Default for LogoutSignal {
	fn default() -> Self {
		Self::new()
	}
}
impl LogoutHook for LogoutSignal {
	fn on_forced_logout(&self, error: &RenewalError) {
		self.sender.send_replace(Some(error.clone()));
	}
}
