//! Single-flight arbitration for concurrent credential renewal.
//!
//! The coordinator owns one `renewing` flag and one FIFO queue of pending waiters, guarded by
//! a single mutex so the check-and-set and the drain-and-clear each happen as one unit. The
//! first caller to observe an expired credential performs the exchange; every caller that
//! arrives while it is in flight suspends and shares the same outcome. On success the store
//! is updated before any waiter resumes; on failure the store is cleared, every waiter is
//! rejected with the same error, and the forced-logout hook fires exactly once.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	credential::Credential,
	error::RenewalError,
	obs::{self, OpOutcome, OpSpan, PipelineOp},
	renewal::{RenewalExchange, RenewalMetrics},
	session::{LogoutHook, NullLogoutHook},
	store::CredentialStore,
};

type RenewalOutcome = Result<Credential, RenewalError>;

/// Arbitrates concurrent renewal attempts so at most one exchange is ever in flight.
///
/// Construct one coordinator per session, give it process-wide lifetime, and inject it into
/// every dispatcher that shares the session. The coordinator is reusable: once a cycle
/// resolves it returns to idle, and a later authorization failure starts a fresh cycle.
pub struct RenewalCoordinator {
	exchange: Arc<dyn RenewalExchange>,
	store: Arc<dyn CredentialStore>,
	logout: Arc<dyn LogoutHook>,
	state: Mutex<RenewalState>,
	/// Shared counters describing renewal activity.
	pub metrics: Arc<RenewalMetrics>,
}

/// Invariants: `renewing == false` implies `waiters` is empty; while `renewing == true` at
/// most one exchange call is outstanding.
#[derive(Default)]
struct RenewalState {
	renewing: bool,
	waiters: VecDeque<oneshot::Sender<RenewalOutcome>>,
}

enum Entry {
	Lead,
	Join(oneshot::Receiver<RenewalOutcome>),
}

impl RenewalCoordinator {
	/// Creates a coordinator over the provided exchange and store, with no logout hook.
	pub fn new(exchange: Arc<dyn RenewalExchange>, store: Arc<dyn CredentialStore>) -> Self {
		Self {
			exchange,
			store,
			logout: Arc::new(NullLogoutHook),
			state: Mutex::new(RenewalState::default()),
			metrics: Default::default(),
		}
	}

	/// Installs the hook fired once per definitive renewal failure.
	pub fn with_logout_hook(mut self, hook: Arc<dyn LogoutHook>) -> Self {
		self.logout = hook;

		self
	}

	/// Returns a fresh credential once the current renewal cycle resolves.
	///
	/// If no renewal is in flight, this caller starts one and performs the exchange itself;
	/// otherwise it suspends as a pending waiter and shares the in-flight outcome. Waiters
	/// resolve in enqueue order, and the store is updated before any waiter resumes, so a
	/// successfully resolved caller can never read a stale credential. A waiter that
	/// abandons its request simply drops its receiver; the remaining waiters and the
	/// exchange itself are unaffected.
	pub async fn acquire_fresh_credential(&self) -> Result<Credential, RenewalError> {
		const OP: PipelineOp = PipelineOp::Renewal;

		let span = OpSpan::new(OP, "acquire_fresh_credential");

		obs::record_op_outcome(OP, OpOutcome::Attempt);
		self.metrics.record_attempt();

		let entry = {
			let mut state = self.state.lock();

			if state.renewing {
				let (tx, rx) = oneshot::channel();

				state.waiters.push_back(tx);

				Entry::Join(rx)
			} else {
				state.renewing = true;

				Entry::Lead
			}
		};
		let result = match entry {
			Entry::Lead => span.instrument(self.lead()).await,
			Entry::Join(rx) => {
				self.metrics.record_join();

				span.instrument(async move { rx.await.unwrap_or(Err(RenewalError::Interrupted)) })
					.await
			},
		};

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// Drives the single exchange for this cycle and fans the outcome out to every waiter.
	async fn lead(&self) -> RenewalOutcome {
		let mut guard = SettleGuard { coordinator: self, armed: true };

		self.metrics.record_exchange();

		let outcome = self.exchange.renew().await;

		match &outcome {
			Ok(credential) => self.store.set(credential.clone()).await,
			Err(_) => self.store.clear().await,
		}

		guard.armed = false;

		self.drain(outcome.clone());

		match &outcome {
			Ok(_) => self.metrics.record_success(),
			Err(error) => {
				self.metrics.record_failure();
				self.logout.on_forced_logout(error);
			},
		}

		outcome
	}

	/// Atomically returns the state to idle and resolves every queued waiter, in FIFO
	/// enqueue order, with a clone of `outcome`.
	fn drain(&self, outcome: RenewalOutcome) {
		let waiters = {
			let mut state = self.state.lock();

			state.renewing = false;

			std::mem::take(&mut state.waiters)
		};

		for waiter in waiters {
			// A failed send means this waiter abandoned its request; skip it.
			let _ = waiter.send(outcome.clone());
		}
	}
}
impl Debug for RenewalCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("RenewalCoordinator")
			.field("renewing", &state.renewing)
			.field("pending_waiters", &state.waiters.len())
			.finish()
	}
}

/// Rejects queued waiters and resets the state if the leading task is dropped mid-exchange,
/// so no waiter stays suspended forever. The store is left untouched and the logout hook
/// does not fire: the cycle reached no definitive verdict.
struct SettleGuard<'a> {
	coordinator: &'a RenewalCoordinator,
	armed: bool,
}
impl Drop for SettleGuard<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.coordinator.drain(Err(RenewalError::Interrupted));
		}
	}
}
