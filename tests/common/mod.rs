//! Shared fixtures for the relay integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	},
};
// crates.io
use http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use tokio::sync::watch;
// self
use auth_relay::{
	credential::Credential,
	dispatch::Dispatcher,
	error::RenewalError,
	http::{HttpClient, HttpFuture, ReqwestHttpClient},
	renewal::{HttpRenewalExchange, RenewalCoordinator, RenewalExchange, RenewalFuture},
	request::{PreparedRequest, Response},
	reqwest,
	session::LogoutHook,
	store::MemoryStore,
	url::Url,
};

/// One scripted transport outcome: a `(status, body)` reply, or a simulated connection
/// failure with no server response.
pub type Reply = Result<(u16, &'static str), &'static str>;

/// Transport error emitted by [`ScriptedHttpClient`] when a reply is scripted as a failure.
#[derive(Debug)]
pub struct ScriptedTransportError(pub &'static str);
impl std::fmt::Display for ScriptedTransportError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.0)
	}
}
impl std::error::Error for ScriptedTransportError {}

/// In-process transport that serves scripted replies in order and records the
/// `Authorization` header presented on each attempt.
pub struct ScriptedHttpClient {
	replies: Mutex<VecDeque<Reply>>,
	seen_authorization: Mutex<Vec<Option<String>>>,
}
impl ScriptedHttpClient {
	pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
		Self {
			replies: Mutex::new(replies.into_iter().collect()),
			seen_authorization: Mutex::new(Vec::new()),
		}
	}

	/// Returns the `Authorization` header value observed on each attempt, in order.
	pub fn seen_authorization(&self) -> Vec<Option<String>> {
		self.seen_authorization.lock().expect("Fixture lock should not be poisoned.").clone()
	}
}
impl HttpClient for ScriptedHttpClient {
	type TransportError = ScriptedTransportError;

	fn execute(&self, request: PreparedRequest) -> HttpFuture<'_, Self::TransportError> {
		let authorization = request
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		self.seen_authorization
			.lock()
			.expect("Fixture lock should not be poisoned.")
			.push(authorization);

		let reply = self
			.replies
			.lock()
			.expect("Fixture lock should not be poisoned.")
			.pop_front()
			.expect("A scripted reply should be available for each attempt.");

		Box::pin(async move {
			match reply {
				Ok((status, body)) => Ok(Response {
					status: StatusCode::from_u16(status)
						.expect("Scripted status code should be valid."),
					headers: HeaderMap::new(),
					body: body.as_bytes().to_vec(),
				}),
				Err(reason) => Err(ScriptedTransportError(reason)),
			}
		})
	}
}

/// Renewal exchange that serves scripted outcomes immediately, counting invocations.
pub struct ScriptedExchange {
	outcomes: Mutex<VecDeque<Result<Credential, RenewalError>>>,
	invocations: AtomicU64,
}
impl ScriptedExchange {
	pub fn new(outcomes: impl IntoIterator<Item = Result<Credential, RenewalError>>) -> Self {
		Self { outcomes: Mutex::new(outcomes.into_iter().collect()), invocations: AtomicU64::new(0) }
	}

	pub fn invocations(&self) -> u64 {
		self.invocations.load(Ordering::Relaxed)
	}
}
impl RenewalExchange for ScriptedExchange {
	fn renew(&self) -> RenewalFuture<'_> {
		self.invocations.fetch_add(1, Ordering::Relaxed);

		let outcome = self
			.outcomes
			.lock()
			.expect("Fixture lock should not be poisoned.")
			.pop_front()
			.expect("A scripted renewal outcome should be available for each exchange call.");

		Box::pin(async move { outcome })
	}
}

/// Renewal exchange that suspends until the test releases its gate, so waiters can pile up
/// behind a renewal that is deterministically in flight.
pub struct GatedExchange {
	release: watch::Receiver<bool>,
	outcomes: Mutex<VecDeque<Result<Credential, RenewalError>>>,
	invocations: AtomicU64,
}
impl GatedExchange {
	pub fn new(
		outcomes: impl IntoIterator<Item = Result<Credential, RenewalError>>,
	) -> (watch::Sender<bool>, Self) {
		let (gate, release) = watch::channel(false);
		let exchange = Self {
			release,
			outcomes: Mutex::new(outcomes.into_iter().collect()),
			invocations: AtomicU64::new(0),
		};

		(gate, exchange)
	}

	pub fn invocations(&self) -> u64 {
		self.invocations.load(Ordering::Relaxed)
	}
}
impl RenewalExchange for GatedExchange {
	fn renew(&self) -> RenewalFuture<'_> {
		self.invocations.fetch_add(1, Ordering::Relaxed);

		let mut release = self.release.clone();

		Box::pin(async move {
			release.wait_for(|ready| *ready).await.expect("Gate sender should outlive the test.");

			self.outcomes
				.lock()
				.expect("Fixture lock should not be poisoned.")
				.pop_front()
				.expect("A scripted renewal outcome should be available for each exchange call.")
		})
	}
}

/// Logout hook that counts how many times the relay forced a logout.
#[derive(Debug, Default)]
pub struct CountingLogoutHook {
	fired: AtomicU64,
}
impl CountingLogoutHook {
	pub fn fired(&self) -> u64 {
		self.fired.load(Ordering::Relaxed)
	}
}
impl LogoutHook for CountingLogoutHook {
	fn on_forced_logout(&self, _: &RenewalError) {
		self.fired.fetch_add(1, Ordering::Relaxed);
	}
}

/// Relay assembled over in-process scripted fakes.
pub struct ScriptedRelay {
	pub dispatcher: Dispatcher<ScriptedHttpClient>,
	pub client: Arc<ScriptedHttpClient>,
	pub exchange: Arc<ScriptedExchange>,
	pub store: Arc<MemoryStore>,
	pub coordinator: Arc<RenewalCoordinator>,
	pub logout: Arc<CountingLogoutHook>,
}

/// Builds a relay whose transport and renewal exchange both follow test scripts.
pub fn scripted_relay(
	replies: impl IntoIterator<Item = Reply>,
	outcomes: impl IntoIterator<Item = Result<Credential, RenewalError>>,
) -> ScriptedRelay {
	let client = Arc::new(ScriptedHttpClient::new(replies));
	let exchange = Arc::new(ScriptedExchange::new(outcomes));
	let store = Arc::new(MemoryStore::default());
	let logout = Arc::new(CountingLogoutHook::default());
	let coordinator = Arc::new(
		RenewalCoordinator::new(exchange.clone(), store.clone()).with_logout_hook(logout.clone()),
	);
	let base_url = Url::parse("https://api.invalid/").expect("Base URL fixture should parse.");
	let dispatcher =
		Dispatcher::with_http_client(store.clone(), coordinator.clone(), base_url, client.clone());

	ScriptedRelay { dispatcher, client, exchange, store, coordinator, logout }
}

/// Relay assembled over a live httpmock server with the default reqwest stack.
pub struct HttpRelay {
	pub dispatcher: Dispatcher<ReqwestHttpClient>,
	pub store: Arc<MemoryStore>,
	pub coordinator: Arc<RenewalCoordinator>,
	pub logout: Arc<CountingLogoutHook>,
}

/// Builds a reqwest-backed relay whose base endpoint and renewal endpoint live on `base`.
pub fn http_relay(base: &str) -> HttpRelay {
	let base_url = Url::parse(base).expect("Mock server base URL should parse.");
	let renew_url = base_url.join("/session/renew").expect("Renewal endpoint URL should resolve.");

	http_relay_over(base, Arc::new(HttpRenewalExchange::new(reqwest::Client::new(), renew_url)))
}

/// Builds a reqwest-backed relay around a caller-provided renewal exchange.
pub fn http_relay_over(base: &str, exchange: Arc<dyn RenewalExchange>) -> HttpRelay {
	let base_url = Url::parse(base).expect("Mock server base URL should parse.");
	let store = Arc::new(MemoryStore::default());
	let logout = Arc::new(CountingLogoutHook::default());
	let coordinator =
		Arc::new(RenewalCoordinator::new(exchange, store.clone()).with_logout_hook(logout.clone()));
	let dispatcher = Dispatcher::new(store.clone(), coordinator.clone(), base_url);

	HttpRelay { dispatcher, store, coordinator, logout }
}
