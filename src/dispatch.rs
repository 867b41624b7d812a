//! Request dispatch with transparent single-replay after credential renewal.

// self
use crate::{
	_prelude::*,
	credential::Credential,
	error::TransportError,
	http::HttpClient,
	obs::{self, OpOutcome, OpSpan, PipelineOp},
	renewal::RenewalCoordinator,
	request::{OriginalRequest, Response},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport stack.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient>;

/// Relays outbound calls: attaches the current credential, performs the call, and on an
/// authorization failure renews the credential once and replays the request once.
///
/// The dispatcher owns only the authorization-retry concern. Every other failure status is
/// passed through to the caller unchanged.
#[derive(Clone)]
pub struct Dispatcher<C>
where
	C: ?Sized + HttpClient,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Store holding the current credential.
	pub store: Arc<dyn CredentialStore>,
	/// Coordinator arbitrating renewal cycles for this session.
	pub coordinator: Arc<RenewalCoordinator>,
	/// Base endpoint that request paths resolve against.
	pub base_url: Url,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + HttpClient,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		coordinator: Arc<RenewalCoordinator>,
		base_url: Url,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), store, coordinator, base_url }
	}

	/// Relays one captured request and resolves it exactly once.
	///
	/// An absent credential is allowed; the call simply goes out unauthenticated. A `401`
	/// response suspends the call on the coordinator and replays it with the fresh
	/// credential. A transport failure with no server response takes the same path, a
	/// deliberately permissive policy (a transient network hiccup can then trigger an
	/// unnecessary renewal). A request that already replayed once is surfaced as a failure
	/// instead, whatever its second verdict.
	pub async fn send(&self, request: OriginalRequest) -> Result<Response> {
		const OP: PipelineOp = PipelineOp::Dispatch;

		let span = OpSpan::new(OP, "send");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut replay = ReplayContext::new(request);
				let mut credential = self.store.get().await;

				loop {
					match self.attempt(&replay.request, credential.as_ref()).await? {
						Verdict::Granted(response) => return Ok(response),
						Verdict::AuthRejected(rejection) => {
							if replay.retried {
								return Err(rejection.into_error());
							}

							replay.retried = true;
							credential = Some(self.coordinator.acquire_fresh_credential().await?);
						},
						Verdict::Refused { status, body } =>
							return Err(Error::Upstream { status, body }),
					}
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// Performs one wire attempt and classifies the outcome.
	async fn attempt(
		&self,
		request: &OriginalRequest,
		credential: Option<&Credential>,
	) -> Result<Verdict> {
		let prepared = request.prepare(&self.base_url, credential)?;
		let response = match self.http_client.execute(prepared).await {
			Ok(response) => response,
			// No server response at all; indistinguishable from an expired session, so it is
			// classified as a renewal candidate alongside an explicit rejection.
			Err(e) =>
				return Ok(Verdict::AuthRejected(Rejection::Transport(TransportError::network(e)))),
		};

		if response.status == StatusCode::UNAUTHORIZED {
			return Ok(Verdict::AuthRejected(Rejection::Unauthorized));
		}
		if response.status.is_success() {
			return Ok(Verdict::Granted(response));
		}

		Ok(Verdict::Refused { status: response.status, body: response.body })
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestHttpClient> {
	/// Creates a dispatcher for the provided store, coordinator, and base endpoint.
	///
	/// The dispatcher provisions its own reqwest-backed transport so callers do not need to
	/// pass HTTP handles explicitly. Use [`Dispatcher::with_http_client`] to share a
	/// configured client instead.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		coordinator: Arc<RenewalCoordinator>,
		base_url: Url,
	) -> Self {
		Self::with_http_client(store, coordinator, base_url, ReqwestHttpClient::default())
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + HttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("base_url", &self.base_url.as_str())
			.field("coordinator", &self.coordinator)
			.finish()
	}
}

/// Replay bookkeeping for one logical call; `retried` carries the replay-at-most-once rule
/// as data instead of convention.
struct ReplayContext {
	request: OriginalRequest,
	retried: bool,
}
impl ReplayContext {
	fn new(request: OriginalRequest) -> Self {
		Self { request, retried: false }
	}
}

/// Classification of one wire attempt.
enum Verdict {
	/// Successful status; the response is handed back to the caller.
	Granted(Response),
	/// The attempt is a candidate for renewal + replay.
	AuthRejected(Rejection),
	/// Non-authorization failure status; passed through untouched.
	Refused {
		status: StatusCode,
		body: Vec<u8>,
	},
}

/// Authorization-failure cause for one attempt, kept so a second rejection can be surfaced
/// with its original flavor.
enum Rejection {
	Unauthorized,
	Transport(TransportError),
}
impl Rejection {
	fn into_error(self) -> Error {
		match self {
			Self::Unauthorized => Error::Unauthorized,
			Self::Transport(e) => Error::Transport(e),
		}
	}
}
