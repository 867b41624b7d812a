//! Credential renewal: the exchange contract, its HTTP implementation, and the single-flight
//! coordinator.

pub mod coordinator;

mod metrics;

pub use coordinator::RenewalCoordinator;
pub use metrics::RenewalMetrics;

// crates.io
#[cfg(feature = "reqwest")] use http::header::CONTENT_TYPE;
// self
use crate::{_prelude::*, credential::Credential, error::RenewalError};

/// Boxed future returned by [`RenewalExchange::renew`].
pub type RenewalFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credential, RenewalError>> + 'a + Send>>;

/// Trades the current session material for a fresh credential.
///
/// Implementations must be safe to call repeatedly over the process lifetime, but are not
/// required to be safe to call concurrently with themselves; [`RenewalCoordinator`] provides
/// that guarantee. A successful exchange typically rotates session material server-side, so
/// a second concurrent call could invalidate the credential the first one just issued.
pub trait RenewalExchange
where
	Self: Send + Sync,
{
	/// Performs one renewal exchange.
	fn renew(&self) -> RenewalFuture<'_>;
}

/// Wire payload returned by the renewal endpoint.
#[cfg(feature = "reqwest")]
#[derive(Debug, Deserialize)]
struct RenewalResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
}

/// Renewal exchange backed by a single POST to a companion endpoint.
///
/// Session identity is ambient: the endpoint authenticates the exchange through the client's
/// cookie store and/or a stored refresh secret, never through caller-supplied parameters.
/// When the endpoint returns a replacement refresh secret it is rotated in for subsequent
/// exchanges.
#[cfg(feature = "reqwest")]
pub struct HttpRenewalExchange {
	client: ReqwestClient,
	endpoint: Url,
	refresh_secret: RwLock<Option<String>>,
}
#[cfg(feature = "reqwest")]
impl HttpRenewalExchange {
	/// Creates an exchange against the provided endpoint.
	pub fn new(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint, refresh_secret: RwLock::new(None) }
	}

	/// Seeds the rotating refresh secret sent with each exchange.
	pub fn with_refresh_secret(self, secret: impl Into<String>) -> Self {
		*self.refresh_secret.write() = Some(secret.into());

		self
	}

	async fn renew_once(&self) -> Result<Credential, RenewalError> {
		let mut builder = self.client.post(self.endpoint.clone());

		if let Some(secret) = self.refresh_secret.read().clone() {
			let body = serde_json::json!({ "refresh_token": secret }).to_string();

			builder = builder.header(CONTENT_TYPE, "application/json").body(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| RenewalError::exchange(format!("renewal endpoint unreachable: {e}")))?;
		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| RenewalError::exchange(format!("renewal response truncated: {e}")))?;

		if !status.is_success() {
			return Err(RenewalError::exchange(format!(
				"renewal endpoint returned status {status}"
			)));
		}

		let payload = parse_renewal_body(&body)?;

		if let Some(secret) = payload.refresh_token {
			*self.refresh_secret.write() = Some(secret);
		}

		Ok(Credential::new(payload.access_token))
	}
}
#[cfg(feature = "reqwest")]
impl RenewalExchange for HttpRenewalExchange {
	fn renew(&self) -> RenewalFuture<'_> {
		Box::pin(self.renew_once())
	}
}

#[cfg(feature = "reqwest")]
fn parse_renewal_body(body: &[u8]) -> Result<RenewalResponse, RenewalError> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| RenewalError::exchange(format!("renewal response is malformed: {e}")))
}
