//! Transport primitives for relayed requests.
//!
//! [`HttpClient`] is the relay's only dependency on an HTTP stack. A transport executes one
//! prepared request and reports either the full response (whatever its status) or a
//! transport-level failure with no response at all; the dispatcher owns every
//! authorization-retry decision on top of that contract.

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	request::{PreparedRequest, Response},
};

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<Response, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing relayed requests.
///
/// Implementations must be `Send + Sync + 'static` (typically shared behind `Arc<T>`), and the
/// futures they return must be `Send` so dispatcher futures can hop executors.
pub trait HttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes one prepared request.
	///
	/// A response with any HTTP status is a successful transport outcome; errors are reserved
	/// for failures that produced no server response. Implementations must not retry or
	/// interpret authorization failures themselves.
	fn execute(&self, request: PreparedRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The relay passes prepared requests straight through; configure redirect policy, proxies,
/// and cookie stores on the [`ReqwestClient`] before wrapping it. A cookie store is how the
/// companion renewal endpoint usually receives its ambient session identity.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: PreparedRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder =
				client.request(request.method, request.url).headers(request.headers);

			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(Response { status, headers, body })
		})
	}
}
