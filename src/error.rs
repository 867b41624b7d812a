//! Relay-level error types shared across the dispatcher, coordinator, and transports.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Transport failure with no server response (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The server explicitly rejected the presented credential.
	#[error("Remote rejected the presented credential.")]
	Unauthorized,
	/// The renewal exchange failed; the session cannot be recovered locally.
	#[error(transparent)]
	RenewalFailed(#[from] RenewalError),
	/// Any other HTTP-level failure, passed through to the caller untouched.
	#[error("Remote returned status {status}.")]
	Upstream {
		/// HTTP status code returned by the remote.
		status: StatusCode,
		/// Raw response body, forwarded without interpretation.
		body: Vec<u8>,
	},
	/// The request could not be assembled into a dispatchable call.
	#[error("Request could not be assembled: {reason}.")]
	Malformed {
		/// Human-readable description of the assembly failure.
		reason: String,
	},
}
impl Error {
	/// Wraps a request-assembly failure.
	pub fn malformed(reason: impl Into<String>) -> Self {
		Self::Malformed { reason: reason.into() }
	}
}

/// Terminal renewal failure fanned out to every caller waiting on the same renewal.
///
/// A single renewal outcome resolves arbitrarily many suspended requests, so this type stays
/// small and cloneable instead of carrying boxed sources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RenewalError {
	/// The renewal endpoint rejected the exchange or returned an unusable response.
	#[error("Renewal exchange failed: {message}.")]
	Exchange {
		/// Human-readable failure payload.
		message: String,
	},
	/// The task driving the renewal was dropped before a verdict arrived.
	#[error("Renewal was interrupted before completing.")]
	Interrupted,
}
impl RenewalError {
	/// Wraps a failure message from the renewal endpoint.
	pub fn exchange(message: impl Into<String>) -> Self {
		Self::Exchange { message: message.into() }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while relaying the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while relaying the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
