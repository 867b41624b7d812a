//! Request capture and response payloads exchanged with the relay.

// crates.io
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, credential::Credential};

/// Captured outbound call, held by the dispatcher so it can be replayed with a fresh
/// credential.
///
/// The capture is relative to the dispatcher's base endpoint; it never carries an
/// `Authorization` header of its own, the dispatcher attaches the current credential at
/// dispatch time.
#[derive(Clone, Debug)]
pub struct OriginalRequest {
	/// HTTP method for the call.
	pub method: Method,
	/// Path (and optional query) resolved against the dispatcher's base endpoint.
	pub path: String,
	/// Caller-supplied headers, forwarded on every attempt.
	pub headers: HeaderMap,
	/// Optional request body, reused verbatim on replay.
	pub body: Option<Vec<u8>>,
}
impl OriginalRequest {
	/// Captures a request for the provided method + path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: HeaderMap::new(), body: None }
	}

	/// Captures a GET request for the provided path.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Captures a POST request for the provided path.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Appends a header forwarded on every attempt.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);

		self
	}

	/// Attaches a raw request body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON request body and sets the content type.
	pub fn with_json_body<T>(mut self, payload: &T) -> Result<Self>
	where
		T: Serialize,
	{
		let body = serde_json::to_vec(payload)
			.map_err(|e| Error::malformed(format!("request body is not serializable: {e}")))?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(body);

		Ok(self)
	}

	/// Resolves the capture against `base` and attaches `credential` as a bearer header.
	///
	/// An absent credential omits the `Authorization` header entirely; it is never sent
	/// empty.
	pub fn prepare(&self, base: &Url, credential: Option<&Credential>) -> Result<PreparedRequest> {
		let url = base
			.join(&self.path)
			.map_err(|e| Error::malformed(format!("path does not resolve against base: {e}")))?;
		let mut headers = self.headers.clone();

		if let Some(credential) = credential {
			let value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
				.map_err(|_| Error::malformed("credential is not a valid header value"))?;

			headers.insert(AUTHORIZATION, value);
		}

		Ok(PreparedRequest { method: self.method.clone(), url, headers, body: self.body.clone() })
	}
}

/// Fully resolved call handed to the HTTP transport: absolute URL, headers with the
/// credential attached, and body.
#[derive(Clone)]
pub struct PreparedRequest {
	/// HTTP method for the call.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Headers to send, including the `Authorization` header when a credential is current.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl Debug for PreparedRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PreparedRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("authorized", &self.headers.contains_key(AUTHORIZATION))
			.finish()
	}
}

/// Successful payload returned to the relay's caller.
#[derive(Clone, Debug)]
pub struct Response {
	/// HTTP status code of the final attempt.
	pub status: StatusCode,
	/// Response headers of the final attempt.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl Response {
	/// Deserializes the response body as JSON, reporting the offending path on mismatch.
	pub fn json<T>(&self) -> Result<T, ResponseParseError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ResponseParseError { source })
	}
}

/// Response body could not be parsed into the requested type.
#[derive(Debug, ThisError)]
#[error("Response body is not valid JSON for the requested type.")]
pub struct ResponseParseError {
	/// Structured parsing failure carrying the offending path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}
