//! Bearer credential value type with redacted formatting.

// self
use crate::_prelude::*;

/// Opaque bearer credential presented on every authenticated call.
///
/// The relay never inspects the token for expiry; validity is established empirically by the
/// remote rejecting it. The secret is redacted from `Debug`/`Display` output so credentials
/// can flow through logs safely. Exactly one credential is current at any time and it is
/// replaced as a whole value, never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	secret: String,
	/// Instant this credential was minted locally; recorded for observability only.
	pub issued_at: OffsetDateTime,
}
impl Credential {
	/// Wraps a freshly issued token, stamping the current instant.
	pub fn new(secret: impl Into<String>) -> Self {
		Self { secret: secret.into(), issued_at: OffsetDateTime::now_utc() }
	}

	/// Wraps a token with an explicit issuance instant.
	pub fn issued(secret: impl Into<String>, issued_at: OffsetDateTime) -> Self {
		Self { secret: secret.into(), issued_at }
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.secret
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("secret", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
