//! Storage contract and built-in backend for the current credential.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, credential::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Holder of the single current credential.
///
/// The contract is infallible: an absent credential is an expected state
/// (not-yet-authenticated), never an error. Implementations must be safe under concurrent
/// access from arbitrarily many request tasks and must replace the credential as a whole
/// value, so concurrent readers observe either the old or the new credential, never a mix.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current credential, if any.
	fn get(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Replaces the current credential atomically.
	fn set(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Drops the current credential, returning the store to the absent state.
	fn clear(&self) -> StoreFuture<'_, ()>;
}
