//! Rust’s turnkey authenticated request relay—single-flight credential renewal, FIFO replay
//! fan-out, and transport-aware observability in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod credential;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod renewal;
pub mod request;
pub mod session;
pub mod store;

mod _prelude {
	pub use std::{
		collections::VecDeque,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use http::{HeaderMap, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
