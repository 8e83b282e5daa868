//! Async client for the Tranco ranking API.
//!
//! # Overview
//! Looks up a domain's rank history, fetches list metadata by id or date,
//! requests new lists and checks credentials against
//! `https://tranco-list.eu`.
//!
//! # Design
//! - `TrancoClient` splits every endpoint into `build_*` (produces an
//!   `HttpRequest`) and `parse_*` (consumes an `HttpResponse`); the async
//!   operations glue them to an injected `Transport`.
//! - JSON shapes of the service stay private in `wire`; callers only see
//!   the domain types in `types`, with dates parsed into `chrono` values.
//! - Every failure is an `Error` naming the operation and an `ErrorKind`.
//!
//! ```rust,ignore
//! use tranco_client::TrancoClient;
//!
//! let client = TrancoClient::new()?;
//! let ranks = client.get_ranks("example.com").await?;
//! for entry in &ranks.ranks {
//!     println!("{} {}", entry.date, entry.rank);
//! }
//! ```

pub mod client;
pub mod config;
mod dates;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
mod wire;

pub use client::TrancoClient;
pub use config::{ClientConfig, ConfigError, Credentials, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ApiError, DecodeError, Error, ErrorKind, Operation, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{CancelToken, ReqwestTransport, Transport};
pub use types::{Configuration, CreatedList, ListMetadata, RankEntry, Ranks};
