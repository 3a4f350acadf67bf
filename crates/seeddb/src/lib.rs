//! # seeddb
//!
//! Resolves identifiers and URLs scraped from provider pages into canonical
//! music database identifiers.
//!
//! ## Architecture
//! - **Caches**: one `seedcache::BoundedCache` per lookup kind (MBID -> ID,
//!   URL -> relations per entity kind, URL -> last 404 per entity kind)
//! - **Rate limiting**: one token bucket shared by every outgoing request
//! - **Matching**: edit distance over normalized names to pick one of
//!   several related entities
//! - **Transport**: `reqwest` behind a trait so tests can count requests
//!
//! ```no_run
//! use seeddb::{Client, ClientConfig, EntityKind};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> seeddb::Result<()> {
//! let client = Client::new(ClientConfig::default())?;
//! let cancel = CancellationToken::new();
//! let artist = client
//!     .resolve_best_match(&cancel, "https://artist.bandcamp.com/", EntityKind::Artist, "Artist")
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod kind;
mod limiter;
mod parser;
mod resolver;
mod transport;

pub mod matching;
pub mod text;

#[cfg(test)]
mod testutil;

pub use client::{Client, Clock};
pub use config::{ClientConfig, DEFAULT_SERVER_URL};
pub use error::{Error, Result};
pub use kind::{EntityInfo, EntityKind, KindSpec, KIND_SPECS};
pub use limiter::RateLimiter;
pub use parser::{parse_mbid, NamedEntity, Relation, Target};
pub use resolver::{Resolver, StaticResolver};
pub use transport::{HttpTransport, Response, Transport};
