//! # atws - typed client for the Autotask ATWS query service
//!
//! The service answers SOAP-wrapped queries written in its own XML dialect.
//! This crate builds those queries, sends them through a pluggable
//! transport, isolates the `<EntityResults>` payload and decodes it into
//! typed records.
//!
//! ## Pipeline
//!
//! - **Query document** ([`QueryXml`]): one entity kind plus field comparisons
//! - **Envelope** ([`envelope::wrap`]): the document as CDATA in a SOAP body
//! - **Transport** ([`Transport`]): one blocking round trip
//! - **Extraction** ([`extract::extract`]): re-roots `<EntityResults>`
//! - **Mapping** ([`mapper::decode`]): shape-driven decode into [`Record`]s
//! - **Enrichment** ([`enrich`]): joins related kinds by identifier
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atws::{Client, Config, QueryExpression};
//!
//! let client = Client::connect(Config::from_env()?);
//! let entries = client.fetch_time_entries(&QueryExpression::equals("TicketID", "42"))?;
//! for entry in &entries.records {
//!     println!("{} {} {}", entry.resource_name, entry.role_name, entry.hours_worked);
//! }
//! for warning in &entries.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod enrich;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod index;
pub mod kind;
pub mod mapper;
pub mod query;
pub mod records;
pub mod transport;

// Re-export primary types at crate root for convenience
pub use client::Client;
pub use config::Config;
pub use enrich::JoinStats;
pub use error::{
    AtwsError, AtwsResult, ConfigError, DecodeError, FieldParseError, LookupFailure, ResponseError,
    TransportError, ValidationError,
};
pub use index::{index_by_id, join_by_id, IdIndex};
pub use kind::RecordKind;
pub use mapper::RecordSet;
pub use query::{QueryCondition, QueryExpression, QueryXml};
pub use records::{Account, Record, Resource, Role, Ticket, TimeEntry};
pub use transport::{RawResponse, Transport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
