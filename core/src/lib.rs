//! Synchronous client for an OPA-compatible policy engine's REST API.
//!
//! # Overview
//! Thin, typed wrappers over the engine's HTTP JSON API: policy
//! management, the hierarchical data document tree, and query execution.
//! Every operation is a single blocking round trip — no retries, caching,
//! or background work.
//!
//! # Design
//! - [`Client`] is built once from a validating [`ClientBuilder`] and is
//!   immutable afterwards.
//! - The operation set is the [`Service`] trait, implemented by `Client`
//!   through pure delegation to three internal resource services sharing
//!   one transport.
//! - Non-2xx responses decode into the server's structured [`ApiError`]
//!   shape; network and JSON failures keep their own [`Error`] variants
//!   so callers can tell operational from semantic failures.
//! - Timeouts and cancellation are properties of the injected
//!   `ureq::Agent`, not of this crate.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

mod data;
mod http;
mod policy;
mod query;

pub use client::{Client, ClientBuilder, DEFAULT_URL};
pub use error::{codes, ApiError, Error, Location};
pub use service::Service;
pub use types::{
    AdHocQueryOptions, DataResponse, Policy, PolicyDeleteResponse, PolicyGetResponse,
    PolicyListResponse, PolicyPutResponse, QueryResponse,
};
