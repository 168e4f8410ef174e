//! Blood donation management over a pluggable document store.
//!
//! The [`donation`] module carries the domain: entity records and payload
//! validation, the eligibility rule, the store gateway, the service facade,
//! and the HTTP router. [`config`], [`telemetry`], and [`error`] provide the
//! service plumbing shared with the runnable binary.

pub mod config;
pub mod donation;
pub mod error;
pub mod telemetry;
