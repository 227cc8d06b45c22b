//! # Daily Report Shared Library
//!
//! This crate contains the domain types and business rules used by the
//! Daily Report API server and its admin tooling.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks, reports, comments and their display projections
//! - `auth`: Identity context, JWT, password hashing and the authorization guard
//! - `query`: Filter builder, predicate tree and pagination arithmetic
//! - `store`: Persistence collaborator trait with PostgreSQL and in-memory backends
//! - `services`: Report, task and user engines
//! - `db`: Connection pool and migrations
//! - `validation`: Field-level validation errors

pub mod auth;
pub mod db;
pub mod models;
pub mod query;
pub mod services;
pub mod store;
pub mod validation;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
