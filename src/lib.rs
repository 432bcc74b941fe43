//! Gridflux - electricity market telemetry reconciliation and smoothing.
//!
//! This crate ingests interval telemetry recorded at heterogeneous native
//! cadences (5-minute dispatch, 30-minute settlement), audits and
//! backfills its coverage, and answers analytical queries by unifying,
//! smoothing and annualising the raw series.
//!
//! # Architecture
//!
//! The pipeline is a fixed composition with one load-bearing ordering
//! rule: smoothing always runs in the power domain, and annualisation
//! only ever consumes smoothed power. The types enforce it - the
//! annualisation calculator accepts only the smoothing engine's output.
//!
//! - **`pipeline::audit`** - expected-vs-actual coverage per entity/day
//! - **`pipeline::reconcile`** - archive backfill of audit gaps, with
//!   bounded retries and per-entity write serialization
//! - **`pipeline::unify`** - bucket-mean resampling onto a target cadence
//! - **`pipeline::smooth`** - causal exponential and LOESS-style families
//! - **`pipeline::annualise`** - implied annual energy from smoothed power
//! - **`cache`** - per-key single-flight memoization of pipeline results
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with eager validation
//! - [`domain`] - records, series, cadences, reports, query types
//! - [`error`] - error taxonomy for the crate
//! - [`port`] - archive and raw-store contracts
//! - [`adapter`] - HTTP archive client; memory, SQLite and resident stores
//! - [`service`] - query execution and deployment-time assembly
//! - [`cli`] - operator commands: audit, reconcile, query
//!
//! # Example
//!
//! ```no_run
//! use gridflux::config::Config;
//! use gridflux::service::build_query_service;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("config.toml")?;
//! let service = build_query_service(&config).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod port;
pub mod service;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
