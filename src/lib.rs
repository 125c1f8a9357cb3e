//! Deeplinker - campaign deep-link attribution
//!
//! Tracks which campaign (deep link) brought each user, pulls daily ad
//! statistics from a third-party provider and reports acquisitions, leads,
//! income and ad spend per period or per campaign.
//!
//! # Architecture
//! - `analytics`: pure bucketing, metric rows, attribution and row merging
//! - `ingest`: ad statistics provider client and the ingestion worker
//! - `storage`: SeaORM storage backend (SQLite / MySQL / PostgreSQL)
//! - `services`: report composition
//! - `config`: static configuration (TOML + environment)
//! - `runtime`: startup, shutdown and command execution modes
//! - `system`: logging

pub mod analytics;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
