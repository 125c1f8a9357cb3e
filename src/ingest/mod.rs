//! Ad statistics ingestion
//!
//! - `provider`: third-party statistics API contract
//! - `client`: HTTP implementation of the provider
//! - `tracker`: per-account no-data circuit breaker
//! - `store`: persistence contract used by the worker
//! - `worker`: single pass and continuous run loop

pub mod client;
pub mod provider;
pub mod store;
pub mod tracker;
pub mod worker;

pub use client::AdReportClient;
pub use provider::{ProviderAccount, ProviderCampaignStat, StatsProvider};
pub use store::CampaignStatStore;
pub use tracker::{AccountState, AccountTracker};
pub use worker::{AccountOutcome, IngestionWorker, PassSummary};
