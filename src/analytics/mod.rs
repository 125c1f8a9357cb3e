//! Attribution and metrics aggregation
//!
//! - `period`: report windows and day / week / month bucketing
//! - `metric`: four-valued metric rows (all-time, current, previous, diff)
//! - `attribution`: campaign label to ad account matching
//! - `conversion`: per-bucket / per-label tallies and the row merger
//!
//! Everything here is pure: inputs are fact rows read by the storage layer.

pub mod attribution;
pub mod conversion;
pub mod facts;
pub mod metric;
pub mod period;

pub use attribution::{AttributionKey, AttributionResolver, find_account, labels_match};
pub use conversion::{
    AcquisitionTally, ConversionRow, LeadTally, SpendTally, merge_by_label, merge_by_period,
    tally_acquisitions, tally_leads, tally_spend,
};
pub use facts::{AcquisitionFact, DepositFact, LeadFact, SpendFact};
pub use metric::{MetricRow, MetricValue, count_metric, percent_diff, rate, rate_metric, sum_metric};
pub use period::{DayWindow, Granularity, PeriodBucket, ReportWindow, bucketize};
