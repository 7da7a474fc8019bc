//! Download-control-state: durable per-entry records and the weekly schedule
//!
//! One file per (provider, identifier) remembers the last normalized anime
//! snapshot. The scheduler derives a stable weekly re-download bucket from the
//! identifier alone, so roughly 1/52 of a provider's entries fall due every
//! ISO week without any per-entry schedule state.

pub mod scheduler;
pub mod store;

pub use scheduler::{current_week, weekly_bucket, DcsScheduler, WeeklySchedule, WEEK_BUCKETS};
pub use store::{DcsEntry, DcsStore, DCS_FILE_SUFFIX};
