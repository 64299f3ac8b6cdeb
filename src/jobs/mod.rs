//! Background jobs - Scheduled maintenance work.
//!
//! Scheduled with `tokio-cron-scheduler` from `main`; each job is a plain
//! async function over the ports so it is testable without the scheduler.

pub mod retention;
pub mod token_refresher;
