//! Simple to use cli for tracking daily habits. Define habits, check them off
//! each day, and view streaks, completion rates, and a calendar-style activity
//! grid. Everything is stored locally, no accounts or syncing involved.
//!

pub mod analytics;
pub mod cli;
pub mod store;
pub mod utils;
