//! Personal activity log for the terminal. Activities are logged with a
//! duration per day, summed over day/week/month/year windows, and rendered as a
//! deterministic word cloud; free-text journal entries attach to an
//! activity+date pair. Everything persists to plain JSON slots under the local
//! state directory.
//!

pub mod cli;
pub mod cloud;
pub mod core;
pub mod store;
pub mod utils;
