//! Command handlers grouped by concern.

pub(crate) mod alter;
pub(crate) mod state;
