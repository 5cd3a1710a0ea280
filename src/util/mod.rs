//! Small shared utilities.

pub mod timeout;
