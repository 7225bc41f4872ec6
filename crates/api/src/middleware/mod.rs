//! Router middleware.

pub mod panic;
pub mod rate_limit;
