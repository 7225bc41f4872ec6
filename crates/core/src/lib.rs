//! Core types, validation, and report aggregation for the analytics collector.

use chrono::{DateTime, SubsecRound, Utc};

pub mod account;
pub mod auth;
pub mod error;
pub mod events;
pub mod limits;
pub mod report;
pub mod session;
pub mod summary;

pub use account::*;
pub use auth::*;
pub use error::{validate_request, Error, Result};
pub use events::*;
pub use report::*;
pub use session::*;
pub use summary::*;

/// Current time truncated to the microsecond precision rows are stored with.
///
/// Records built in memory compare equal to the same records read back.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
