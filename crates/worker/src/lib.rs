//! Report generation and background work for the analytics collector.
//!
//! - Report generator (aggregate, optionally summarize, persist, cache by freshness)
//! - Summarizer (OpenAI-compatible chat completions client)
//! - Enrichment (session device/browser/OS from the user agent)
//! - Scheduler (periodic report refresh and metrics snapshots)

pub mod enrichment;
pub mod report;
pub mod scheduler;
pub mod summarizer;

pub use enrichment::UserAgentEnricher;
pub use report::*;
pub use scheduler::*;
pub use summarizer::*;
