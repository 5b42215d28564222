//! Postgrab core: pure domain types for post resolution and run bookkeeping.
mod shortcode;
mod summary;
mod target;
mod work_item;

pub use shortcode::{resolve_shortcode, ResolveError, Shortcode, ShortcodeError};
pub use summary::{ItemOutcome, RunSummary, SummaryEntry};
pub use target::DownloadTarget;
pub use work_item::{ResolutionMode, WorkItem};
