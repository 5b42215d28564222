//! Postgrab engine: media source access, work item production and the
//! download loop.
mod http;
mod orchestrator;
mod persist;
mod report;
mod session;
mod source;
mod types;
mod work_source;

pub use http::{media_filename, HttpMediaSource, MediaSourceSettings, DEFAULT_API_BASE};
pub use orchestrator::DownloadOrchestrator;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use report::{write_summary_report, ReportError};
pub use session::{CredentialPrompt, SessionManager};
pub use source::{MediaSource, PostListing};
pub use types::{
    AuthError, DownloadedMedia, FailureKind, FetchError, ItemError, ListOptions, MediaItem,
    MediaKind, PostHandle, ProfileHandle, Session, SourceError, WorkSourceError,
};
pub use work_source::{SourcedItem, WorkItemSource};
