use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use postgrab_core::{ResolveError, Shortcode, ShortcodeError};
use secrecy::Secret;

use crate::persist::PersistError;

/// Anonymous or authenticated context for one run.
///
/// Created once by the session manager and only ever borrowed afterwards.
#[derive(Debug, Clone)]
pub enum Session {
    Anonymous,
    Authenticated {
        username: String,
        token: Secret<String>,
    },
}

impl Session {
    pub fn anonymous() -> Self {
        Session::Anonymous
    }

    pub fn authenticated(username: impl Into<String>, token: Secret<String>) -> Self {
        Session::Authenticated {
            username: username.into(),
            token,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { username, .. } => Some(username),
        }
    }

    pub fn token(&self) -> Option<&Secret<String>> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { token, .. } => Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHandle {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostHandle {
    pub shortcode: Shortcode,
    pub owner: Option<String>,
    pub taken_at: Option<DateTime<Utc>>,
    pub media: Vec<MediaItem>,
}

impl PostHandle {
    /// Creation time formatted for status lines, or `unknown date`.
    pub fn date_label(&self) -> String {
        self.taken_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown date".to_string())
    }
}

/// Options forwarded untouched to the media source's profile listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub posts_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    pub files: Vec<PathBuf>,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials for {username}")]
    BadCredentials { username: String },
    #[error("connection error during login: {0}")]
    Connection(String),
    #[error("could not read password: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Failures reported by a media source operation.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("profile @{0} does not exist or is private")]
    ProfileNotFound(String),
    #[error("post {0} does not exist or is not accessible")]
    PostNotFound(String),
    #[error("post {0} has no downloadable media")]
    NoMedia(String),
    #[error("listed post has invalid shortcode {raw:?}: {source}")]
    InvalidShortcode {
        raw: String,
        #[source]
        source: ShortcodeError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to store media: {0}")]
    Persist(#[from] PersistError),
}

/// Failures that prevent a work item source from producing anything.
#[derive(Debug, thiserror::Error)]
pub enum WorkSourceError {
    #[error("shortcode file {0:?} not found")]
    FileNotFound(PathBuf),
    #[error("cannot open shortcode file {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A failure confined to one element of a work item source.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Unresolved(#[from] ResolveError),
    #[error("invalid shortcode {raw:?}: {source}")]
    InvalidShortcode {
        raw: String,
        #[source]
        source: ShortcodeError,
    },
    #[error("reading {path:?} line {line}: {source}")]
    FileRead {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("listing posts of @{profile} failed: {source}")]
    Listing {
        profile: String,
        #[source]
        source: SourceError,
    },
}

impl ItemError {
    /// Label used for this failure in the run summary.
    pub fn label(&self) -> String {
        match self {
            ItemError::Unresolved(ResolveError::NotFound(input)) => input.clone(),
            ItemError::InvalidShortcode { raw, .. } => raw.clone(),
            ItemError::FileRead { path, line, .. } => format!("{}:{line}", path.display()),
            ItemError::Listing { profile, .. } => format!("@{profile}"),
        }
    }
}
