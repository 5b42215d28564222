use std::fmt;

use serde::Serialize;

use crate::Shortcode;

/// How a work item's shortcode was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    Direct,
    Url,
    ProfileListing,
    FileLine,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::Direct => write!(f, "direct"),
            ResolutionMode::Url => write!(f, "url"),
            ResolutionMode::ProfileListing => write!(f, "profile-listing"),
            ResolutionMode::FileLine => write!(f, "file-line"),
        }
    }
}

/// One resolved unit of download work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    shortcode: Shortcode,
    mode: ResolutionMode,
}

impl WorkItem {
    pub fn new(shortcode: Shortcode, mode: ResolutionMode) -> Self {
        Self { shortcode, mode }
    }

    pub fn shortcode(&self) -> &Shortcode {
        &self.shortcode
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }
}
