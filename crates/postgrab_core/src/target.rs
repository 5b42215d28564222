use std::path::{Path, PathBuf};

use crate::Shortcode;

/// Destination of one post: `{base_dir}/{shortcode}/`, with the shortcode as
/// the base of every media filename written there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    dir: PathBuf,
    filename_base: String,
}

impl DownloadTarget {
    pub fn for_shortcode(base_dir: &Path, shortcode: &Shortcode) -> Self {
        Self {
            dir: base_dir.join(shortcode.as_str()),
            filename_base: shortcode.as_str().to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn filename_base(&self) -> &str {
        &self.filename_base
    }
}
