use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};
use postgrab_core::{resolve_shortcode, ResolutionMode, Shortcode, WorkItem};

use crate::{
    ItemError, ListOptions, MediaSource, PostHandle, PostListing, Session, SourceError,
    WorkSourceError,
};

/// A work item together with the post handle its source already holds, if any.
#[derive(Debug, Clone)]
pub struct SourcedItem {
    pub item: WorkItem,
    pub post: Option<PostHandle>,
}

/// Lazy producer of work items for one input mode.
///
/// Elements are only materialized when pulled; a fresh instance is needed to
/// start over.
pub struct WorkItemSource {
    inner: Inner,
}

enum Inner {
    Single(Option<Result<WorkItem, ItemError>>),
    File {
        path: PathBuf,
        lines: Lines<BufReader<File>>,
        line_no: usize,
        done: bool,
    },
    Profile {
        name: String,
        listing: Box<dyn PostListing>,
        done: bool,
    },
}

impl WorkItemSource {
    /// One item for a shortcode given verbatim. Validation happens when it is
    /// pulled, so a malformed value is an item failure.
    pub fn direct(raw: &str) -> Self {
        let raw = raw.trim();
        let item = Shortcode::parse(raw)
            .map(|code| WorkItem::new(code, ResolutionMode::Direct))
            .map_err(|source| ItemError::InvalidShortcode {
                raw: raw.to_string(),
                source,
            });
        Self {
            inner: Inner::Single(Some(item)),
        }
    }

    /// One item resolved from a post URL, or a single item failure when the
    /// URL holds no shortcode.
    pub fn from_url(url: &str) -> Self {
        let item = resolve_shortcode(url)
            .map(|code| WorkItem::new(code, ResolutionMode::Url))
            .map_err(ItemError::from);
        Self {
            inner: Inner::Single(Some(item)),
        }
    }

    /// One item per non-blank line of a UTF-8 file, read as items are pulled.
    pub fn from_file(path: &Path) -> Result<Self, WorkSourceError> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                WorkSourceError::FileNotFound(path.to_path_buf())
            } else {
                WorkSourceError::FileOpen {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        engine_info!("Reading shortcodes from {}", path.display());
        Ok(Self {
            inner: Inner::File {
                path: path.to_path_buf(),
                lines: BufReader::new(file).lines(),
                line_no: 0,
                done: false,
            },
        })
    }

    /// Posts of a profile as listed by the media source.
    ///
    /// Fails up front when the profile cannot be resolved, since nothing could
    /// be produced at all.
    pub async fn from_profile(
        source: &dyn MediaSource,
        session: &Session,
        name: &str,
        options: ListOptions,
    ) -> Result<Self, WorkSourceError> {
        let profile = source.resolve_profile(session, name).await?;
        engine_info!("Downloading posts from @{}...", profile.username);
        let listing = source.list_posts(session, &profile, options);
        Ok(Self {
            inner: Inner::Profile {
                name: profile.username,
                listing,
                done: false,
            },
        })
    }

    pub async fn next_item(&mut self) -> Option<Result<SourcedItem, ItemError>> {
        match &mut self.inner {
            Inner::Single(slot) => slot
                .take()
                .map(|res| res.map(|item| SourcedItem { item, post: None })),
            Inner::File {
                path,
                lines,
                line_no,
                done,
            } => {
                if *done {
                    return None;
                }
                next_file_item(path, lines, line_no, done)
            }
            Inner::Profile {
                name,
                listing,
                done,
            } => {
                if *done {
                    return None;
                }
                match listing.next_post().await {
                    Some(Ok(post)) => {
                        let item =
                            WorkItem::new(post.shortcode.clone(), ResolutionMode::ProfileListing);
                        Some(Ok(SourcedItem {
                            item,
                            post: Some(post),
                        }))
                    }
                    // The listing decides whether it can go on after an error.
                    Some(Err(SourceError::InvalidShortcode { raw, source })) => {
                        Some(Err(ItemError::InvalidShortcode { raw, source }))
                    }
                    Some(Err(source)) => Some(Err(ItemError::Listing {
                        profile: name.clone(),
                        source,
                    })),
                    None => {
                        *done = true;
                        None
                    }
                }
            }
        }
    }
}

fn next_file_item(
    path: &Path,
    lines: &mut Lines<BufReader<File>>,
    line_no: &mut usize,
    done: &mut bool,
) -> Option<Result<SourcedItem, ItemError>> {
    loop {
        let line = match lines.next() {
            Some(line) => line,
            None => {
                *done = true;
                return None;
            }
        };
        *line_no += 1;
        let line = match line {
            Ok(line) => line,
            Err(source) => {
                // Undecodable bytes are consumed with the line; anything else
                // leaves the reader in an unknown state.
                if source.kind() != ErrorKind::InvalidData {
                    *done = true;
                }
                return Some(Err(ItemError::FileRead {
                    path: path.to_path_buf(),
                    line: *line_no,
                    source,
                }));
            }
        };
        let raw = line.trim();
        if raw.is_empty() {
            engine_debug!("Skipping blank line {} of {}", line_no, path.display());
            continue;
        }
        let item = Shortcode::parse(raw)
            .map(|code| SourcedItem {
                item: WorkItem::new(code, ResolutionMode::FileLine),
                post: None,
            })
            .map_err(|source| ItemError::InvalidShortcode {
                raw: raw.to_string(),
                source,
            });
        return Some(item);
    }
}
