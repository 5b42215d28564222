use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static CANONICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("canonical shortcode pattern"));

// Scheme and `www.` are optional. The identifier is the longest run of
// identifier characters; whatever follows it is ignored.
static POST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?instagram\.com/(?:p|reel|tv)/([A-Za-z0-9_-]+)")
        .expect("post url pattern")
});

/// Canonical, case-sensitive identifier of one post.
///
/// Only built through [`Shortcode::parse`], so it is never empty and never
/// contains a path separator. It is used verbatim as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Shortcode(String);

impl Shortcode {
    pub fn parse(raw: &str) -> Result<Self, ShortcodeError> {
        if raw.is_empty() {
            return Err(ShortcodeError::Empty);
        }
        if !CANONICAL_RE.is_match(raw) {
            return Err(ShortcodeError::InvalidCharacters(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Shortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Shortcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcodeError {
    #[error("shortcode is empty")]
    Empty,
    #[error("shortcode {0:?} contains characters outside [A-Za-z0-9_-]")]
    InvalidCharacters(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("could not extract a shortcode from {0:?}")]
    NotFound(String),
}

/// Resolve a bare shortcode or a post/reel/tv URL into a [`Shortcode`].
///
/// Surrounding whitespace is ignored. A bare identifier is returned unchanged;
/// a URL yields the identifier after `/p/`, `/reel/` or `/tv/`.
pub fn resolve_shortcode(input: &str) -> Result<Shortcode, ResolveError> {
    let trimmed = input.trim();
    if CANONICAL_RE.is_match(trimmed) {
        return Ok(Shortcode(trimmed.to_string()));
    }
    POST_URL_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| Shortcode(m.as_str().to_string()))
        .ok_or_else(|| ResolveError::NotFound(input.to_string()))
}
