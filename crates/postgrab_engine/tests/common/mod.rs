#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use postgrab_core::Shortcode;
use postgrab_engine::{
    AuthError, DownloadedMedia, ListOptions, MediaItem, MediaKind, MediaSource, PostHandle,
    PostListing, ProfileHandle, Session, SourceError,
};
use secrecy::{ExposeSecret, Secret};
use tokio_util::sync::CancellationToken;

pub fn post(code: &str) -> PostHandle {
    PostHandle {
        shortcode: Shortcode::parse(code).unwrap(),
        owner: Some("someone".to_string()),
        taken_at: None,
        media: vec![MediaItem {
            url: format!("https://cdn.example/{code}.jpg"),
            kind: MediaKind::Image,
        }],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCall {
    pub shortcode: String,
    pub target_dir: PathBuf,
    pub filename_base: String,
}

/// In-memory media source that records every call it receives.
#[derive(Default)]
pub struct FakeSource {
    pub password: Option<String>,
    pub profiles: HashMap<String, Vec<PostHandle>>,
    pub listing_error_after: Option<usize>,
    pub failing: HashSet<String>,
    pub missing: HashSet<String>,
    pub downloads: Arc<Mutex<Vec<DownloadCall>>>,
    pub fetches: Arc<Mutex<Vec<String>>>,
    pub listed: Arc<AtomicUsize>,
    pub auth_calls: Arc<AtomicUsize>,
    pub stop_after_downloads: Option<(usize, CancellationToken)>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, name: &str, codes: &[&str]) -> Self {
        self.profiles
            .insert(name.to_string(), codes.iter().map(|c| post(c)).collect());
        self
    }

    pub fn failing_on(mut self, code: &str) -> Self {
        self.failing.insert(code.to_string());
        self
    }

    pub fn missing(mut self, code: &str) -> Self {
        self.missing.insert(code.to_string());
        self
    }

    pub fn downloaded_codes(&self) -> Vec<String> {
        self.downloads
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.shortcode.clone())
            .collect()
    }

    pub fn listed_count(&self) -> usize {
        self.listed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaSource for FakeSource {
    async fn authenticate(
        &self,
        username: &str,
        password: &Secret<String>,
    ) -> Result<Session, AuthError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        match &self.password {
            Some(expected) if expected == password.expose_secret() => Ok(
                Session::authenticated(username, Secret::new("token-123".to_string())),
            ),
            Some(_) => Err(AuthError::BadCredentials {
                username: username.to_string(),
            }),
            None => Err(AuthError::Connection("unreachable".to_string())),
        }
    }

    async fn resolve_profile(
        &self,
        _session: &Session,
        name: &str,
    ) -> Result<ProfileHandle, SourceError> {
        if self.profiles.contains_key(name) {
            Ok(ProfileHandle {
                id: format!("id-{name}"),
                username: name.to_string(),
            })
        } else {
            Err(SourceError::ProfileNotFound(name.to_string()))
        }
    }

    fn list_posts(
        &self,
        _session: &Session,
        profile: &ProfileHandle,
        _options: ListOptions,
    ) -> Box<dyn PostListing> {
        let posts = self
            .profiles
            .get(&profile.username)
            .cloned()
            .unwrap_or_default();
        Box::new(FakeListing {
            posts: posts.into(),
            listed: self.listed.clone(),
            error_after: self.listing_error_after,
            ended: false,
        })
    }

    async fn fetch_post(
        &self,
        _session: &Session,
        shortcode: &Shortcode,
    ) -> Result<PostHandle, SourceError> {
        self.fetches.lock().unwrap().push(shortcode.to_string());
        if self.missing.contains(shortcode.as_str()) {
            return Err(SourceError::PostNotFound(shortcode.to_string()));
        }
        Ok(post(shortcode.as_str()))
    }

    async fn download(
        &self,
        _session: &Session,
        post: &PostHandle,
        target_dir: &Path,
        filename_base: &str,
    ) -> Result<DownloadedMedia, SourceError> {
        let count = {
            let mut downloads = self.downloads.lock().unwrap();
            downloads.push(DownloadCall {
                shortcode: post.shortcode.to_string(),
                target_dir: target_dir.to_path_buf(),
                filename_base: filename_base.to_string(),
            });
            downloads.len()
        };
        if let Some((limit, token)) = &self.stop_after_downloads {
            if count >= *limit {
                token.cancel();
            }
        }
        if self.failing.contains(post.shortcode.as_str()) {
            return Err(SourceError::NoMedia(post.shortcode.to_string()));
        }
        Ok(DownloadedMedia {
            files: vec![target_dir.join(format!("{filename_base}.jpg"))],
            bytes_written: 3,
        })
    }
}

struct FakeListing {
    posts: VecDeque<PostHandle>,
    listed: Arc<AtomicUsize>,
    error_after: Option<usize>,
    ended: bool,
}

#[async_trait::async_trait]
impl PostListing for FakeListing {
    async fn next_post(&mut self) -> Option<Result<PostHandle, SourceError>> {
        if self.ended {
            return None;
        }
        let listed = self.listed.load(Ordering::SeqCst);
        if self.error_after == Some(listed) {
            // Like a failed page fetch: nothing to continue from.
            self.ended = true;
            self.listed.fetch_add(1, Ordering::SeqCst);
            return Some(Err(SourceError::ProfileNotFound("gone".to_string())));
        }
        let next = self.posts.pop_front()?;
        self.listed.fetch_add(1, Ordering::SeqCst);
        Some(Ok(next))
    }
}

pub struct FixedPrompt {
    pub password: String,
    pub calls: AtomicUsize,
}

impl FixedPrompt {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl postgrab_engine::CredentialPrompt for FixedPrompt {
    fn password_for(&self, _username: &str) -> std::io::Result<Secret<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Secret::new(self.password.clone()))
    }
}
