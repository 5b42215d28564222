use std::path::Path;

use postgrab_core::Shortcode;
use secrecy::Secret;

use crate::{
    AuthError, DownloadedMedia, ListOptions, PostHandle, ProfileHandle, Session, SourceError,
};

/// The remote service posts are fetched from.
///
/// Every call may suspend on network I/O. Implementations never keep
/// per-download state between calls: the filename base travels with each
/// `download` call.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &Secret<String>,
    ) -> Result<Session, AuthError>;

    async fn resolve_profile(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<ProfileHandle, SourceError>;

    /// Lazy listing of a profile's posts, newest first. No request is made
    /// until the first element is pulled.
    fn list_posts(
        &self,
        session: &Session,
        profile: &ProfileHandle,
        options: ListOptions,
    ) -> Box<dyn PostListing>;

    async fn fetch_post(
        &self,
        session: &Session,
        shortcode: &Shortcode,
    ) -> Result<PostHandle, SourceError>;

    /// Store all media of `post` inside `target_dir`, naming files after
    /// `filename_base`.
    async fn download(
        &self,
        session: &Session,
        post: &PostHandle,
        target_dir: &Path,
        filename_base: &str,
    ) -> Result<DownloadedMedia, SourceError>;
}

/// Cursor over a possibly remote-paginated sequence of posts.
#[async_trait::async_trait]
pub trait PostListing: Send {
    /// Next post, fetching a new page only when the current one is used up.
    async fn next_post(&mut self) -> Option<Result<PostHandle, SourceError>>;
}
