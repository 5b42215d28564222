use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_trace};
use futures_util::StreamExt;
use postgrab_core::Shortcode;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::persist::AtomicFileWriter;
use crate::{
    AuthError, DownloadedMedia, FailureKind, FetchError, ListOptions, MediaItem, MediaKind,
    MediaSource, PostHandle, PostListing, ProfileHandle, Session, SourceError,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8700/";

#[derive(Debug, Clone)]
pub struct MediaSourceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_media_bytes: u64,
    pub user_agent: String,
}

impl Default for MediaSourceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_media_bytes: 200 * 1024 * 1024,
            user_agent: concat!("postgrab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Media source speaking the JSON gateway protocol over HTTP.
///
/// Endpoints, relative to `base_url`:
/// - `POST auth/login` with `{"username", "password"}` returns `{"token"}`
/// - `GET profiles/{name}` returns `{"id", "username"}`
/// - `GET profiles/{id}/posts?posts_only=..&cursor=..` returns
///   `{"items": [post], "next_cursor"}`
/// - `GET posts/{shortcode}` returns a post
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
    settings: MediaSourceSettings,
    base: Url,
    client: reqwest::Client,
}

impl HttpMediaSource {
    pub fn new(settings: MediaSourceSettings) -> Result<Self, FetchError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as an api base", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn media_url(&self, raw: &str) -> Result<Url, FetchError> {
        Url::parse(raw)
            .or_else(|_| self.base.join(raw))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn get(&self, session: &Session, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match session.token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        url: Url,
    ) -> Result<T, FetchError> {
        engine_trace!("GET {}", url);
        let response = self
            .get(session, url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }

    async fn download_media(
        &self,
        session: &Session,
        media: &MediaItem,
        writer: &AtomicFileWriter,
        filename: &str,
    ) -> Result<(std::path::PathBuf, u64), SourceError> {
        let url = self.media_url(&media.url)?;
        engine_debug!("Fetching media {} into {}", url, filename);
        let response = self
            .get(session, url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status).into());
        }

        let max_bytes = self.settings.max_media_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len).into());
            }
        }

        let mut staged = writer.stage(filename)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = staged.written() + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len).into());
            }
            staged.append(&chunk)?;
        }
        let written = staged.written();
        let path = staged.commit()?;
        Ok((path, written))
    }
}

#[async_trait::async_trait]
impl MediaSource for HttpMediaSource {
    async fn authenticate(
        &self,
        username: &str,
        password: &Secret<String>,
    ) -> Result<Session, AuthError> {
        let url = self.endpoint(&["auth", "login"]);
        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| AuthError::Connection(map_reqwest_error(err).to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(AuthError::BadCredentials {
                username: username.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AuthError::Connection(status_error(status).to_string()));
        }
        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Connection(err.to_string()))?;
        Ok(Session::authenticated(username, Secret::new(payload.token)))
    }

    async fn resolve_profile(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<ProfileHandle, SourceError> {
        let url = self.endpoint(&["profiles", name]);
        match self.get_json::<ProfilePayload>(session, url).await {
            Ok(profile) => Ok(ProfileHandle {
                id: profile.id,
                username: profile.username,
            }),
            Err(err) if is_not_found(&err) => Err(SourceError::ProfileNotFound(name.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    fn list_posts(
        &self,
        session: &Session,
        profile: &ProfileHandle,
        options: ListOptions,
    ) -> Box<dyn PostListing> {
        Box::new(HttpPostListing {
            source: self.clone(),
            session: session.clone(),
            profile_id: profile.id.clone(),
            options,
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        })
    }

    async fn fetch_post(
        &self,
        session: &Session,
        shortcode: &Shortcode,
    ) -> Result<PostHandle, SourceError> {
        let url = self.endpoint(&["posts", shortcode.as_str()]);
        match self.get_json::<PostPayload>(session, url).await {
            Ok(post) => post.into_handle(),
            Err(err) if is_not_found(&err) => Err(SourceError::PostNotFound(shortcode.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn download(
        &self,
        session: &Session,
        post: &PostHandle,
        target_dir: &Path,
        filename_base: &str,
    ) -> Result<DownloadedMedia, SourceError> {
        if post.media.is_empty() {
            return Err(SourceError::NoMedia(post.shortcode.to_string()));
        }
        let writer = AtomicFileWriter::new(target_dir.to_path_buf());
        let total = post.media.len();
        let mut downloaded = DownloadedMedia {
            files: Vec::with_capacity(total),
            bytes_written: 0,
        };
        for (index, media) in post.media.iter().enumerate() {
            let filename = media_filename(filename_base, index, total, media.kind.extension());
            let (path, written) = self
                .download_media(session, media, &writer, &filename)
                .await?;
            downloaded.files.push(path);
            downloaded.bytes_written += written;
        }
        Ok(downloaded)
    }
}

/// `{base}.{ext}` for single-media posts, `{base}_{n}.{ext}` (1-based)
/// otherwise.
pub fn media_filename(base: &str, index: usize, total: usize, extension: &str) -> String {
    if total <= 1 {
        format!("{base}.{extension}")
    } else {
        format!("{base}_{}.{extension}", index + 1)
    }
}

struct HttpPostListing {
    source: HttpMediaSource,
    session: Session,
    profile_id: String,
    options: ListOptions,
    buffer: VecDeque<PostPayload>,
    cursor: Option<String>,
    exhausted: bool,
}

impl HttpPostListing {
    async fn fetch_page(&mut self) -> Result<(), SourceError> {
        let mut url = self
            .source
            .endpoint(&["profiles", self.profile_id.as_str(), "posts"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(
                "posts_only",
                if self.options.posts_only { "true" } else { "false" },
            );
            if let Some(cursor) = &self.cursor {
                query.append_pair("cursor", cursor);
            }
        }
        engine_debug!("Fetching next page of posts for profile {}", self.profile_id);
        let page: PostPage = self.source.get_json(&self.session, url).await?;
        self.buffer.extend(page.items);
        match page.next_cursor {
            Some(next) if !next.is_empty() => self.cursor = Some(next),
            _ => self.exhausted = true,
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostListing for HttpPostListing {
    async fn next_post(&mut self) -> Option<Result<PostHandle, SourceError>> {
        // An empty page with a cursor is legal; keep paging until an item or
        // the end shows up.
        while self.buffer.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page().await {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(PostPayload::into_handle)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ProfilePayload {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct PostPage {
    items: Vec<PostPayload>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct PostPayload {
    shortcode: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    taken_at: Option<DateTime<Utc>>,
    #[serde(default)]
    media: Vec<MediaPayload>,
}

#[derive(Deserialize)]
struct MediaPayload {
    url: String,
    kind: MediaKindPayload,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum MediaKindPayload {
    Image,
    Video,
}

impl PostPayload {
    fn into_handle(self) -> Result<PostHandle, SourceError> {
        let shortcode =
            Shortcode::parse(&self.shortcode).map_err(|source| SourceError::InvalidShortcode {
                raw: self.shortcode.clone(),
                source,
            })?;
        let media = self
            .media
            .into_iter()
            .map(|m| MediaItem {
                url: m.url,
                kind: match m.kind {
                    MediaKindPayload::Image => MediaKind::Image,
                    MediaKindPayload::Video => MediaKind::Video,
                },
            })
            .collect();
        Ok(PostHandle {
            shortcode,
            owner: self.owner,
            taken_at: self.taken_at,
            media,
        })
    }
}

fn is_not_found(err: &FetchError) -> bool {
    err.kind == FailureKind::HttpStatus(StatusCode::NOT_FOUND.as_u16())
}

fn status_error(status: StatusCode) -> FetchError {
    FetchError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "media too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
