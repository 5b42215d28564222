use std::path::PathBuf;

use engine_logging::{engine_info, engine_warn};
use postgrab_core::{DownloadTarget, RunSummary};
use tokio_util::sync::CancellationToken;

use crate::{DownloadedMedia, MediaSource, Session, SourceError, SourcedItem, WorkItemSource};

/// Drives a work item source to completion, one post at a time.
///
/// A failing post is recorded and logged, never propagated: the run always
/// ends with a summary.
pub struct DownloadOrchestrator<'a> {
    source: &'a dyn MediaSource,
    session: &'a Session,
    base_dir: PathBuf,
    stop: CancellationToken,
}

impl<'a> DownloadOrchestrator<'a> {
    pub fn new(source: &'a dyn MediaSource, session: &'a Session, base_dir: PathBuf) -> Self {
        Self {
            source,
            session,
            base_dir,
            stop: CancellationToken::new(),
        }
    }

    /// Stop requests are honored between items only; the item in flight
    /// always runs to completion.
    pub fn with_stop_token(mut self, stop: CancellationToken) -> Self {
        self.stop = stop;
        self
    }

    /// Process items in source order. `cap == 0` consumes everything, `cap > 0`
    /// stops after that many attempts without pulling another element.
    pub async fn run(&self, items: &mut WorkItemSource, cap: usize) -> RunSummary {
        let mut summary = RunSummary::new();
        loop {
            if cap > 0 && summary.attempted() >= cap {
                engine_info!("Reached post limit of {}", cap);
                break;
            }
            if self.stop.is_cancelled() {
                summary.mark_interrupted();
                break;
            }
            let Some(next) = items.next_item().await else {
                break;
            };
            match next {
                Ok(sourced) => self.process(sourced, &mut summary).await,
                Err(err) => {
                    engine_warn!("Error: {}", err);
                    summary.record_failure(err.label(), err.to_string());
                }
            }
        }
        summary
    }

    async fn process(&self, sourced: SourcedItem, summary: &mut RunSummary) {
        let shortcode = sourced.item.shortcode().clone();
        let target = DownloadTarget::for_shortcode(&self.base_dir, &shortcode);
        match self.download_one(sourced, &target).await {
            Ok(media) => {
                engine_info!(
                    "Successfully downloaded post {} ({} file(s), {} bytes)",
                    shortcode,
                    media.files.len(),
                    media.bytes_written
                );
                summary.record_success(shortcode.as_str());
            }
            Err(err) => {
                engine_warn!("Error downloading post {}: {}", shortcode, err);
                summary.record_failure(shortcode.as_str(), err.to_string());
            }
        }
    }

    async fn download_one(
        &self,
        sourced: SourcedItem,
        target: &DownloadTarget,
    ) -> Result<DownloadedMedia, SourceError> {
        let shortcode = sourced.item.shortcode();
        let post = match sourced.post {
            Some(post) => {
                engine_info!("Downloading post {} from {}", shortcode, post.date_label());
                post
            }
            None => {
                engine_info!("Downloading post with shortcode {}...", shortcode);
                let post = self.source.fetch_post(self.session, shortcode).await?;
                engine_info!(
                    "Downloading post from {} posted on {}",
                    post.owner.as_deref().unwrap_or("unknown owner"),
                    post.date_label()
                );
                post
            }
        };
        self.source
            .download(self.session, &post, target.dir(), target.filename_base())
            .await
    }
}
