//! One render → detect → resolve → fetch run under a single deadline.
//!
//! The deadline drops the in-flight future, which cancels whatever stage is
//! running. The browser session and destination file are both held by drop
//! guards, so a timed-out run releases them as it unwinds.

mod artifact;
mod error;

pub use artifact::TempArtifact;
pub use error::{FailureKind, PipelineError};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{PageRenderer, RenderError, RenderedPage};
use crate::config::Settings;
use crate::http_client::{resolve_user_agent, FetchError, FetchEvent, HttpClient};
use crate::resolver::{detect_block, resolve_media, BlockStatus, MediaReference};

/// Characters of markup logged when no media source is found.
const DIAGNOSTIC_SNIPPET_CHARS: usize = 1000;

static DESTINATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// A share link and where its video should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub source_url: Url,
    pub destination: PathBuf,
}

impl ResolutionRequest {
    pub fn new(source_url: Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_url,
            destination: destination.into(),
        }
    }

    /// Request with a fresh `fb_video_<millis>_<seq>.mp4` destination in `dir`.
    pub fn in_dir(source_url: Url, dir: &Path) -> Self {
        let seq = DESTINATION_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("fb_video_{}_{}.mp4", Utc::now().timestamp_millis(), seq);
        Self::new(source_url, dir.join(name))
    }
}

/// A successfully downloaded video.
///
/// The file is removed when this value is dropped unless [`FetchedMedia::keep`]
/// or [`FetchedMedia::persist_to`] took it.
#[derive(Debug)]
pub struct FetchedMedia {
    artifact: TempArtifact,
    pub bytes: u64,
    pub media: MediaReference,
    /// Name of the extraction strategy that found the media.
    pub strategy: &'static str,
}

impl FetchedMedia {
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }

    /// Take ownership of the downloaded file.
    pub fn keep(self) -> PathBuf {
        self.artifact.keep()
    }

    /// Delete the downloaded file.
    pub async fn discard(self) {
        self.artifact.discard().await
    }

    /// Move the downloaded file to `dest`, never replacing an existing file.
    ///
    /// On error the downloaded file is removed and `dest` is left untouched.
    pub async fn persist_to(self, dest: &Path) -> std::io::Result<PathBuf> {
        if tokio::fs::try_exists(dest).await? {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", dest.display()),
            ));
        }

        if let Err(e) = tokio::fs::rename(self.path(), dest).await {
            // Rename fails across filesystems
            debug!("Rename to {} failed ({}), copying", dest.display(), e);
            tokio::fs::copy(self.path(), dest).await?;
        }

        self.discard().await;
        Ok(dest.to_path_buf())
    }
}

/// Composes rendering, resolution and download.
#[derive(Clone)]
pub struct Pipeline {
    renderer: Arc<dyn PageRenderer>,
    http: HttpClient,
    budget: Duration,
}

impl Pipeline {
    pub fn new(renderer: Arc<dyn PageRenderer>, http: HttpClient, budget: Duration) -> Self {
        Self {
            renderer,
            http,
            budget,
        }
    }

    /// Pipeline backed by a local Chromium, configured from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(settings.browser.user_agent.as_deref());
        let http = HttpClient::new(&user_agent, settings.browser.proxy.as_deref())?;
        let renderer = crate::browser::ChromeRenderer::new(settings.browser.clone());
        Ok(Self::new(
            Arc::new(renderer),
            http,
            settings.pipeline_timeout,
        ))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Resolve the share link and download its video to the request's destination.
    ///
    /// On any failure the destination file is gone when this returns.
    pub async fn resolve_and_fetch(
        &self,
        request: &ResolutionRequest,
        progress: Option<&mpsc::Sender<FetchEvent>>,
    ) -> Result<FetchedMedia, PipelineError> {
        let artifact = TempArtifact::new(&request.destination);
        info!(url = %request.source_url, "Resolving share link");

        let outcome = tokio::time::timeout(self.budget, self.run(request, progress)).await;

        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(self.budget)),
        };

        match result {
            Ok((resolution, bytes)) => Ok(FetchedMedia {
                artifact,
                bytes,
                media: resolution.media,
                strategy: resolution.strategy,
            }),
            Err(e) => {
                warn!(url = %request.source_url, kind = %e.kind(), "Pipeline failed: {}", e);
                artifact.discard().await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &ResolutionRequest,
        progress: Option<&mpsc::Sender<FetchEvent>>,
    ) -> Result<(crate::resolver::Resolution, u64), PipelineError> {
        let source = request.source_url.as_str();
        let page = self.render(source).await?;

        if let BlockStatus::Blocked(reason) = detect_block(&page.final_url, &page.markup) {
            return Err(PipelineError::AccessRestricted {
                final_url: page.final_url,
                reason,
            });
        }

        let Some(resolution) = resolve_media(&page.markup) else {
            debug!(
                final_url = %page.final_url,
                "No media source in page: {}",
                page.snippet(DIAGNOSTIC_SNIPPET_CHARS)
            );
            return Err(PipelineError::SourceNotFound {
                final_url: page.final_url,
            });
        };

        if same_resource(resolution.media.as_str(), source) {
            debug!("Resolved media points back at the share link");
            return Err(PipelineError::SourceNotFound {
                final_url: page.final_url,
            });
        }

        info!(strategy = resolution.strategy, "Media source resolved");
        let bytes = self
            .http
            .download_to(&resolution.media, &request.destination, progress)
            .await?;

        Ok((resolution, bytes))
    }

    /// Render in a fresh session, closing it whatever the outcome.
    async fn render(&self, url: &str) -> Result<RenderedPage, RenderError> {
        let mut session = self.renderer.open().await?;
        let result = session.render(url).await;
        session.close().await;
        result
    }
}

fn same_resource(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_names_are_unique() {
        let url = Url::parse("https://fb.watch/abc/").unwrap();
        let a = ResolutionRequest::in_dir(url.clone(), Path::new("/tmp/v"));
        let b = ResolutionRequest::in_dir(url, Path::new("/tmp/v"));

        assert_ne!(a.destination, b.destination);
        let name = a.destination.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("fb_video_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_same_resource_ignores_trailing_slash() {
        assert!(same_resource("https://fb.watch/x/", "https://fb.watch/x"));
        assert!(!same_resource("https://cdn.example/v.mp4", "https://fb.watch/x"));
    }
}
