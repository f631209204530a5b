//! Shared fixtures: a scripted page renderer and a local media server.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use clipfetch::browser::{PageRenderer, RenderError, RenderSession, RenderedPage};
use clipfetch::http_client::{HttpClient, BROWSER_USER_AGENT};
use clipfetch::Pipeline;

pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42 fake video payload";

/// What a stub session does when asked to render.
#[derive(Clone)]
pub enum Script {
    Page { final_url: String, markup: String },
    Fail,
    Hang(Duration),
}

/// Session bookkeeping shared between the renderer and the test.
#[derive(Default)]
pub struct SessionStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub active: AtomicUsize,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct StubRenderer {
    script: Script,
    pub stats: Arc<SessionStats>,
}

impl StubRenderer {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            stats: Arc::new(SessionStats::default()),
        }
    }

    /// Renderer reporting into existing stats.
    pub fn sharing(script: Script, stats: Arc<SessionStats>) -> Self {
        Self { script, stats }
    }

    pub fn page(final_url: &str, markup: &str) -> Self {
        Self::new(Script::Page {
            final_url: final_url.to_string(),
            markup: markup.to_string(),
        })
    }
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        self.stats.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            script: self.script.clone(),
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct StubSession {
    script: Script,
    stats: Arc<SessionStats>,
}

#[async_trait]
impl RenderSession for StubSession {
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        match &self.script {
            Script::Page { final_url, markup } => Ok(RenderedPage::new(final_url, markup)),
            Script::Fail => Err(RenderError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
            Script::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Err(RenderError::NavigationTimeout {
                    url: url.to_string(),
                    secs: duration.as_secs(),
                })
            }
        }
    }

    async fn close(self: Box<Self>) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for StubSession {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Pipeline over a stub renderer with the given budget.
pub fn pipeline(renderer: StubRenderer, budget: Duration) -> (Pipeline, Arc<SessionStats>) {
    let stats = Arc::clone(&renderer.stats);
    let http = HttpClient::new(BROWSER_USER_AGENT, None).unwrap();
    (Pipeline::new(Arc::new(renderer), http, budget), stats)
}

/// Start a media server on 127.0.0.1 and return its base URL.
///
/// Routes: `/video.mp4` serves [`VIDEO_BYTES`], `/missing.mp4` is a 404 and
/// `/stall.mp4` sends one chunk then stalls.
pub async fn serve_media() -> String {
    let app = Router::new()
        .route("/video.mp4", get(|| async { VIDEO_BYTES }))
        .route("/missing.mp4", get(|| async { StatusCode::NOT_FOUND }))
        .route("/stall.mp4", get(|| async { Body::from_stream(stalled_body()) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Media server whose `/video.mp4` records the number of live sessions at the
/// moment the request arrives. The recorded value starts at `usize::MAX`.
pub async fn serve_media_observing(stats: Arc<SessionStats>) -> (String, Arc<AtomicUsize>) {
    let seen = Arc::new(AtomicUsize::new(usize::MAX));
    let recorder = Arc::clone(&seen);
    let app = Router::new().route(
        "/video.mp4",
        get(move || {
            recorder.store(stats.active(), Ordering::SeqCst);
            async { VIDEO_BYTES }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), seen)
}

fn stalled_body() -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> {
    futures::stream::unfold(0u8, |state| async move {
        match state {
            0 => Some((Ok(Bytes::from_static(b"partial")), 1)),
            _ => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                None
            }
        }
    })
}

pub fn og_video_page(media_url: &str) -> String {
    format!(
        r#"<html><head><meta property="og:video" content="{}"></head><body></body></html>"#,
        media_url
    )
}
