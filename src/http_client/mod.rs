//! Media download over HTTP.
//!
//! Bodies are streamed chunk by chunk into the destination file so large
//! videos never sit in memory.

mod user_agent;

pub use user_agent::{resolve_user_agent, ACCEPT_LANGUAGE, BROWSER_USER_AGENT};

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_HEADER};
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::resolver::MediaReference;

/// Errors raised while transferring media.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with HTTP {0}")]
    Status(u16),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Progress events emitted while downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Started {
        url: String,
        total_bytes: Option<u64>,
    },
    Progress {
        downloaded: u64,
        total_bytes: Option<u64>,
    },
    Completed {
        path: PathBuf,
        bytes: u64,
    },
}

/// HTTP client presenting the same identity as the rendering browser.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with the given user agent and optional proxy
    /// (`socks5://`, `http://`).
    pub fn new(user_agent: &str, proxy: Option<&str>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE_HEADER,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30));

        // Only the configured proxy is used; HTTP(S)_PROXY from the environment is ignored
        builder = match proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy).map_err(FetchError::Client)?),
            None => builder.no_proxy(),
        };

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Stream `media` into `dest`, creating or truncating it.
    ///
    /// Returns the number of bytes written. Non-2xx responses fail before the
    /// file is created. A partially written file is left for the caller to
    /// clean up.
    pub async fn download_to(
        &self,
        media: &MediaReference,
        dest: &Path,
        events: Option<&mpsc::Sender<FetchEvent>>,
    ) -> Result<u64, FetchError> {
        debug!("Requesting media {}", media);
        let response = self.client.get(media.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let total_bytes = response.content_length();
        emit(
            events,
            FetchEvent::Started {
                url: media.to_string(),
                total_bytes,
            },
        )
        .await;

        let write_err = |source| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        };

        let mut file = File::create(dest).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            downloaded += chunk.len() as u64;
            emit(
                events,
                FetchEvent::Progress {
                    downloaded,
                    total_bytes,
                },
            )
            .await;
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;

        info!("Downloaded {} bytes to {}", downloaded, dest.display());
        emit(
            events,
            FetchEvent::Completed {
                path: dest.to_path_buf(),
                bytes: downloaded,
            },
        )
        .await;

        Ok(downloaded)
    }
}

async fn emit(events: Option<&mpsc::Sender<FetchEvent>>, event: FetchEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is watching progress
        let _ = tx.send(event).await;
    }
}
