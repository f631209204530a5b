//! clipfetch - resolve social video share links into downloadable media.
//!
//! Core library: share-link extraction, browser rendering, login-wall
//! detection, media URL resolution and streaming download, composed by
//! [`pipeline::Pipeline`] under a single deadline.

pub mod browser;
pub mod chat;
pub mod config;
pub mod extract;
pub mod http_client;
pub mod pipeline;
pub mod resolver;

pub use extract::find_share_link;
pub use pipeline::{FailureKind, FetchedMedia, Pipeline, PipelineError, ResolutionRequest};
pub use resolver::{detect_block, resolve_media, BlockStatus, MediaReference, Resolution};
