//! Segue — a streaming HLS proxy.
//!
//! Fetches playlists and media segments on behalf of a player, rewriting
//! every URL inside a playlist so follow-up requests route back through the
//! proxy. Segments stream through untouched; manifests stream through a
//! line-oriented rewriter that never buffers the whole document.

pub mod config;
pub mod error;
pub mod fetch;
pub mod hls;
pub mod metrics;
pub mod server;
