//! Streaming m3u8 rewriter.
//!
//! [`LineTransform`] is a small push-based state machine: feed it raw origin
//! chunks in any alignment (mid-line, mid-attribute) and it emits complete,
//! rewritten lines as soon as their terminator arrives. Only the tail
//! fragment of the most recent chunk is buffered, so memory stays bounded by
//! the longest line rather than the document size.

use crate::error::ProxyError;
use bytes::Bytes;
use futures_util::Stream;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::pin::Pin;
use std::task::{Context, Poll};
use url::Url;

/// Characters escaped when a resolved URL is embedded in a `?url=` parameter.
///
/// Everything except ASCII alphanumerics and `- _ . ! ~ * ' ( )`, matching
/// the component encoding HLS players already expect from this proxy family.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URL_COMPONENT).to_string()
}

/// Line-oriented playlist rewriter bound to a single request.
///
/// Holds the base URL the playlist was fetched from (always ending in `/`),
/// the `scheme://host` origin derived from it, and the proxy path that
/// rewritten references should route back through.
pub struct LineTransform {
    buffer: Vec<u8>,
    base_url: String,
    base_origin: String,
    proxy_path: String,
}

impl LineTransform {
    /// Create a rewriter for one playlist response.
    ///
    /// `base_url` must be an absolute http(s) URL ending in `/`; parsing it
    /// here surfaces a malformed base before any body bytes are written.
    pub fn new(base_url: &str, proxy_path: &str) -> Result<Self, ProxyError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ProxyError::InvalidTarget(format!("bad base URL {base_url}: {e}")))?;

        Ok(Self {
            buffer: Vec::new(),
            base_url: base_url.to_string(),
            base_origin: parsed.origin().ascii_serialization(),
            proxy_path: proxy_path.to_string(),
        })
    }

    /// Consume one origin chunk, returning every line completed by it.
    ///
    /// Lines are rejoined with `\n`; a trailing `\n` is present iff at least
    /// one line was emitted. The unterminated tail stays buffered.
    pub fn feed(&mut self, chunk: &[u8]) -> Bytes {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Bytes::new();
        };

        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);

        let mut out = String::new();
        // Drop the final \n before splitting so we don't process a phantom
        // empty line, then re-terminate every line on the way out.
        for raw in complete[..complete.len() - 1].split(|&b| b == b'\n') {
            out.push_str(&self.process_line(&String::from_utf8_lossy(raw)));
            out.push('\n');
        }
        Bytes::from(out.into_bytes())
    }

    /// Flush the final unterminated fragment at end of stream.
    ///
    /// No line terminator is synthesized: a document that did not end in a
    /// newline round-trips without one.
    pub fn finish(&mut self) -> Bytes {
        if self.buffer.is_empty() {
            return Bytes::new();
        }
        let residual = std::mem::take(&mut self.buffer);
        Bytes::from(self.process_line(&String::from_utf8_lossy(&residual)).into_bytes())
    }

    /// Classify and rewrite a single line per the playlist grammar.
    fn process_line(&self, line: &str) -> String {
        // Detach a trailing \r so CRLF playlists neither break classification
        // nor leak %0D into rewritten URLs; re-attached on every path.
        let (line, cr) = match line.strip_suffix('\r') {
            Some(stripped) => (stripped, "\r"),
            None => (line, ""),
        };

        // Blank lines and plain directives pass through untouched.
        if line.is_empty() || (line.starts_with('#') && !line.contains("URI=\"")) {
            return format!("{line}{cr}");
        }

        // Directives carrying URI attributes (EXT-X-KEY, EXT-X-MAP, ...):
        // every occurrence on the line is rewritten independently.
        if line.contains("URI=\"") {
            return format!("{}{cr}", self.rewrite_uri_attributes(line));
        }

        // Bare reference line: a segment or sub-playlist URL.
        if !line.starts_with('#') {
            let absolute = self.resolve(line);
            return format!(
                "{}?url={}{cr}",
                self.proxy_path,
                encode_component(&absolute)
            );
        }

        format!("{line}{cr}")
    }

    fn rewrite_uri_attributes(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut rest = line;

        while let Some(start) = rest.find("URI=\"") {
            let value_start = start + "URI=\"".len();
            let Some(value_len) = rest[value_start..].find('"') else {
                // Unterminated attribute: leave the remainder as-is.
                break;
            };

            let absolute = self.resolve(&rest[value_start..value_start + value_len]);
            out.push_str(&rest[..start]);
            out.push_str("URI=\"");
            out.push_str(&self.proxy_path);
            out.push_str("?url=");
            out.push_str(&encode_component(&absolute));
            out.push('"');

            rest = &rest[value_start + value_len + 1..];
        }

        out.push_str(rest);
        out
    }

    /// Resolve a playlist reference against the base URL.
    ///
    /// Deliberately minimal: no `.`/`..` collapsing, matching the narrow
    /// subset of references HLS playlists actually use.
    fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        if reference.starts_with('/') {
            return format!("{}{}", self.base_origin, reference);
        }
        format!("{}{}", self.base_url, reference)
    }
}

/// Adapts an origin byte stream into a rewritten body stream.
///
/// Pull-driven: upstream is only polled when the client body is polled, so
/// backpressure holds in both directions. Dropping the stream drops the
/// origin response, aborting the transfer on client disconnect.
pub struct RewriteStream<E> {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>>,
    transform: LineTransform,
    finished: bool,
}

impl<E> RewriteStream<E> {
    pub fn new(
        inner: impl Stream<Item = Result<Bytes, E>> + Send + 'static,
        transform: LineTransform,
    ) -> Self {
        Self {
            inner: Box::pin(inner),
            transform,
            finished: false,
        }
    }
}

impl<E> Stream for RewriteStream<E> {
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let emitted = this.transform.feed(&chunk);
                    // A chunk with no completed line emits nothing; keep
                    // pulling rather than yielding empty frames.
                    if !emitted.is_empty() {
                        return Poll::Ready(Some(Ok(emitted)));
                    }
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    this.finished = true;
                    let residual = this.transform.finish();
                    if residual.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(residual)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
