use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("malformed link {raw:?}: expected scheme and host segments")]
    Malformed { raw: String },
}

/// Normalized, deduplication-key form of a URL.
///
/// Produced only by [`canonicalize`]; the inner string is the store
/// identifier for items and jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalLink(String);

impl CanonicalLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host segment of the link (third `/`-delimited field).
    pub fn host(&self) -> &str {
        self.0.split('/').nth(2).unwrap_or("")
    }

    /// `scheme//host` prefix used as the base for rewriting relative
    /// references found in fetched markup.
    pub fn origin(&self) -> String {
        let mut parts = self.0.splitn(4, '/');
        let scheme = parts.next().unwrap_or("");
        parts.next();
        let host = parts.next().unwrap_or("");
        format!("{scheme}//{host}")
    }
}

impl fmt::Display for CanonicalLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a candidate link into its canonical, dedup-key form.
///
/// Lower-cases and trims the input, collapses repeated slashes by
/// splitting on `/` and dropping empty segments, and reassembles as
/// `scheme//host/path...`. Known video-provider "watch" paths are
/// rewritten to their embeddable form before returning. The whole
/// operation is idempotent: canonicalizing a canonical link yields the
/// same link.
pub fn canonicalize(raw: &str) -> Result<CanonicalLink, LinkError> {
    let lowered = raw.trim().to_lowercase();
    let segments: Vec<&str> = lowered.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return Err(LinkError::Malformed {
            raw: raw.to_string(),
        });
    }
    let link = format!("{}//{}", segments[0], segments[1..].join("/"));
    Ok(CanonicalLink(rewrite_provider(link)))
}

/// Rewrite video-provider watch URLs to their embed form so the page can
/// be framed later. One-way: embed links pass through unchanged.
fn rewrite_provider(link: String) -> String {
    if link.starts_with("https://www.youtube.com") {
        return link.replace("watch?v=", "embed/");
    }
    let dailymotion = link.starts_with("https://www.dailymotion.com")
        || link.starts_with("http://www.dailymotion.com");
    if dailymotion && !link.contains("/embed/video") {
        return link.replace("/video", "/embed/video");
    }
    link
}
