use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::warn;

use crate::catalogue::{MediaKind, PortfolioEntry};
use crate::constants::constants;

// --- Id extraction ---

/// YouTube URL shapes in precedence order. The first pattern that captures an id wins.
static YOUTUBE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
  [
    Regex::new(r"[?&]v=([A-Za-z0-9_-]{11})").expect("static regex"),
    Regex::new(r"youtu\.be/([A-Za-z0-9_-]{11})").expect("static regex"),
    Regex::new(r"youtube\.com/embed/([A-Za-z0-9_-]{11})").expect("static regex"),
  ]
});

static FIGMA_FILE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"figma\.com/(?:file|design)/([^/?#]+)").expect("static regex"));

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')');

/// Extract the 11-character video id from a watch, short or embed YouTube URL.
pub fn youtube_id(url: &str) -> Option<&str> {
  YOUTUBE_PATTERNS.iter().find_map(|re| re.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

/// Extract the file id from a `/file/{id}` or `/design/{id}` Figma URL.
pub fn figma_file_id(url: &str) -> Option<&str> {
  FIGMA_FILE.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Percent-encode a URL for use as a query value, the way `encodeURIComponent` does.
pub fn encode_component(s: &str) -> String {
  utf8_percent_encode(s, URI_COMPONENT).to_string()
}

// --- Playable URLs ---

/// What the viewer should load for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "url", rename_all = "lowercase")]
pub enum Playable {
  /// Provider player URL (YouTube or Figma embed).
  Embed(String),
  /// Direct media: image, video file or remote player, audio file.
  Native(String),
  /// Extraction failed; the raw URL is handed through unchanged.
  Passthrough(String),
}

impl Playable {
  pub fn url(&self) -> &str {
    match self {
      Playable::Embed(url) | Playable::Native(url) | Playable::Passthrough(url) => url,
    }
  }

  pub fn is_passthrough(&self) -> bool {
    matches!(self, Playable::Passthrough(_))
  }
}

fn youtube_embed(url: &str) -> Playable {
  if url.contains("youtube.com/embed/") {
    return Playable::Embed(url.to_string());
  }
  match youtube_id(url) {
    Some(id) => Playable::Embed(format!("{}{}", constants().youtube_embed_base, id)),
    None => {
      warn!(url = %url, "media: could not extract YouTube video id");
      Playable::Passthrough(url.to_string())
    }
  }
}

fn figma_embed(url: &str) -> Playable {
  if url.contains("figma.com/embed") {
    return Playable::Embed(url.to_string());
  }
  if figma_file_id(url).is_some() {
    Playable::Embed(format!("{}{}", constants().figma_embed_base, encode_component(url)))
  } else {
    warn!(url = %url, "media: could not extract Figma file id");
    Playable::Passthrough(url.to_string())
  }
}

/// Normalise an entry's URL into something the viewer can load.
/// Applying it to an embed URL returns that URL unchanged.
pub fn embed_url(entry: &PortfolioEntry) -> Playable {
  match entry.kind {
    MediaKind::Youtube => youtube_embed(&entry.url),
    MediaKind::Figma => figma_embed(&entry.url),
    MediaKind::Image | MediaKind::Video | MediaKind::Audio => Playable::Native(entry.url.clone()),
  }
}

/// Thumbnail for the grid and the viewer. An explicit thumbnail always wins.
///
/// YouTube derives one from the video id (empty when extraction fails), Figma
/// and audio fall back to fixed placeholders, local video needs a placeholder
/// too, and images or remote video serve as their own thumbnail.
pub fn thumbnail_url(entry: &PortfolioEntry) -> String {
  if let Some(ref thumb) = entry.thumbnail
    && !thumb.is_empty()
  {
    return thumb.clone();
  }
  match entry.kind {
    MediaKind::Youtube => match youtube_id(&entry.url) {
      Some(id) => constants().youtube_thumbnail_format.replace("{id}", id),
      None => {
        warn!(url = %entry.url, "media: no YouTube thumbnail, video id not found");
        String::new()
      }
    },
    MediaKind::Figma => constants().figma_placeholder.clone(),
    MediaKind::Audio => constants().audio_placeholder.clone(),
    MediaKind::Video if entry.is_local() => constants().video_placeholder.clone(),
    MediaKind::Video | MediaKind::Image => entry.url.clone(),
  }
}

/// Whether the thumbnail is a stand-in rather than a picture of the work itself.
pub fn is_placeholder(thumbnail: &str) -> bool {
  let c = constants();
  thumbnail.is_empty()
    || thumbnail == c.figma_placeholder
    || thumbnail == c.audio_placeholder
    || thumbnail == c.video_placeholder
}
