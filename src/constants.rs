//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, parsed once on first access.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Global search
  pub search_min_chars: usize,
  pub search_max_results: usize,

  // Placeholders
  pub figma_placeholder: String,
  pub audio_placeholder: String,
  pub video_placeholder: String,

  // Providers
  pub youtube_embed_base: String,
  /// Contains a literal `{id}` slot.
  pub youtube_thumbnail_format: String,
  pub figma_embed_base: String,

  // Share intents
  pub site_url: String,
  pub twitter_intent: String,
  pub linkedin_intent: String,

  // Viewer
  pub seek_step_secs: f64,
  pub error_ttl_secs: u64,

  // About page
  pub about_title: String,
  pub about_text: Vec<String>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails the first test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
