use anyhow::{Context, Result, anyhow};
use std::process::{Command, Stdio};
use tracing::{info, warn};

use crate::catalogue::PortfolioEntry;
use crate::constants::constants;
use crate::media::encode_component;

/// Public page for an entry: its category route on the site.
pub fn page_url(entry: &PortfolioEntry) -> String {
  format!("{}/{}", constants().site_url.trim_end_matches('/'), entry.category)
}

pub fn share_text(entry: &PortfolioEntry) -> String {
  format!("Check out {} - {}", entry.title, entry.description)
}

pub fn twitter_url(entry: &PortfolioEntry) -> String {
  format!(
    "{}?url={}&text={}",
    constants().twitter_intent,
    encode_component(&page_url(entry)),
    encode_component(&share_text(entry))
  )
}

pub fn linkedin_url(entry: &PortfolioEntry) -> String {
  format!("{}?url={}", constants().linkedin_intent, encode_component(&page_url(entry)))
}

// --- Clipboard ---

pub trait Clipboard {
  fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard via arboard, connected on first use.
#[derive(Default)]
pub struct SystemClipboard {
  inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
  fn set_text(&mut self, text: &str) -> Result<()> {
    if self.inner.is_none() {
      self.inner = Some(arboard::Clipboard::new().context("No clipboard available")?);
    }
    let Some(clipboard) = self.inner.as_mut() else { return Err(anyhow!("No clipboard available")) };
    clipboard.set_text(text.to_string()).context("Failed to write to clipboard")
  }
}

/// Copy the entry's page link. Returns the copied text.
pub fn copy_link(clipboard: &mut dyn Clipboard, entry: &PortfolioEntry) -> Result<String> {
  let link = page_url(entry);
  clipboard.set_text(&link)?;
  info!(url = %link, "share: link copied");
  Ok(link)
}

// --- Browser ---

/// Open a URL with the platform's default handler. A missing opener is reported
/// back so the caller can hide the affordance; it is never fatal.
pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";

  match Command::new(cmd).arg(url).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
    Ok(mut child) => {
      info!(url = %url, "share: opened in browser");
      // Reap in the background so no zombie is left behind.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
      Ok(())
    }
    Err(e) => {
      warn!(err = %e, cmd, "share: no browser opener available");
      Err(anyhow!("Cannot open browser ({}): {}", cmd, e))
    }
  }
}
