use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a media or thumbnail URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
  Remote(String),
  Local(PathBuf),
}

/// Classify a URL. Site-local paths (`/images/x.jpg`) resolve against `asset_root`;
/// without one they cannot be loaded and yield `None`.
pub fn resolve(url: &str, asset_root: Option<&Path>) -> Option<AssetSource> {
  if url.starts_with("http://") || url.starts_with("https://") {
    return Some(AssetSource::Remote(url.to_string()));
  }
  let relative = url.strip_prefix('/')?;
  asset_root.map(|root| AssetSource::Local(root.join(relative)))
}

impl AssetSource {
  /// Argument to hand to an external player.
  pub fn as_player_arg(&self) -> String {
    match self {
      AssetSource::Remote(url) => url.clone(),
      AssetSource::Local(path) => path.display().to_string(),
    }
  }
}

/// Load and decode a thumbnail from the network or the asset root.
pub async fn fetch_thumbnail(client: &Client, source: &AssetSource) -> Result<DynamicImage> {
  match source {
    AssetSource::Remote(url) => {
      debug!(url = %url, "assets: fetching thumbnail");
      let response = client.get(url).send().await.with_context(|| format!("Failed to request {}", url))?;
      if !response.status().is_success() {
        return Err(anyhow!("Thumbnail request for {} returned {}", url, response.status()));
      }
      let bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
      image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image from memory (URL: {})", url))
    }
    AssetSource::Local(path) => {
      let path = path.clone();
      tokio::task::spawn_blocking(move || {
        image::open(&path).with_context(|| format!("Failed to open image {}", path.display()))
      })
      .await
      .context("Thumbnail decode task failed")?
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn remote_urls_stay_remote() {
    assert_eq!(
      resolve("https://img.youtube.com/vi/x/maxresdefault.jpg", None),
      Some(AssetSource::Remote("https://img.youtube.com/vi/x/maxresdefault.jpg".to_string()))
    );
  }

  #[test]
  fn local_paths_need_an_asset_root() {
    assert_eq!(resolve("/audio/mix.mp3", None), None);
    let root = Path::new("/srv/site/public");
    let source = resolve("/audio/mix.mp3", Some(root)).unwrap();
    assert_eq!(source, AssetSource::Local(PathBuf::from("/srv/site/public/audio/mix.mp3")));
    assert_eq!(source.as_player_arg(), "/srv/site/public/audio/mix.mp3");
  }

  #[test]
  fn other_strings_are_unresolvable() {
    assert_eq!(resolve("", Some(Path::new("/srv"))), None);
    assert_eq!(resolve("data:image/png;base64,AAAA", Some(Path::new("/srv"))), None);
  }
}
