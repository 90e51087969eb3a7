use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// The portfolio shipped with the binary.
const BUNDLED_CATALOGUE: &str = include_str!("../data/catalogue.ron");

/// The five media kinds an entry can carry. Each one gets its own embed,
/// thumbnail and playback treatment, so every `match` on it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
  Image,
  Video,
  Youtube,
  Figma,
  Audio,
}

impl MediaKind {
  pub fn label(self) -> &'static str {
    match self {
      MediaKind::Image => "image",
      MediaKind::Video => "video",
      MediaKind::Youtube => "youtube",
      MediaKind::Figma => "figma",
      MediaKind::Audio => "audio",
    }
  }
}

/// A single piece of work in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
  pub id: String,
  pub title: String,
  pub description: String,
  pub kind: MediaKind,
  pub url: String,
  /// Required in practice for audio and local video; everything else can derive one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
  pub category: String,
  pub company: String,
  pub year: i32,
}

impl PortfolioEntry {
  /// Site-local paths (served from the asset root) start with `/`.
  pub fn is_local(&self) -> bool {
    self.url.starts_with('/')
  }
}

/// A skill category ("element") shown as a tile on the home grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDescriptor {
  pub symbol: String,
  pub title: String,
  pub subtitle: String,
  pub color: String,
  pub icon: String,
  pub route: String,
}

impl CategoryDescriptor {
  /// Catalogue key: the route without its leading slash.
  pub fn key(&self) -> &str {
    self.route.trim_start_matches('/')
  }
}

/// Problems found while checking a loaded catalogue. None of them stop the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueIssue {
  /// Entry stored under a key that differs from its own `category`.
  MisfiledEntry { id: String, key: String, category: String },
  /// Key with no descriptor; its entries are only reachable through search.
  OrphanKey(String),
  DuplicateId(String),
  DuplicateSymbol(String),
  DuplicateRoute(String),
}

/// Immutable keyed table of portfolio entries plus the category descriptors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawCatalogue")]
pub struct Catalogue {
  pub elements: Vec<CategoryDescriptor>,
  pub entries: IndexMap<String, Vec<PortfolioEntry>>,
  /// Entry id -> (key position in `entries`, position in that key's list). First occurrence wins.
  ids: IndexMap<String, (usize, usize)>,
}

#[derive(Deserialize)]
struct RawCatalogue {
  elements: Vec<CategoryDescriptor>,
  entries: IndexMap<String, Vec<PortfolioEntry>>,
}

impl From<RawCatalogue> for Catalogue {
  fn from(raw: RawCatalogue) -> Self {
    Catalogue::new(raw.elements, raw.entries)
  }
}

impl Catalogue {
  pub fn new(elements: Vec<CategoryDescriptor>, entries: IndexMap<String, Vec<PortfolioEntry>>) -> Self {
    let mut ids = IndexMap::new();
    for (k, list) in entries.values().enumerate() {
      for (i, entry) in list.iter().enumerate() {
        ids.entry(entry.id.clone()).or_insert((k, i));
      }
    }
    Self { elements, entries, ids }
  }

  pub fn from_ron_str(source: &str) -> Result<Self> {
    ron::from_str(source).context("Failed to parse catalogue RON")
  }

  pub fn bundled() -> Result<Self> {
    Self::from_ron_str(BUNDLED_CATALOGUE).context("Bundled catalogue is invalid")
  }

  /// Load the catalogue from `path`, or the bundled one when no path is given.
  /// Validation issues are logged, not returned.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let catalogue = match path {
      Some(path) => {
        let source =
          std::fs::read_to_string(path).with_context(|| format!("Failed to read catalogue {}", path.display()))?;
        Self::from_ron_str(&source).with_context(|| format!("Invalid catalogue {}", path.display()))?
      }
      None => Self::bundled()?,
    };

    for issue in catalogue.validate() {
      match issue {
        CatalogueIssue::MisfiledEntry { id, key, category } => {
          warn!(id = %id, key = %key, category = %category, "catalogue: entry filed under a different category")
        }
        CatalogueIssue::OrphanKey(key) => warn!(key = %key, "catalogue: category key has no descriptor"),
        CatalogueIssue::DuplicateId(id) => warn!(id = %id, "catalogue: duplicate entry id"),
        CatalogueIssue::DuplicateSymbol(s) => warn!(symbol = %s, "catalogue: duplicate descriptor symbol"),
        CatalogueIssue::DuplicateRoute(r) => warn!(route = %r, "catalogue: duplicate descriptor route"),
      }
    }
    info!(
      categories = catalogue.elements.len(),
      entries = catalogue.entries.values().map(Vec::len).sum::<usize>(),
      "catalogue loaded"
    );
    Ok(catalogue)
  }

  pub fn list_categories(&self) -> &[CategoryDescriptor] {
    &self.elements
  }

  /// Entries for a category key, in insertion order. Unknown keys yield an empty slice.
  pub fn entries(&self, key: &str) -> &[PortfolioEntry] {
    self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Find a descriptor by route. Accepts both `/video` and `video`.
  pub fn find_category(&self, route: &str) -> Option<&CategoryDescriptor> {
    let key = route.trim_start_matches('/');
    self.elements.iter().find(|el| el.key() == key)
  }

  pub fn entry(&self, id: &str) -> Option<&PortfolioEntry> {
    let &(k, i) = self.ids.get(id)?;
    self.entries.get_index(k).and_then(|(_, list)| list.get(i))
  }

  /// Display title for a key: the descriptor title, or the raw key for orphans.
  pub fn category_title<'a>(&'a self, key: &'a str) -> &'a str {
    self.find_category(key).map_or(key, |el| el.title.as_str())
  }

  /// Category keys in search traversal order: descriptor order first, then
  /// orphan keys in insertion order.
  pub fn traversal_keys(&self) -> Vec<&str> {
    let mut keys: Vec<&str> = self.elements.iter().map(CategoryDescriptor::key).collect();
    for key in self.entries.keys() {
      if !keys.contains(&key.as_str()) {
        keys.push(key);
      }
    }
    keys
  }

  pub fn validate(&self) -> Vec<CatalogueIssue> {
    let mut issues = Vec::new();

    let mut symbols = HashSet::new();
    let mut routes = HashSet::new();
    for el in &self.elements {
      if !symbols.insert(el.symbol.as_str()) {
        issues.push(CatalogueIssue::DuplicateSymbol(el.symbol.clone()));
      }
      if !routes.insert(el.route.as_str()) {
        issues.push(CatalogueIssue::DuplicateRoute(el.route.clone()));
      }
    }

    let mut ids = HashSet::new();
    for (key, entries) in &self.entries {
      if self.find_category(key).is_none() {
        issues.push(CatalogueIssue::OrphanKey(key.clone()));
      }
      for entry in entries {
        if entry.category != *key {
          issues.push(CatalogueIssue::MisfiledEntry {
            id: entry.id.clone(),
            key: key.clone(),
            category: entry.category.clone(),
          });
        }
        if !ids.insert(entry.id.as_str()) {
          issues.push(CatalogueIssue::DuplicateId(entry.id.clone()));
        }
      }
    }
    issues
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn make_entry(
    id: &str,
    kind: MediaKind,
    url: &str,
    category: &str,
    company: &str,
    year: i32,
  ) -> PortfolioEntry {
    PortfolioEntry {
      id: id.to_string(),
      title: format!("Title {}", id),
      description: format!("Description {}", id),
      kind,
      url: url.to_string(),
      thumbnail: None,
      category: category.to_string(),
      company: company.to_string(),
      year,
    }
  }

  pub(crate) fn make_element(symbol: &str, title: &str, key: &str) -> CategoryDescriptor {
    CategoryDescriptor {
      symbol: symbol.to_string(),
      title: title.to_string(),
      subtitle: String::new(),
      color: "red".to_string(),
      icon: "box".to_string(),
      route: format!("/{}", key),
    }
  }

  #[test]
  fn bundled_catalogue_parses_and_is_clean() {
    let catalogue = Catalogue::bundled().unwrap();
    assert_eq!(catalogue.list_categories().len(), 9);
    assert!(catalogue.validate().is_empty());
  }

  #[test]
  fn bundled_catalogue_keeps_insertion_order() {
    let catalogue = Catalogue::bundled().unwrap();
    let keys: Vec<&str> = catalogue.entries.keys().map(String::as_str).collect();
    assert_eq!(keys[0], "creative-tech");
    assert_eq!(keys[1], "video");
    let ids: Vec<&str> = catalogue.entries("photography").iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["ph-1", "ph-2", "ph-3"]);
  }

  #[test]
  fn entries_unknown_key_is_empty() {
    let catalogue = Catalogue::bundled().unwrap();
    assert!(catalogue.entries("nope").is_empty());
  }

  #[test]
  fn find_category_accepts_route_or_key() {
    let catalogue = Catalogue::bundled().unwrap();
    assert_eq!(catalogue.find_category("/video").map(|el| el.symbol.as_str()), Some("Vi"));
    assert_eq!(catalogue.find_category("video").map(|el| el.symbol.as_str()), Some("Vi"));
    assert!(catalogue.find_category("/about").is_none());
  }

  #[test]
  fn entry_lookup_by_id() {
    let catalogue = Catalogue::bundled().unwrap();
    assert_eq!(catalogue.entry("ui-2").map(|e| e.kind), Some(MediaKind::Figma));
    assert_eq!(catalogue.entry("ph-3").map(|e| e.title.as_str()), Some("Nature Photography"));
    for entry in catalogue.entries.values().flatten() {
      assert_eq!(catalogue.entry(&entry.id), Some(entry));
    }
    assert!(catalogue.entry("missing").is_none());
  }

  #[test]
  fn validate_reports_orphans_misfiles_and_duplicates() {
    let mut entries = IndexMap::new();
    entries.insert(
      "alpha".to_string(),
      vec![
        make_entry("a-1", MediaKind::Image, "https://x/a.jpg", "alpha", "Acme", 2020),
        make_entry("a-1", MediaKind::Image, "https://x/b.jpg", "beta", "Acme", 2020),
      ],
    );
    let ghost = make_entry("g-1", MediaKind::Image, "https://x/g.jpg", "ghost", "Acme", 2020);
    entries.insert("ghost".to_string(), vec![ghost]);
    let catalogue =
      Catalogue::new(vec![make_element("Aa", "Alpha", "alpha"), make_element("Aa", "Beta", "alpha")], entries);

    let issues = catalogue.validate();
    assert!(issues.contains(&CatalogueIssue::DuplicateSymbol("Aa".to_string())));
    assert!(issues.contains(&CatalogueIssue::DuplicateRoute("/alpha".to_string())));
    assert!(issues.contains(&CatalogueIssue::DuplicateId("a-1".to_string())));
    assert!(issues.contains(&CatalogueIssue::OrphanKey("ghost".to_string())));
    assert!(issues.contains(&CatalogueIssue::MisfiledEntry {
      id: "a-1".to_string(),
      key: "alpha".to_string(),
      category: "beta".to_string(),
    }));
    // Duplicate ids resolve to the first occurrence.
    assert_eq!(catalogue.entry("a-1").map(|e| e.url.as_str()), Some("https://x/a.jpg"));
    assert_eq!(catalogue.entry("g-1").map(|e| e.category.as_str()), Some("ghost"));
  }

  #[test]
  fn traversal_puts_orphans_last() {
    let mut entries = IndexMap::new();
    entries.insert("ghost".to_string(), Vec::new());
    entries.insert("alpha".to_string(), Vec::new());
    let elements = vec![make_element("Bb", "Beta", "beta"), make_element("Aa", "Alpha", "alpha")];
    let catalogue = Catalogue::new(elements, entries);
    assert_eq!(catalogue.traversal_keys(), ["beta", "alpha", "ghost"]);
    assert_eq!(catalogue.category_title("ghost"), "ghost");
    assert_eq!(catalogue.category_title("alpha"), "Alpha");
  }

  #[test]
  fn from_ron_str_rejects_garbage() {
    assert!(Catalogue::from_ron_str("(elements: [").is_err());
  }
}
