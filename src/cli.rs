use anyhow::{Result, bail};
use serde::Serialize;

use crate::catalogue::{Catalogue, CategoryDescriptor, PortfolioEntry};
use crate::constants::constants;
use crate::media::{Playable, embed_url, thumbnail_url};
use crate::query::{self, Facet, QueryParams, SortKey};
use crate::route::{Resolved, Route};

/// An entry with its derived URLs, as printed by `show`.
#[derive(Debug, Serialize)]
pub struct EntryView<'a> {
  #[serde(flatten)]
  pub entry: &'a PortfolioEntry,
  pub playable: Playable,
  pub thumbnail_url: String,
}

impl<'a> EntryView<'a> {
  pub fn new(entry: &'a PortfolioEntry) -> Self {
    Self { entry, playable: embed_url(entry), thumbnail_url: thumbnail_url(entry) }
  }
}

#[derive(Debug, Serialize)]
pub struct CategoryView<'a> {
  #[serde(flatten)]
  pub element: &'a CategoryDescriptor,
  pub companies: Vec<String>,
  pub years: Vec<i32>,
  pub sort: SortKey,
  pub total: usize,
  pub entries: Vec<EntryView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum PageView<'a> {
  Home { categories: &'a [CategoryDescriptor] },
  About { title: &'a str, text: &'a [String] },
  Category(CategoryView<'a>),
}

/// Filters passed on the command line.
#[derive(Debug, Default)]
pub struct ShowFilters {
  pub company: Option<String>,
  pub year: Option<i32>,
  pub sort: Option<String>,
}

impl ShowFilters {
  fn into_params(self) -> Result<QueryParams> {
    let sort = match self.sort {
      Some(s) => s.parse::<SortKey>()?,
      None => SortKey::default(),
    };
    Ok(QueryParams {
      company: self.company.map_or(Facet::All, Facet::Only),
      year: self.year.map_or(Facet::All, Facet::Only),
      sort,
      search: String::new(),
    })
  }
}

pub fn search_json(catalogue: &Catalogue, text: &str) -> Result<String> {
  let hits = query::search(catalogue, text);
  Ok(serde_json::to_string_pretty(&hits)?)
}

/// Resolve a route and render it as JSON. A missing category is an error.
pub fn show_json(catalogue: &Catalogue, route: &str, filters: ShowFilters) -> Result<String> {
  let params = filters.into_params()?;
  let page = match catalogue.resolve(&Route::parse(route)) {
    Resolved::Home => PageView::Home { categories: catalogue.list_categories() },
    Resolved::About => PageView::About { title: &constants().about_title, text: &constants().about_text },
    Resolved::Category { element, entries } => PageView::Category(CategoryView {
      element,
      companies: query::distinct_companies(entries),
      years: query::distinct_years(entries),
      sort: params.sort,
      total: entries.len(),
      entries: query::compute_view(entries, &params).into_iter().map(EntryView::new).collect(),
    }),
    Resolved::NotFound(key) => bail!("Category not found: {}", key),
  };
  Ok(serde_json::to_string_pretty(&page)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Value;

  fn catalogue() -> Catalogue {
    Catalogue::bundled().unwrap()
  }

  #[test]
  fn search_prints_hits_with_category() {
    let out: Value = serde_json::from_str(&search_json(&catalogue(), "logo").unwrap()).unwrap();
    let hits = out.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["entry"]["id"], "mo-2");
    assert_eq!(hits[0]["category_title"], "Motion Graphics");
    assert_eq!(hits[0]["category_route"], "/motion");
  }

  #[test]
  fn short_search_prints_empty_list() {
    assert_eq!(search_json(&catalogue(), "a").unwrap(), "[]");
  }

  #[test]
  fn show_category_applies_filters() {
    let filters = ShowFilters { year: Some(2022), sort: Some("date-asc".to_string()), ..Default::default() };
    let out: Value = serde_json::from_str(&show_json(&catalogue(), "/photography", filters).unwrap()).unwrap();
    assert_eq!(out["page"], "category");
    assert_eq!(out["symbol"], "Ph");
    assert_eq!(out["total"], 3);
    assert_eq!(out["sort"], "date-asc");
    assert_eq!(out["years"], serde_json::json!([2023, 2022, 2021]));
    let entries = out["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "ph-2");
  }

  #[test]
  fn show_youtube_entry_includes_embed() {
    let out: Value = serde_json::from_str(&show_json(&catalogue(), "/video", ShowFilters::default()).unwrap()).unwrap();
    let first = &out["entries"][0];
    assert_eq!(first["id"], "vi-1");
    assert_eq!(first["playable"]["mode"], "embed");
    assert_eq!(first["playable"]["url"], "https://www.youtube.com/embed/dQw4w9WgXcQ");
    assert_eq!(first["thumbnail_url"], "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg");
  }

  #[test]
  fn show_unknown_category_fails() {
    let err = show_json(&catalogue(), "/cooking", ShowFilters::default()).unwrap_err();
    assert!(err.to_string().contains("Category not found"));
  }

  #[test]
  fn show_rejects_unknown_sort() {
    let filters = ShowFilters { sort: Some("newest".to_string()), ..Default::default() };
    assert!(show_json(&catalogue(), "/video", filters).is_err());
  }

  #[test]
  fn show_home_lists_categories() {
    let out: Value = serde_json::from_str(&show_json(&catalogue(), "/", ShowFilters::default()).unwrap()).unwrap();
    assert_eq!(out["page"], "home");
    assert_eq!(out["categories"].as_array().unwrap().len(), 9);
  }
}
