use anyhow::{Result, anyhow};
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::catalogue::{Catalogue, PortfolioEntry};
use crate::constants::constants;

// --- Parameters ---

/// A filter slot: either everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Facet<T> {
  #[default]
  All,
  Only(T),
}

impl<T: PartialEq + Clone> Facet<T> {
  pub fn accepts(&self, value: &T) -> bool {
    match self {
      Facet::All => true,
      Facet::Only(v) => v == value,
    }
  }

  /// Step to the next option: All -> first -> ... -> last -> All.
  pub fn cycle(&self, options: &[T]) -> Self {
    let next = match self {
      Facet::All => 0,
      Facet::Only(v) => match options.iter().position(|o| o == v) {
        Some(i) => i + 1,
        None => 0,
      },
    };
    options.get(next).cloned().map_or(Facet::All, Facet::Only)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
  #[default]
  DateDesc,
  DateAsc,
  CompanyAsc,
  CompanyDesc,
}

impl SortKey {
  pub const ALL: [SortKey; 4] = [SortKey::DateDesc, SortKey::DateAsc, SortKey::CompanyAsc, SortKey::CompanyDesc];

  pub fn key(self) -> &'static str {
    match self {
      SortKey::DateDesc => "date-desc",
      SortKey::DateAsc => "date-asc",
      SortKey::CompanyAsc => "company-asc",
      SortKey::CompanyDesc => "company-desc",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SortKey::DateDesc => "Newest first",
      SortKey::DateAsc => "Oldest first",
      SortKey::CompanyAsc => "Company (A-Z)",
      SortKey::CompanyDesc => "Company (Z-A)",
    }
  }

  pub fn next(self) -> Self {
    let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }

  pub fn from_config(s: &str) -> Self {
    s.parse().unwrap_or_default()
  }
}

impl FromStr for SortKey {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .iter()
      .copied()
      .find(|k| k.key().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| anyhow!("Unknown sort key '{}' (expected date-desc, date-asc, company-asc or company-desc)", s))
  }
}

/// Per-view query state. Not persisted; reset whenever the route changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
  pub company: Facet<String>,
  pub year: Facet<i32>,
  pub sort: SortKey,
  pub search: String,
}

impl QueryParams {
  pub fn with_sort(sort: SortKey) -> Self {
    Self { sort, ..Self::default() }
  }

  pub fn is_filtered(&self) -> bool {
    self.company != Facet::All || self.year != Facet::All
  }

  /// Drop company/year filters, keeping the sort order.
  pub fn reset_filters(&mut self) {
    self.company = Facet::All;
    self.year = Facet::All;
  }
}

// --- Category view ---

/// Base letters only: decomposed, combining marks dropped, case-folded.
fn primary_key(s: &str) -> impl Iterator<Item = char> + '_ {
  s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase)
}

/// Locale-style string ordering in three levels, as collators do: base letters,
/// then accents, then case with lowercase first. Raw bytes break any remaining tie.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
  primary_key(a)
    .cmp(primary_key(b))
    .then_with(|| a.nfd().flat_map(char::to_lowercase).cmp(b.nfd().flat_map(char::to_lowercase)))
    .then_with(|| a.chars().map(char::is_uppercase).cmp(b.chars().map(char::is_uppercase)))
    .then_with(|| a.cmp(b))
}

/// Filter a category's entries by company and year, then sort them.
/// The sort is stable, so ties keep their filtered order.
pub fn compute_view<'a>(entries: &'a [PortfolioEntry], params: &QueryParams) -> Vec<&'a PortfolioEntry> {
  let mut view: Vec<&PortfolioEntry> =
    entries.iter().filter(|e| params.company.accepts(&e.company) && params.year.accepts(&e.year)).collect();

  match params.sort {
    SortKey::DateDesc => view.sort_by(|a, b| b.year.cmp(&a.year)),
    SortKey::DateAsc => view.sort_by(|a, b| a.year.cmp(&b.year)),
    SortKey::CompanyAsc => view.sort_by(|a, b| locale_cmp(&a.company, &b.company)),
    SortKey::CompanyDesc => view.sort_by(|a, b| locale_cmp(&b.company, &a.company)),
  }
  view
}

/// Company filter options, derived from the unfiltered entry list.
pub fn distinct_companies(entries: &[PortfolioEntry]) -> Vec<String> {
  let mut companies: Vec<String> = entries.iter().map(|e| e.company.clone()).collect();
  companies.sort_by(|a, b| locale_cmp(a, b));
  companies.dedup();
  companies
}

/// Year filter options, newest first.
pub fn distinct_years(entries: &[PortfolioEntry]) -> Vec<i32> {
  let mut years: Vec<i32> = entries.iter().map(|e| e.year).collect();
  years.sort_unstable_by(|a, b| b.cmp(a));
  years.dedup();
  years
}

// --- Global search ---

/// A search match with the display title of the category it lives in.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
  pub entry: &'a PortfolioEntry,
  pub category_title: &'a str,
  pub category_route: String,
}

/// Case-insensitive substring match over title, description, company and category title.
pub fn matches_search(entry: &PortfolioEntry, category_title: &str, needle: &str) -> bool {
  entry.title.to_lowercase().contains(needle)
    || entry.description.to_lowercase().contains(needle)
    || entry.company.to_lowercase().contains(needle)
    || category_title.to_lowercase().contains(needle)
}

/// Search the whole catalogue. The text is matched as typed, surrounding spaces
/// included; queries shorter than the minimum or made only of whitespace return
/// nothing. Results are capped and come back in traversal order, not ranked.
pub fn search<'a>(catalogue: &'a Catalogue, text: &str) -> Vec<SearchHit<'a>> {
  if text.trim().is_empty() || text.chars().count() < constants().search_min_chars {
    return Vec::new();
  }
  let needle = text.to_lowercase();

  catalogue
    .traversal_keys()
    .into_iter()
    .flat_map(|key| {
      let title = catalogue.category_title(key);
      catalogue.entries(key).iter().map(move |entry| (key, title, entry))
    })
    .filter(|(_, title, entry)| matches_search(entry, title, &needle))
    .take(constants().search_max_results)
    .map(|(key, title, entry)| SearchHit { entry, category_title: title, category_route: format!("/{}", key) })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalogue::MediaKind;
  use crate::catalogue::tests::{make_element, make_entry};
  use indexmap::IndexMap;

  fn entry(id: &str, company: &str, year: i32) -> PortfolioEntry {
    make_entry(id, MediaKind::Image, "https://x/a.jpg", "cat", company, year)
  }

  fn ids(view: &[&PortfolioEntry]) -> Vec<String> {
    view.iter().map(|e| e.id.clone()).collect()
  }

  #[test]
  fn unfiltered_view_keeps_every_entry() {
    let entries = vec![entry("a", "Zed", 2019), entry("b", "Acme", 2021), entry("c", "Mid", 2020)];
    for sort in SortKey::ALL {
      let view = compute_view(&entries, &QueryParams::with_sort(sort));
      let mut got = ids(&view);
      got.sort();
      assert_eq!(got, ["a", "b", "c"], "sort {:?}", sort);
    }
    let view = compute_view(&entries, &QueryParams::default());
    assert_eq!(ids(&view), ["b", "c", "a"]);
  }

  #[test]
  fn year_filter_keeps_relative_order() {
    let entries = vec![entry("first", "A", 2019), entry("mid", "B", 2018), entry("last", "C", 2019)];
    let params = QueryParams { year: Facet::Only(2019), sort: SortKey::DateAsc, ..QueryParams::default() };
    assert_eq!(ids(&compute_view(&entries, &params)), ["first", "last"]);
  }

  #[test]
  fn company_filter_is_exact() {
    let entries = vec![entry("a", "Acme", 2019), entry("b", "Acme Corp", 2018), entry("c", "acme", 2017)];
    let params = QueryParams { company: Facet::Only("Acme".to_string()), ..QueryParams::default() };
    assert_eq!(ids(&compute_view(&entries, &params)), ["a"]);
  }

  #[test]
  fn date_sorts_reverse_each_other_without_ties() {
    let entries = vec![entry("a", "A", 2015), entry("b", "B", 2021), entry("c", "C", 2018)];
    let desc = ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::DateDesc)));
    let mut asc = ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::DateAsc)));
    asc.reverse();
    assert_eq!(desc, asc);
  }

  #[test]
  fn date_sorts_are_stable_on_ties() {
    let entries = vec![entry("x", "A", 2020), entry("old", "B", 2010), entry("y", "C", 2020)];
    assert_eq!(ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::DateDesc))), ["x", "y", "old"]);
    assert_eq!(ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::DateAsc))), ["old", "x", "y"]);
  }

  #[test]
  fn company_sorts_ignore_case_and_are_stable() {
    let entries =
      vec![entry("1", "beta", 2020), entry("2", "Alpha", 2020), entry("3", "beta", 2019), entry("4", "Gamma", 2018)];
    assert_eq!(ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::CompanyAsc))), ["2", "1", "3", "4"]);
    assert_eq!(ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::CompanyDesc))), ["4", "1", "3", "2"]);
  }

  #[test]
  fn company_sort_places_accented_names_with_their_base_letter() {
    let entries = vec![entry("1", "Zed", 2020), entry("2", "Élan", 2020), entry("3", "Acme", 2020)];
    assert_eq!(ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::CompanyAsc))), ["3", "2", "1"]);
    assert_eq!(ids(&compute_view(&entries, &QueryParams::with_sort(SortKey::CompanyDesc))), ["1", "2", "3"]);
  }

  #[test]
  fn collation_levels() {
    assert_eq!(locale_cmp("Élan", "Elan"), Ordering::Greater);
    assert_eq!(locale_cmp("Élan", "Elbe"), Ordering::Less);
    assert_eq!(locale_cmp("acme", "Acme"), Ordering::Less);
    assert_eq!(locale_cmp("Acme", "acme co"), Ordering::Less);
    assert_eq!(locale_cmp("Ärzte", "Arzt"), Ordering::Greater);
  }

  #[test]
  fn facets_come_from_unfiltered_entries() {
    let entries =
      vec![entry("a", "Zed", 2019), entry("b", "Acme", 2021), entry("c", "Zed", 2019), entry("d", "Élan", 2019)];
    assert_eq!(distinct_companies(&entries), ["Acme", "Élan", "Zed"]);
    assert_eq!(distinct_years(&entries), [2021, 2019]);
  }

  #[test]
  fn facet_cycle_wraps_through_all() {
    let years = [2021, 2019];
    let mut facet = Facet::All;
    facet = facet.cycle(&years);
    assert_eq!(facet, Facet::Only(2021));
    facet = facet.cycle(&years);
    assert_eq!(facet, Facet::Only(2019));
    facet = facet.cycle(&years);
    assert_eq!(facet, Facet::All);
    assert_eq!(Facet::Only(1999).cycle(&years), Facet::Only(2021));
    assert_eq!(Facet::<i32>::All.cycle(&[]), Facet::All);
  }

  #[test]
  fn sort_key_parse_and_cycle() {
    assert_eq!("date-asc".parse::<SortKey>().unwrap(), SortKey::DateAsc);
    assert_eq!("Company-Desc".parse::<SortKey>().unwrap(), SortKey::CompanyDesc);
    assert!("newest".parse::<SortKey>().is_err());
    assert_eq!(SortKey::from_config("bogus"), SortKey::DateDesc);
    assert_eq!(SortKey::CompanyDesc.next(), SortKey::DateDesc);
  }

  #[test]
  fn reset_filters_keeps_sort() {
    let mut params = QueryParams {
      company: Facet::Only("Acme".to_string()),
      year: Facet::Only(2020),
      sort: SortKey::CompanyAsc,
      search: String::new(),
    };
    assert!(params.is_filtered());
    params.reset_filters();
    assert!(!params.is_filtered());
    assert_eq!(params.sort, SortKey::CompanyAsc);
  }

  #[test]
  fn short_queries_return_nothing() {
    let catalogue = Catalogue::bundled().unwrap();
    assert!(search(&catalogue, "").is_empty());
    assert!(search(&catalogue, "b").is_empty());
    assert!(search(&catalogue, "   ").is_empty());
  }

  #[test]
  fn spaces_count_toward_the_query() {
    let mut entries = IndexMap::new();
    entries.insert(
      "alpha".to_string(),
      vec![
        make_entry("a-1", MediaKind::Image, "https://x", "alpha", "Plan a Trip", 2020),
        make_entry("a-2", MediaKind::Image, "https://x", "alpha", "Rebrand", 2020),
        make_entry("a-3", MediaKind::Image, "https://x", "alpha", "Brand Works", 2020),
      ],
    );
    let catalogue = Catalogue::new(vec![make_element("Aa", "Alpha", "alpha")], entries);

    let ids = |text: &str| search(&catalogue, text).iter().map(|h| h.entry.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids("a "), ["a-1"]);
    assert_eq!(ids("brand"), ["a-2", "a-3"]);
    assert_eq!(ids("brand "), ["a-3"]);
    assert_eq!(ids(" works"), ["a-3"]);
  }

  #[test]
  fn search_is_case_insensitive() {
    let catalogue = Catalogue::bundled().unwrap();
    let hits = search(&catalogue, "BRAND");
    assert!(hits.iter().any(|h| h.entry.title == "Brand Documentary"));
    assert!(hits.iter().all(|h| matches_search(h.entry, h.category_title, "brand")));
  }

  #[test]
  fn search_matches_category_title() {
    let catalogue = Catalogue::bundled().unwrap();
    let hits = search(&catalogue, "photography");
    let ids: Vec<&str> = hits.iter().map(|h| h.entry.id.as_str()).collect();
    assert_eq!(ids, ["ph-1", "ph-2", "ph-3"]);
    assert!(hits.iter().all(|h| h.category_route == "/photography"));
  }

  #[test]
  fn search_caps_results_in_traversal_order() {
    let alpha: Vec<PortfolioEntry> =
      (0..6).map(|i| make_entry(&format!("a-{i}"), MediaKind::Image, "https://x", "alpha", "Match Co", 2020)).collect();
    let beta: Vec<PortfolioEntry> =
      (0..6).map(|i| make_entry(&format!("b-{i}"), MediaKind::Image, "https://x", "beta", "Match Co", 2020)).collect();
    let mut entries = IndexMap::new();
    entries.insert("alpha".to_string(), alpha);
    entries.insert("beta".to_string(), beta);
    let elements = vec![make_element("Bb", "Beta", "beta"), make_element("Aa", "Alpha", "alpha")];
    let catalogue = Catalogue::new(elements, entries);

    let hits = search(&catalogue, "match");
    let ids: Vec<&str> = hits.iter().map(|h| h.entry.id.as_str()).collect();
    assert_eq!(ids, ["b-0", "b-1", "b-2", "b-3", "b-4", "b-5", "a-0", "a-1"]);
  }

  #[test]
  fn orphaned_entries_are_still_searchable() {
    let mut entries = IndexMap::new();
    let ghost = make_entry("g-1", MediaKind::Image, "https://x", "ghost", "Spooky", 2020);
    entries.insert("ghost".to_string(), vec![ghost]);
    let catalogue = Catalogue::new(vec![make_element("Aa", "Alpha", "alpha")], entries);
    let hits = search(&catalogue, "spooky");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].category_title, "ghost");
  }
}
