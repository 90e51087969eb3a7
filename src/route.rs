use crate::catalogue::{Catalogue, CategoryDescriptor, PortfolioEntry};

/// The three route shapes the app understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Home,
  About,
  Category(String),
}

impl Route {
  /// Parse a path such as `/`, `/about` or `/video`. Trailing slashes and a
  /// query string are ignored; only the first path segment is significant.
  pub fn parse(path: &str) -> Self {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segment = path.trim_matches('/').split('/').next().unwrap_or_default();
    match segment {
      "" => Route::Home,
      "about" => Route::About,
      key => Route::Category(key.to_string()),
    }
  }

  pub fn path(&self) -> String {
    match self {
      Route::Home => "/".to_string(),
      Route::About => "/about".to_string(),
      Route::Category(key) => format!("/{}", key),
    }
  }
}

/// A route matched against the catalogue.
#[derive(Debug, PartialEq)]
pub enum Resolved<'a> {
  Home,
  About,
  /// A known category; `entries` may be empty.
  Category { element: &'a CategoryDescriptor, entries: &'a [PortfolioEntry] },
  /// No descriptor for this key.
  NotFound(String),
}

impl Catalogue {
  pub fn resolve(&self, route: &Route) -> Resolved<'_> {
    match route {
      Route::Home => Resolved::Home,
      Route::About => Resolved::About,
      Route::Category(key) => match self.find_category(key) {
        Some(element) => Resolved::Category { element, entries: self.entries(element.key()) },
        None => Resolved::NotFound(key.clone()),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalogue::tests::make_element;
  use indexmap::IndexMap;

  #[test]
  fn parse_route_shapes() {
    assert_eq!(Route::parse("/"), Route::Home);
    assert_eq!(Route::parse(""), Route::Home);
    assert_eq!(Route::parse("/about"), Route::About);
    assert_eq!(Route::parse("/about/"), Route::About);
    assert_eq!(Route::parse("/video"), Route::Category("video".to_string()));
    assert_eq!(Route::parse("video?ref=home"), Route::Category("video".to_string()));
    assert_eq!(Route::parse("/3d/extra"), Route::Category("3d".to_string()));
  }

  #[test]
  fn path_round_trips() {
    for path in ["/", "/about", "/ui-design"] {
      assert_eq!(Route::parse(path).path(), path);
    }
  }

  #[test]
  fn unknown_category_is_not_found() {
    let catalogue = Catalogue::bundled().unwrap();
    assert_eq!(catalogue.resolve(&Route::parse("/cooking")), Resolved::NotFound("cooking".to_string()));
  }

  #[test]
  fn known_category_resolves_with_entries() {
    let catalogue = Catalogue::bundled().unwrap();
    match catalogue.resolve(&Route::parse("/video")) {
      Resolved::Category { element, entries } => {
        assert_eq!(element.title, "Video Editing");
        assert_eq!(entries.len(), 2);
      }
      other => panic!("expected category, got {:?}", other),
    }
  }

  #[test]
  fn empty_category_is_distinct_from_not_found() {
    let catalogue = Catalogue::new(vec![make_element("Em", "Empty", "empty")], IndexMap::new());
    match catalogue.resolve(&Route::parse("/empty")) {
      Resolved::Category { entries, .. } => assert!(entries.is_empty()),
      other => panic!("expected empty category, got {:?}", other),
    }
  }
}
