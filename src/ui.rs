use image::imageops::FilterType;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::catalogue::{CategoryDescriptor, MediaKind};
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::{ThumbnailWidget, rows_per_cell};
use crate::media::{Playable, is_placeholder, thumbnail_url};
use crate::query::Facet;
use crate::route::{Resolved, Route};
use crate::theme::{Theme, token_color, token_icon};
use crate::viewer::ViewerState;

const TILE_WIDTH: u16 = 24;
const TILE_HEIGHT: u16 = 5;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// `m:ss`, with anything non-finite or negative shown as `0:00`.
pub fn format_time(seconds: f64) -> String {
  if !seconds.is_finite() || seconds < 0.0 {
    return "0:00".to_string();
  }
  let total = seconds.floor() as u64;
  format!("{}:{:02}", total / 60, total % 60)
}

fn progress_bar(ratio: f64, width: usize) -> String {
  let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
  format!("{}{}", "━".repeat(filled), "─".repeat(width - filled))
}

fn rounded(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);

  if app.viewer.is_open() {
    render_viewer(frame, app, main_area);
  } else if app.search.active {
    render_search(frame, app, main_area);
  }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(vec![
    Span::styled(" ◆ folio ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(app.route.path(), Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  match app.route {
    Route::Home => render_home(frame, app, area),
    Route::About => render_about(frame, app.theme(), area),
    Route::Category(_) => {
      let descriptor = match app.resolved() {
        Resolved::Category { element, .. } => Some(element.clone()),
        _ => None,
      };
      match descriptor {
        Some(element) => render_category(frame, app, &element, area),
        None => render_not_found(frame, app.theme(), &app.route.path(), area),
      }
    }
  }
}

// --- Home ---

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = rounded(theme)
    .title(" Portfolio ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let categories = app.catalogue.list_categories();
  if categories.is_empty() {
    let empty = Paragraph::new("Nothing here yet").alignment(Alignment::Center).style(Style::default().fg(theme.muted));
    frame.render_widget(empty, inner);
    return;
  }

  let cols = (inner.width / TILE_WIDTH).max(1) as usize;
  let visible_rows = (inner.height / TILE_HEIGHT).max(1) as usize;
  let selected = app.list_state.selected().unwrap_or(0);
  let first_row = (selected / cols).saturating_sub(visible_rows - 1);

  for (i, element) in categories.iter().enumerate().skip(first_row * cols).take(visible_rows * cols) {
    let slot = i - first_row * cols;
    let tile = Rect {
      x: inner.x + (slot % cols) as u16 * TILE_WIDTH,
      y: inner.y + (slot / cols) as u16 * TILE_HEIGHT,
      width: TILE_WIDTH.min(inner.width),
      height: TILE_HEIGHT.min(inner.height),
    };
    render_tile(frame, theme, element, i == selected, tile.intersection(inner));
  }
}

fn render_tile(frame: &mut Frame, theme: &Theme, element: &CategoryDescriptor, selected: bool, area: Rect) {
  let color = token_color(&element.color);
  let inner_w = area.width.saturating_sub(2) as usize;
  let (border, bg) = if selected { (color, theme.highlight_bg) } else { (theme.border, theme.bg) };
  let block = Block::bordered()
    .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
    .border_style(Style::default().fg(border))
    .style(Style::default().bg(bg));

  let lines = vec![
    Line::from(vec![
      Span::styled(element.symbol.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
      Span::raw(" "),
      Span::styled(token_icon(&element.icon), Style::default().fg(color)),
    ]),
    Line::from(Span::styled(truncate_str(&element.title, inner_w), Style::default().fg(theme.fg))),
    Line::from(Span::styled(truncate_str(&element.subtitle, inner_w), Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

// --- Category ---

fn render_category(frame: &mut Frame, app: &mut App, element: &CategoryDescriptor, area: Rect) {
  let theme = app.theme();
  let color = token_color(&element.color);
  let [title_area, filter_area, list_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)]).areas(area);

  let title = Line::from(vec![
    Span::styled(format!(" {} ", element.symbol), Style::default().fg(theme.bg).bg(color).add_modifier(Modifier::BOLD)),
    Span::styled(format!(" {} ", element.title), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    Span::styled(element.subtitle.clone(), Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(title, title_area);

  let total = app.current_entries().len();
  let view = app.current_view();
  let shown = view.len();
  let inner_w = list_area.width.saturating_sub(4) as usize;

  let company = match &app.params.company {
    Facet::All => "All".to_string(),
    Facet::Only(c) => c.clone(),
  };
  let year = match app.params.year {
    Facet::All => "All".to_string(),
    Facet::Only(y) => y.to_string(),
  };
  let filter_style = |active: bool| Style::default().fg(if active { theme.accent } else { theme.fg });
  let filters = Line::from(vec![
    Span::styled(" Company ", Style::default().fg(theme.muted)),
    Span::styled(company, filter_style(app.params.company != Facet::All)),
    Span::styled("  Year ", Style::default().fg(theme.muted)),
    Span::styled(year, filter_style(app.params.year != Facet::All)),
    Span::styled("  Sort ", Style::default().fg(theme.muted)),
    Span::styled(app.params.sort.label(), Style::default().fg(theme.fg)),
    Span::styled(format!("  ({} of {})", shown, total), Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(filters, filter_area);

  let block = rounded(theme);
  if view.is_empty() {
    let msg =
      if total > 0 && app.params.is_filtered() { "No items match the selected filters" } else { "Nothing here yet" };
    let empty = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(msg, Style::default().fg(theme.muted)))])
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(empty, list_area);
    return;
  }

  let items: Vec<ListItem> = view
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let right = format!("{}  {}  {}", entry.kind.label(), entry.company, entry.year);
      let right_w = right.chars().count();
      let title = truncate_str(&entry.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);
      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(theme.fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, list_area, &mut app.list_state);
}

// --- Static pages ---

fn render_about(frame: &mut Frame, theme: &Theme, area: Rect) {
  let c = constants();
  let mut text = vec![
    Line::from(""),
    Line::from(Span::styled(c.about_title.as_str(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
  ];
  text.extend(c.about_text.iter().map(|l| Line::from(Span::styled(l.as_str(), Style::default().fg(theme.fg)))));
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(rounded(theme));
  frame.render_widget(paragraph, area);
}

fn render_not_found(frame: &mut Frame, theme: &Theme, path: &str, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("Category not found", Style::default().fg(theme.error).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(format!("Nothing lives at {}", path), Style::default().fg(theme.muted))),
    Line::from(Span::styled("Press Esc to return home.", Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(rounded(theme)), area);
}

// --- Search overlay ---

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let max = constants().search_max_results as u16;
  let popup = centered(area, area.width.saturating_mul(3) / 5, max + 5);
  frame.render_widget(Clear, popup);

  let [input_area, results_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(2)]).areas(popup);

  let input_block = rounded(theme)
    .title(" Search ")
    .title_style(Style::default().fg(theme.accent))
    .border_style(Style::default().fg(theme.accent))
    .padding(Padding::horizontal(1));

  let inner_w = input_area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.search.input, app.search.cursor);
  if cursor_col < app.search.scroll {
    app.search.scroll = cursor_col;
  } else if cursor_col >= app.search.scroll + inner_w {
    app.search.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }
  let scroll = app.search.scroll;

  let visible: String = app
    .search
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();
  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block), input_area);
  frame.set_cursor_position((input_area.x + 2 + (cursor_col - scroll) as u16, input_area.y + 1));

  let results_block = rounded(theme).style(Style::default().bg(theme.bg));
  let result_w = results_area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = app
    .search_results()
    .iter()
    .map(|hit| {
      let category = hit.category_title.to_string();
      let title = truncate_str(&hit.entry.title, result_w.saturating_sub(category.chars().count() + 2));
      let gap = result_w.saturating_sub(title.chars().count() + category.chars().count());
      ListItem::new(Line::from(vec![
        Span::styled(title, Style::default().fg(theme.fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(category, Style::default().fg(theme.muted)),
      ]))
    })
    .collect();

  if items.is_empty() {
    let hint = if app.search.input.trim().chars().count() < constants().search_min_chars {
      format!("Type at least {} characters", constants().search_min_chars)
    } else {
      "No results".to_string()
    };
    let paragraph = Paragraph::new(Span::styled(hint, Style::default().fg(theme.muted)))
      .alignment(Alignment::Center)
      .block(results_block);
    frame.render_widget(paragraph, results_area);
    return;
  }

  let list = List::new(items)
    .block(results_block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, results_area, &mut app.search.list_state);
}

// --- Viewer overlay ---

fn render_viewer(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(entry) = app.open_entry().cloned() else { return };
  let (index, len) = match &app.viewer {
    ViewerState::Open(open) => (open.index, open.sequence.len()),
    ViewerState::Closed => return,
  };

  frame.render_widget(Clear, area);
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), area);

  let [mut thumb_area, info_area] =
    Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(area);
  thumb_area = Rect { y: thumb_area.y + 1, height: thumb_area.height.saturating_sub(2), ..thumb_area };

  render_viewer_thumbnail(frame, app, &entry.kind, thumb_area);

  let info_title = Line::from(vec![
    Span::styled(format!(" {}/{} ", index + 1, len), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(format!("[{}] ", entry.kind.label().to_lowercase()), Style::default().fg(theme.muted)),
  ]);
  let info_block = rounded(theme).title(info_title).padding(Padding::horizontal(1));
  let inner_w = info_area.width.saturating_sub(4) as usize;

  let label = |name: &'static str| Span::styled(name, Style::default().fg(theme.muted));
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(
      truncate_str(&entry.title, inner_w),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(entry.description.clone(), Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(vec![label("Company   "), Span::styled(entry.company.clone(), Style::default().fg(theme.fg))]),
    Line::from(vec![label("Year      "), Span::styled(entry.year.to_string(), Style::default().fg(theme.fg))]),
    Line::from(""),
  ];

  let Some(playable) = app.playable.clone() else { return };
  let mode = match playable {
    Playable::Embed(_) => "Embed",
    Playable::Native(_) => "Native",
    Playable::Passthrough(_) => "Unrecognised link",
  };
  lines.push(Line::from(label(mode)));
  let url_color = if playable.is_passthrough() { theme.error } else { theme.accent };
  lines.push(Line::from(Span::styled(
    truncate_str(playable.url(), inner_w),
    Style::default().fg(url_color).add_modifier(Modifier::UNDERLINED),
  )));

  if entry.kind == MediaKind::Audio {
    let playback = app.viewer.playback();
    let icon = if playback.is_playing { "⏸" } else { "▶" };
    let times = format!("{} / {}", format_time(playback.current_time), format_time(playback.duration));
    let bar_w = inner_w.saturating_sub(times.chars().count() + 4);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
      Span::styled(format!("{} ", icon), Style::default().fg(theme.accent)),
      Span::styled(progress_bar(playback.progress(), bar_w), Style::default().fg(theme.status)),
      Span::styled(format!(" {}", times), Style::default().fg(theme.muted)),
    ]));
  }

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(info_block), info_area);
}

fn render_viewer_thumbnail(frame: &mut Frame, app: &mut App, kind: &MediaKind, area: Rect) {
  let theme = app.theme();
  let display_mode = app.display_mode;

  if let (Some(key), Some(image)) = (&app.thumb.key, &app.thumb.image) {
    let needs_resize = match &app.thumb.resized {
      Some((k, w, h, _)) => k != key || *w != area.width || *h != area.height,
      None => true,
    };
    if needs_resize {
      let target_w = area.width as u32;
      let target_h = match display_mode {
        DisplayMode::Direct => area.height as u32 * rows_per_cell(display_mode),
        DisplayMode::Ascii => area.height as u32,
      };
      let resized = image.resize(target_w.max(1), target_h.max(1), FilterType::Lanczos3);
      app.thumb.resized = Some((key.clone(), area.width, area.height, resized));
    }
    if let Some((_, _, _, ref resized)) = app.thumb.resized {
      frame.render_widget(ThumbnailWidget { image: resized, display_mode }, area);
    }
    return;
  }

  let thumb = app.open_entry().map(thumbnail_url).unwrap_or_default();
  let status = if app.thumb.rx.is_some() {
    "loading…"
  } else if is_placeholder(&thumb) {
    "no preview"
  } else {
    "preview unavailable"
  };
  let text = vec![
    Line::from(""),
    Line::from(Span::styled(format!("[ {} ]", kind.label()), Style::default().fg(theme.accent))),
    Line::from(Span::styled(status, Style::default().fg(theme.muted))),
    Line::from(Span::styled(thumb, Style::default().fg(theme.muted))),
  ];
  frame.render_widget(
    Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(rounded(theme)),
    area,
  );
}

// --- Status & footer ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(notice) = &app.notice {
    (format!(" ✓ {}", notice), Style::default().fg(theme.status))
  } else if app.player.is_loaded() {
    let playback = app.viewer.playback();
    let state = if playback.is_playing { "Playing" } else { "Paused" };
    let name = app.player.source.as_deref().and_then(|s| s.rsplit('/').next()).unwrap_or_default();
    (
      format!(" ♪ {} {} / {}  {}", state, format_time(playback.current_time), format_time(playback.duration), name),
      Style::default().fg(theme.status),
    )
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  if app.viewer.is_open() {
    let mut k = vec![("←/→", "Prev/Next")];
    if app.open_kind() == Some(MediaKind::Audio) {
      let label = if app.viewer.playback().is_playing { "Pause" } else { "Play" };
      k.push(("Space", label));
      k.push(("[/]", "Seek"));
    }
    k.extend([("^o", "Open"), ("y", "Copy link"), ("t/l", "Share"), ("Esc", "Close")]);
    return k;
  }
  if app.search.active {
    return vec![("Enter", "Go"), ("↑/↓", "Select"), ("Esc", "Close")];
  }
  match app.route {
    Route::Home => {
      vec![("Enter", "Open"), ("←/→", "Move"), ("/", "Search"), ("a", "About"), ("^t", "Theme"), ("Esc", "Quit")]
    }
    Route::Category(_) => {
      let mut k = vec![("Enter", "View"), ("j/k", "Navigate"), ("c", "Company"), ("y", "Year"), ("s", "Sort")];
      if app.params.is_filtered() {
        k.push(("r", "Reset"));
      }
      k.push(("Esc", "Back"));
      k
    }
    Route::About => vec![("/", "Search"), ("^t", "Theme"), ("Esc", "Back")],
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} · {} ", app.display_mode.label(), theme.name);
  let label_w = theme_label.chars().count() as u16;
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(label_w), width: label_w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}
