use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Neon",
    bg: Color::Rgb(10, 8, 14),
    fg: Color::Rgb(236, 232, 244),
    accent: Color::Rgb(232, 72, 200),
    muted: Color::Rgb(128, 120, 146),
    border: Color::Rgb(72, 52, 88),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(110, 28, 96),
    stripe_bg: Color::Rgb(18, 14, 24),
    status: Color::Rgb(120, 220, 232),
    error: Color::Rgb(248, 88, 88),
    key_fg: Color::Rgb(10, 8, 14),
    key_bg: Color::Rgb(200, 96, 184),
  },
  Theme {
    name: "Ember",
    bg: Color::Rgb(20, 12, 10),
    fg: Color::Rgb(244, 230, 220),
    accent: Color::Rgb(248, 120, 56),
    muted: Color::Rgb(150, 124, 110),
    border: Color::Rgb(96, 56, 40),
    highlight_fg: Color::Rgb(20, 12, 10),
    highlight_bg: Color::Rgb(248, 150, 90),
    stripe_bg: Color::Rgb(30, 18, 14),
    status: Color::Rgb(250, 204, 96),
    error: Color::Rgb(255, 84, 84),
    key_fg: Color::Rgb(20, 12, 10),
    key_bg: Color::Rgb(220, 120, 70),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(246, 243, 236),
    fg: Color::Rgb(40, 36, 32),
    accent: Color::Rgb(150, 40, 120),
    muted: Color::Rgb(130, 122, 112),
    border: Color::Rgb(200, 190, 176),
    highlight_fg: Color::Rgb(246, 243, 236),
    highlight_bg: Color::Rgb(150, 40, 120),
    stripe_bg: Color::Rgb(236, 232, 222),
    status: Color::Rgb(30, 110, 130),
    error: Color::Rgb(190, 30, 30),
    key_fg: Color::Rgb(246, 243, 236),
    key_bg: Color::Rgb(110, 100, 90),
  },
];

/// Tile colour for a category colour token. Unknown tokens fall back to grey.
pub fn token_color(token: &str) -> Color {
  match token {
    "red" => Color::Rgb(239, 68, 68),
    "fuchsia" => Color::Rgb(217, 70, 239),
    "orange" => Color::Rgb(249, 115, 22),
    "purple" => Color::Rgb(168, 85, 247),
    "amber" => Color::Rgb(251, 191, 36),
    "emerald" => Color::Rgb(16, 185, 129),
    "rose" => Color::Rgb(244, 63, 94),
    "blue" => Color::Rgb(59, 130, 246),
    "violet" => Color::Rgb(139, 92, 246),
    _ => Color::Rgb(120, 120, 120),
  }
}

/// Single-glyph icon for a category icon token.
pub fn token_icon(token: &str) -> &'static str {
  match token {
    "brain" => "✺",
    "palette" => "✎",
    "music" => "♫",
    "sparkles" => "✦",
    "layout" => "▦",
    "box" => "◆",
    "camera" => "◉",
    "code" => "⌘",
    "video" => "▶",
    _ => "•",
  }
}

pub fn theme_index(name: &str) -> usize {
  THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(name)).unwrap_or(0)
}
