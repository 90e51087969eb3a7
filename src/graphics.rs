use image::DynamicImage;
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Thumbnail Widget ---

pub struct ThumbnailWidget<'a> {
  /// Already resized to the target cell grid by the caller.
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_CHARS: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_direct(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
    }
  }
}

/// Pixel rows per terminal cell for a display mode.
pub fn rows_per_cell(mode: DisplayMode) -> u32 {
  match mode {
    DisplayMode::Direct => 2,
    DisplayMode::Ascii => 1,
  }
}

fn cell(area: Rect, offset: u32, i: u32) -> u16 {
  let v = offset.saturating_add(i).min(u16::MAX as u32) as u16;
  area.x.saturating_add(v)
}

fn row(area: Rect, offset: u32, i: u32) -> u16 {
  let v = offset.saturating_add(i).min(u16::MAX as u32) as u16;
  area.y.saturating_add(v)
}

/// One `▀` per cell: foreground is the upper pixel, background the lower one.
fn render_direct(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(area.width as u32);
  let img_h = rgb.height();
  let cell_h = img_h.div_ceil(2);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(cell_h) / 2;

  for y in 0..cell_h.min(area.height as u32) {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let lower_y = y * 2 + 1;
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if lower_y < img_h {
        let lower = rgb.get_pixel(x, lower_y);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      buf.set_string(cell(area, offset_x, x), row(area, offset_y, y), "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

/// Luma ramp, darkest to brightest.
fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(area.width as u32);
  let img_h = luma.height().min(area.height as u32);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(img_h) / 2;

  for y in 0..img_h {
    for x in 0..img_w {
      let ch = ascii_for(luma.get_pixel(x, y)[0]);
      buf.set_string(cell(area, offset_x, x), row(area, offset_y, y), ch, Style::default());
    }
  }
}

fn ascii_for(level: u8) -> &'static str {
  let idx = ((level as f32 / 255.0) * (ASCII_CHARS.len() - 1) as f32).round() as usize;
  ASCII_CHARS[idx.min(ASCII_CHARS.len() - 1)]
}
