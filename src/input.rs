use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::App;
use crate::constants::constants;
use crate::route::Route;
use crate::share;
use crate::viewer;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

fn open_url(app: &mut App, url: &str) {
  if let Err(e) = share::open_in_browser(url) {
    app.set_error(format!("{:#}", e));
  }
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

  if ctrl && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('o') {
    if let Some(url) = app.open_entry().map(|e| e.url.clone()) {
      open_url(app, &url);
    }
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('k') && !app.viewer.is_open() {
    app.open_search();
    return Ok(());
  }

  if app.viewer.is_open() {
    return handle_viewer_key(app, key).await.context("Failed to handle viewer key event");
  }

  if app.search.active {
    return handle_search_key(app, key).await.context("Failed to handle search key event");
  }

  match app.route {
    Route::Home => handle_home_key(app, key).await.context("Failed to handle home key event")?,
    Route::Category(_) => handle_category_key(app, key).await.context("Failed to handle category key event")?,
    Route::About => handle_about_key(app, key).await?,
  }
  Ok(())
}

async fn handle_viewer_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if let Some(action) = viewer::key_action(&app.viewer, key.code, app.open_kind()) {
    return app.dispatch(action).await;
  }
  let step = constants().seek_step_secs;
  match key.code {
    KeyCode::Char('[') => app.seek_by(-step).await?,
    KeyCode::Char(']') => app.seek_by(step).await?,
    KeyCode::Char('y') => app.copy_open_link(),
    KeyCode::Char('t') => {
      if let Some(url) = app.open_entry().map(share::twitter_url) {
        open_url(app, &url);
      }
    }
    KeyCode::Char('l') => {
      if let Some(url) = app.open_entry().map(share::linkedin_url) {
        open_url(app, &url);
      }
    }
    _ => {}
  }
  Ok(())
}

async fn handle_search_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Enter => {
      app.activate_search_hit().await?;
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.search.input, app.search.cursor);
      app.search.input.insert(byte_idx, c);
      app.search.cursor += 1;
      app.on_search_input();
    }
    KeyCode::Backspace => {
      if app.search.cursor > 0 {
        app.search.cursor -= 1;
        let byte_idx = char_to_byte_index(&app.search.input, app.search.cursor);
        app.search.input.remove(byte_idx);
        app.on_search_input();
      }
    }
    KeyCode::Delete => {
      if app.search.cursor < app.search.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.search.input, app.search.cursor);
        app.search.input.remove(byte_idx);
        app.on_search_input();
      }
    }
    KeyCode::Left => {
      app.search.cursor = app.search.cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.search.cursor < app.search.input.chars().count() {
        app.search.cursor += 1;
      }
    }
    KeyCode::Home => {
      app.search.cursor = 0;
    }
    KeyCode::End => {
      app.search.cursor = app.search.input.chars().count();
    }
    KeyCode::Down => app.move_search_selection(true),
    KeyCode::Up => app.move_search_selection(false),
    KeyCode::Esc => {
      if !app.search.input.is_empty() {
        app.search.input.clear();
        app.search.cursor = 0;
        app.search.scroll = 0;
        app.on_search_input();
      } else {
        app.close_search();
      }
    }
    _ => {}
  }
  Ok(())
}

async fn handle_home_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Enter => app.activate_selected().await?,
    KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => app.move_selection(true),
    KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => app.move_selection(false),
    KeyCode::Char('/') => app.open_search(),
    KeyCode::Char('a') => app.navigate(Route::About).await?,
    KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
  Ok(())
}

async fn handle_category_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.activate_selected().await?,
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(true),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(false),
    KeyCode::Char('c') => app.cycle_company(),
    KeyCode::Char('y') => app.cycle_year(),
    KeyCode::Char('s') => app.cycle_sort(),
    KeyCode::Char('r') => app.reset_filters(),
    KeyCode::Char('/') => app.open_search(),
    KeyCode::Esc | KeyCode::Backspace => app.navigate(Route::Home).await?,
    _ => {}
  }
  Ok(())
}

async fn handle_about_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Char('/') => app.open_search(),
    KeyCode::Esc | KeyCode::Backspace => app.navigate(Route::Home).await?,
    _ => {}
  }
  Ok(())
}
