use anyhow::Result;
use image::DynamicImage;
use ratatui::widgets::ListState;
use reqwest::Client;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::assets::{self, AssetSource};
use crate::catalogue::{Catalogue, CategoryDescriptor, MediaKind, PortfolioEntry};
use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::media::{Playable, embed_url, thumbnail_url};
use crate::player::AudioPlayer;
use crate::query::{self, QueryParams, SearchHit, SortKey};
use crate::route::{Resolved, Route};
use crate::share::{self, Clipboard, SystemClipboard};
use crate::theme::{THEMES, Theme, theme_index};
use crate::viewer::{self, Effect, ViewerAction, ViewerState};

pub type ThumbResult = (String, Result<DynamicImage>);

/// Global search overlay state.
#[derive(Default)]
pub struct SearchOverlay {
  pub active: bool,
  pub input: String,
  pub cursor: usize,
  pub scroll: usize,
  pub list_state: ListState,
}

/// Thumbnail for the entry open in the viewer.
#[derive(Default)]
pub struct ThumbState {
  /// Thumbnail URL the image (or pending fetch) belongs to.
  pub key: Option<String>,
  pub image: Option<DynamicImage>,
  pub rx: Option<oneshot::Receiver<ThumbResult>>,
  task: Option<JoinHandle<()>>,
  pub resized: Option<(String, u16, u16, DynamicImage)>,
}

pub struct App {
  pub catalogue: Catalogue,
  pub route: Route,
  pub params: QueryParams,
  default_sort: SortKey,
  /// Selection on the home grid or the category list.
  pub list_state: ListState,
  pub search: SearchOverlay,
  pub viewer: ViewerState,
  /// Background list position saved while the viewer is open.
  scroll_lock: Option<ListState>,
  pub player: AudioPlayer,
  pub display_mode: DisplayMode,
  pub asset_root: Option<PathBuf>,
  http_client: Client,
  pub thumb: ThumbState,
  /// Embed/native URL of the open entry, derived once per entry.
  pub playable: Option<Playable>,
  pub clipboard: Box<dyn Clipboard>,
  pub theme_index: usize,
  pub last_error: Option<String>,
  /// Transient confirmation shown in the status line; shares the error timer.
  pub notice: Option<String>,
  error_time: Option<Instant>,
  pub should_quit: bool,
}

impl App {
  pub fn new(catalogue: Catalogue, config: &Config, display_mode: DisplayMode, asset_root: Option<PathBuf>) -> Self {
    let theme_index = config.theme_name.as_deref().map_or(0, theme_index);
    let default_sort = config.default_sort.as_deref().map_or(SortKey::default(), SortKey::from_config);

    let mut list_state = ListState::default();
    list_state.select(Some(0));

    Self {
      catalogue,
      route: Route::Home,
      params: QueryParams::with_sort(default_sort),
      default_sort,
      list_state,
      search: SearchOverlay::default(),
      viewer: ViewerState::Closed,
      scroll_lock: None,
      player: AudioPlayer::new(),
      display_mode,
      asset_root,
      http_client: Client::new(),
      thumb: ThumbState::default(),
      playable: None,
      clipboard: Box::new(SystemClipboard::default()),
      theme_index,
      last_error: None,
      notice: None,
      error_time: None,
      should_quit: false,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  fn save_config(&self) {
    let mut config = Config::load();
    config.theme_name = Some(self.theme().name.to_string());
    config.save();
  }

  pub fn set_error(&mut self, msg: String) {
    self.notice = None;
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn set_notice(&mut self, msg: String) {
    self.last_error = None;
    self.notice = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.notice = None;
    self.error_time = None;
  }

  /// Clear stale error and notice messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_ttl_secs)
    {
      self.clear_error();
    }
  }

  // --- Routing & views ---

  pub fn resolved(&self) -> Resolved<'_> {
    self.catalogue.resolve(&self.route)
  }

  /// Switch route. Any open viewer is closed first and per-view query state resets.
  pub async fn navigate(&mut self, route: Route) -> Result<()> {
    self.dispatch(ViewerAction::Close).await?;
    info!(route = %route.path(), "navigate");
    self.route = route;
    self.params = QueryParams::with_sort(self.default_sort);
    self.list_state = ListState::default();
    if self.item_count() > 0 {
      self.list_state.select(Some(0));
    }
    Ok(())
  }

  /// Category entries after filtering and sorting; empty off category routes.
  pub fn current_view(&self) -> Vec<&PortfolioEntry> {
    match self.resolved() {
      Resolved::Category { entries, .. } => query::compute_view(entries, &self.params),
      _ => Vec::new(),
    }
  }

  pub fn current_entries(&self) -> &[PortfolioEntry] {
    match self.resolved() {
      Resolved::Category { entries, .. } => entries,
      _ => &[],
    }
  }

  pub fn companies(&self) -> Vec<String> {
    query::distinct_companies(self.current_entries())
  }

  pub fn years(&self) -> Vec<i32> {
    query::distinct_years(self.current_entries())
  }

  /// Number of selectable rows on the current screen.
  pub fn item_count(&self) -> usize {
    match self.route {
      Route::Home => self.catalogue.list_categories().len(),
      Route::Category(_) => self.current_view().len(),
      Route::About => 0,
    }
  }

  pub fn selected_category(&self) -> Option<&CategoryDescriptor> {
    self.list_state.selected().and_then(|i| self.catalogue.list_categories().get(i))
  }

  pub fn move_selection(&mut self, forward: bool) {
    if self.viewer.is_open() {
      return;
    }
    let count = self.item_count();
    if count == 0 {
      self.list_state.select(None);
      return;
    }
    let i = match self.list_state.selected() {
      None => 0,
      Some(i) if forward => (i + 1) % count,
      Some(i) => if i == 0 { count - 1 } else { (i - 1).min(count - 1) },
    };
    self.list_state.select(Some(i));
  }

  /// Keep the selection inside the view after filters change.
  fn clamp_selection(&mut self) {
    let count = self.item_count();
    if count == 0 {
      self.list_state.select(None);
    } else {
      let sel = self.list_state.selected().unwrap_or(0);
      self.list_state.select(Some(sel.min(count - 1)));
    }
  }

  pub fn cycle_company(&mut self) {
    let options = self.companies();
    self.params.company = self.params.company.cycle(&options);
    debug!(company = ?self.params.company, "filter: company");
    self.clamp_selection();
  }

  pub fn cycle_year(&mut self) {
    let options = self.years();
    self.params.year = self.params.year.cycle(&options);
    debug!(year = ?self.params.year, "filter: year");
    self.clamp_selection();
  }

  pub fn cycle_sort(&mut self) {
    self.params.sort = self.params.sort.next();
    debug!(sort = self.params.sort.key(), "filter: sort");
  }

  pub fn reset_filters(&mut self) {
    self.params.reset_filters();
    self.clamp_selection();
  }

  /// Enter on the home grid opens the category; on a category list it opens the viewer.
  pub async fn activate_selected(&mut self) -> Result<()> {
    match self.route {
      Route::Home => {
        if let Some(el) = self.selected_category() {
          let route = Route::parse(&el.route);
          self.navigate(route).await?;
        }
      }
      Route::Category(_) => {
        let Some(index) = self.list_state.selected() else { return Ok(()) };
        let sequence: Vec<String> = self.current_view().iter().map(|e| e.id.clone()).collect();
        self.dispatch(ViewerAction::Open { sequence, index }).await?;
      }
      Route::About => {}
    }
    Ok(())
  }

  // --- Search ---

  pub fn open_search(&mut self) {
    self.search.active = true;
    self.search.list_state.select(None);
  }

  pub fn close_search(&mut self) {
    self.search = SearchOverlay::default();
  }

  pub fn search_results(&self) -> Vec<SearchHit<'_>> {
    query::search(&self.catalogue, &self.search.input)
  }

  pub fn on_search_input(&mut self) {
    let count = self.search_results().len();
    self.search.list_state.select(if count > 0 { Some(0) } else { None });
  }

  pub fn move_search_selection(&mut self, forward: bool) {
    let count = self.search_results().len();
    if count == 0 {
      return;
    }
    let i = match self.search.list_state.selected() {
      None => 0,
      Some(i) if forward => (i + 1) % count,
      Some(i) => if i == 0 { count - 1 } else { i - 1 },
    };
    self.search.list_state.select(Some(i));
  }

  /// Jump to the category of the selected hit with the entry highlighted.
  pub async fn activate_search_hit(&mut self) -> Result<()> {
    let Some(selected) = self.search.list_state.selected() else { return Ok(()) };
    let Some((route, id)) =
      self.search_results().get(selected).map(|hit| (hit.category_route.clone(), hit.entry.id.clone()))
    else {
      return Ok(());
    };
    self.close_search();
    self.navigate(Route::parse(&route)).await?;
    if let Some(pos) = self.current_view().iter().position(|e| e.id == id) {
      self.list_state.select(Some(pos));
    }
    Ok(())
  }

  // --- Viewer ---

  pub fn open_entry(&self) -> Option<&PortfolioEntry> {
    self.viewer.open_id().and_then(|id| self.catalogue.entry(id))
  }

  pub fn open_kind(&self) -> Option<MediaKind> {
    self.open_entry().map(|e| e.kind)
  }

  /// Run one viewer transition and carry out its effects.
  pub async fn dispatch(&mut self, action: ViewerAction) -> Result<()> {
    let before = self.viewer.open_id().map(str::to_string);
    let (state, effects) = viewer::reduce(std::mem::take(&mut self.viewer), action);
    self.viewer = state;

    for effect in effects {
      self.apply_effect(effect).await;
    }

    let after = self.viewer.open_id().map(str::to_string);
    if before != after {
      debug!(from = ?before, to = ?after, "viewer: entry changed");
      self.playable = self.open_entry().map(embed_url);
      self.load_open_thumbnail();
    }
    Ok(())
  }

  /// Effects never fail the app: media problems degrade to a status message.
  async fn apply_effect(&mut self, effect: Effect) {
    match effect {
      Effect::LockScroll => {
        self.scroll_lock = Some(self.list_state.clone());
      }
      Effect::UnlockScroll => {
        if let Some(saved) = self.scroll_lock.take() {
          self.list_state = saved;
        }
      }
      Effect::StopAudio => {
        if let Err(e) = self.player.stop().await {
          warn!(err = %e, "viewer: failed to stop audio");
        }
      }
      Effect::PlayAudio => {
        let result =
          if self.player.is_loaded() { self.player.set_paused(false).await } else { self.start_audio().await };
        if let Err(e) = result {
          self.set_error(format!("Playback error: {:#}", e));
          self.viewer = viewer::reduce(std::mem::take(&mut self.viewer), ViewerAction::Paused).0;
        }
      }
      Effect::PauseAudio => {
        if let Err(e) = self.player.set_paused(true).await {
          self.set_error(format!("Pause error: {:#}", e));
        }
      }
      Effect::SeekAudio(t) => {
        if self.player.is_loaded()
          && let Err(e) = self.player.seek(t).await
        {
          warn!(err = %e, "viewer: seek failed");
        }
      }
    }
  }

  async fn start_audio(&mut self) -> Result<()> {
    let Some(entry) = self.open_entry() else { return Ok(()) };
    let url = entry.url.clone();
    let Some(source) = assets::resolve(&url, self.asset_root.as_deref()) else {
      return Err(anyhow::anyhow!("No asset root configured for {}", url));
    };
    self.player.play(&source.as_player_arg()).await
  }

  /// Copy the open entry's page link. A missing clipboard only sets a status error.
  pub fn copy_open_link(&mut self) {
    let Some(entry) = self.open_entry().cloned() else { return };
    match share::copy_link(self.clipboard.as_mut(), &entry) {
      Ok(link) => self.set_notice(format!("Link copied: {}", link)),
      Err(e) => {
        warn!(err = %e, "share: copy failed");
        self.set_error(format!("Clipboard unavailable: {:#}", e));
      }
    }
  }

  /// Seek relative to the current position, audio entries only.
  pub async fn seek_by(&mut self, delta: f64) -> Result<()> {
    if self.open_kind() == Some(MediaKind::Audio) {
      self.dispatch(ViewerAction::SeekBy(delta)).await?;
    }
    Ok(())
  }

  fn load_open_thumbnail(&mut self) {
    if let Some(task) = self.thumb.task.take() {
      task.abort();
    }
    self.thumb = ThumbState::default();
    let Some(entry) = self.open_entry() else { return };
    let url = thumbnail_url(entry);
    if url.is_empty() {
      return;
    }
    let Some(source) = assets::resolve(&url, self.asset_root.as_deref()) else { return };
    self.spawn_thumbnail(url, source);
  }

  fn spawn_thumbnail(&mut self, key: String, source: AssetSource) {
    let client = self.http_client.clone();
    let (tx, rx) = oneshot::channel();
    let task_key = key.clone();
    let task = tokio::spawn(async move {
      let result = assets::fetch_thumbnail(&client, &source).await;
      let _ = tx.send((task_key, result));
    });
    self.thumb.key = Some(key);
    self.thumb.rx = Some(rx);
    self.thumb.task = Some(task);
  }

  // --- Background work ---

  pub async fn check_pending(&mut self) -> Result<()> {
    if let Some(mut rx) = self.thumb.rx.take() {
      match rx.try_recv() {
        Ok((key, result)) => {
          if self.thumb.key.as_deref() == Some(key.as_str()) {
            match result {
              Ok(image) => self.thumb.image = Some(image),
              Err(e) => {
                warn!(err = %e, url = %key, "thumbnail unavailable");
                self.set_error(format!("Thumbnail unavailable: {:#}", e));
              }
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.thumb.rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          warn!("thumbnail task dropped");
        }
      }
    }

    for event in self.player.poll_events() {
      self.dispatch(event).await?;
    }
    Ok(())
  }

  /// Close the viewer (stopping audio) before exit.
  pub async fn shutdown(&mut self) -> Result<()> {
    self.dispatch(ViewerAction::Close).await?;
    self.player.stop().await
  }
}
