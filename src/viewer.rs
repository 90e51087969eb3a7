//! Fullscreen viewer state machine.
//!
//! The viewer is either closed, or open on one entry of an ordered sequence
//! (the view the user activated it from). All transitions go through
//! [`reduce`], which returns the new state plus the side effects the caller
//! must perform: stopping audio, locking background scroll, and so on.

use ratatui::crossterm::event::KeyCode;
use tracing::debug;

use crate::catalogue::MediaKind;

/// Audio playback fields of an open session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Playback {
  pub is_playing: bool,
  pub current_time: f64,
  pub duration: f64,
}

impl Playback {
  /// Fraction of the track played, in `[0, 1]`.
  pub fn progress(&self) -> f64 {
    if self.duration > 0.0 { (self.current_time / self.duration).clamp(0.0, 1.0) } else { 0.0 }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenViewer {
  /// Entry ids of the view the viewer was opened from, in display order.
  pub sequence: Vec<String>,
  /// Always `< sequence.len()`.
  pub index: usize,
  pub playback: Playback,
}

impl OpenViewer {
  pub fn entry_id(&self) -> &str {
    &self.sequence[self.index]
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewerState {
  #[default]
  Closed,
  Open(OpenViewer),
}

impl ViewerState {
  pub fn is_open(&self) -> bool {
    matches!(self, ViewerState::Open(_))
  }

  pub fn open_id(&self) -> Option<&str> {
    match self {
      ViewerState::Open(open) => Some(open.entry_id()),
      ViewerState::Closed => None,
    }
  }

  pub fn playback(&self) -> Playback {
    match self {
      ViewerState::Open(open) => open.playback,
      ViewerState::Closed => Playback::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
  Open { sequence: Vec<String>, index: usize },
  Next,
  Previous,
  Close,
  TogglePlay,
  /// Native player confirmed playback started.
  Played,
  /// Native player confirmed playback paused.
  Paused,
  Ended,
  TimeUpdate(f64),
  MetadataLoaded(f64),
  /// User scrub to an absolute position.
  Seek(f64),
  /// User scrub relative to the current position.
  SeekBy(f64),
}

/// Work the caller must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
  LockScroll,
  UnlockScroll,
  StopAudio,
  PlayAudio,
  PauseAudio,
  SeekAudio(f64),
}

fn finite_or_zero(v: f64) -> f64 {
  if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Apply one action. Pure: no I/O, the returned effects describe it instead.
pub fn reduce(state: ViewerState, action: ViewerAction) -> (ViewerState, Vec<Effect>) {
  match (state, action) {
    (state, ViewerAction::Open { sequence, index }) => {
      if index >= sequence.len() {
        debug!(index, len = sequence.len(), "viewer: ignoring open outside the sequence");
        return (state, Vec::new());
      }
      let effects = if state.is_open() { vec![Effect::StopAudio] } else { vec![Effect::LockScroll] };
      (ViewerState::Open(OpenViewer { sequence, index, playback: Playback::default() }), effects)
    }

    (ViewerState::Closed, _) => (ViewerState::Closed, Vec::new()),

    (ViewerState::Open(_), ViewerAction::Close) => {
      (ViewerState::Closed, vec![Effect::StopAudio, Effect::UnlockScroll])
    }

    (ViewerState::Open(mut open), action @ (ViewerAction::Next | ViewerAction::Previous)) => {
      let len = open.sequence.len();
      if len <= 1 {
        return (ViewerState::Open(open), Vec::new());
      }
      open.index = match action {
        ViewerAction::Next => (open.index + 1) % len,
        _ => (open.index + len - 1) % len,
      };
      open.playback = Playback::default();
      (ViewerState::Open(open), vec![Effect::StopAudio])
    }

    (ViewerState::Open(mut open), ViewerAction::TogglePlay) => {
      let effect = if open.playback.is_playing { Effect::PauseAudio } else { Effect::PlayAudio };
      open.playback.is_playing = !open.playback.is_playing;
      (ViewerState::Open(open), vec![effect])
    }

    (ViewerState::Open(mut open), ViewerAction::Played) => {
      open.playback.is_playing = true;
      (ViewerState::Open(open), Vec::new())
    }

    (ViewerState::Open(mut open), ViewerAction::Paused | ViewerAction::Ended) => {
      open.playback.is_playing = false;
      (ViewerState::Open(open), Vec::new())
    }

    (ViewerState::Open(mut open), ViewerAction::TimeUpdate(t)) => {
      open.playback.current_time = finite_or_zero(t);
      (ViewerState::Open(open), Vec::new())
    }

    (ViewerState::Open(mut open), ViewerAction::MetadataLoaded(d)) => {
      open.playback.duration = finite_or_zero(d);
      (ViewerState::Open(open), Vec::new())
    }

    (ViewerState::Open(open), ViewerAction::SeekBy(delta)) => {
      let target = open.playback.current_time + delta;
      reduce(ViewerState::Open(open), ViewerAction::Seek(target))
    }

    // Duration is unknown until metadata loads; seeking then would rewind to 0.
    (ViewerState::Open(open), ViewerAction::Seek(_)) if open.playback.duration <= 0.0 => {
      (ViewerState::Open(open), Vec::new())
    }
    (ViewerState::Open(mut open), ViewerAction::Seek(t)) => {
      let t = finite_or_zero(t).min(open.playback.duration);
      open.playback.current_time = t;
      (ViewerState::Open(open), vec![Effect::SeekAudio(t)])
    }
  }
}

/// Map a key press to a viewer action. Only meaningful while open; Space is
/// claimed only when the open entry is audio.
pub fn key_action(state: &ViewerState, code: KeyCode, open_kind: Option<MediaKind>) -> Option<ViewerAction> {
  if !state.is_open() {
    return None;
  }
  match code {
    KeyCode::Esc => Some(ViewerAction::Close),
    KeyCode::Left => Some(ViewerAction::Previous),
    KeyCode::Right => Some(ViewerAction::Next),
    KeyCode::Char(' ') if open_kind == Some(MediaKind::Audio) => Some(ViewerAction::TogglePlay),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn seq(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("e-{}", i)).collect()
  }

  fn open(n: usize, index: usize) -> ViewerState {
    reduce(ViewerState::Closed, ViewerAction::Open { sequence: seq(n), index }).0
  }

  fn index_of(state: &ViewerState) -> usize {
    match state {
      ViewerState::Open(open) => open.index,
      ViewerState::Closed => panic!("viewer is closed"),
    }
  }

  fn playing(state: ViewerState) -> ViewerState {
    let state = reduce(state, ViewerAction::MetadataLoaded(180.0)).0;
    let state = reduce(state, ViewerAction::TogglePlay).0;
    reduce(state, ViewerAction::TimeUpdate(42.5)).0
  }

  #[test]
  fn open_locks_scroll() {
    let (state, effects) = reduce(ViewerState::Closed, ViewerAction::Open { sequence: seq(3), index: 1 });
    assert_eq!(state.open_id(), Some("e-1"));
    assert_eq!(effects, [Effect::LockScroll]);
    assert_eq!(state.playback(), Playback::default());
  }

  #[test]
  fn open_outside_sequence_is_ignored() {
    let (state, effects) = reduce(ViewerState::Closed, ViewerAction::Open { sequence: seq(2), index: 2 });
    assert_eq!(state, ViewerState::Closed);
    assert!(effects.is_empty());
    let (state, _) = reduce(ViewerState::Closed, ViewerAction::Open { sequence: Vec::new(), index: 0 });
    assert!(!state.is_open());
  }

  #[test]
  fn next_wraps_from_last_to_first() {
    let (state, effects) = reduce(open(3, 2), ViewerAction::Next);
    assert_eq!(index_of(&state), 0);
    assert_eq!(effects, [Effect::StopAudio]);
  }

  #[test]
  fn previous_wraps_from_first_to_last() {
    let (state, _) = reduce(open(3, 0), ViewerAction::Previous);
    assert_eq!(index_of(&state), 2);
  }

  #[test]
  fn single_entry_navigation_is_noop() {
    for action in [ViewerAction::Next, ViewerAction::Previous] {
      let before = playing(open(1, 0));
      let (after, effects) = reduce(before.clone(), action);
      assert_eq!(after, before);
      assert!(effects.is_empty());
    }
  }

  #[test]
  fn navigation_resets_playback() {
    let state = playing(open(2, 0));
    assert!(state.playback().is_playing);
    let (state, _) = reduce(state, ViewerAction::Next);
    assert_eq!(state.playback(), Playback::default());
  }

  #[test]
  fn close_resets_everything() {
    let (state, effects) = reduce(playing(open(4, 3)), ViewerAction::Close);
    assert_eq!(state, ViewerState::Closed);
    assert_eq!(state.playback(), Playback { is_playing: false, current_time: 0.0, duration: 0.0 });
    assert_eq!(effects, [Effect::StopAudio, Effect::UnlockScroll]);
  }

  #[test]
  fn actions_while_closed_do_nothing() {
    for action in [ViewerAction::Close, ViewerAction::Next, ViewerAction::TogglePlay, ViewerAction::Seek(3.0)] {
      let (state, effects) = reduce(ViewerState::Closed, action);
      assert_eq!(state, ViewerState::Closed);
      assert!(effects.is_empty());
    }
  }

  #[test]
  fn reopen_replaces_session_and_stops_audio() {
    let (state, effects) = reduce(playing(open(2, 0)), ViewerAction::Open { sequence: seq(5), index: 4 });
    assert_eq!(state.open_id(), Some("e-4"));
    assert_eq!(state.playback(), Playback::default());
    assert_eq!(effects, [Effect::StopAudio]);
  }

  #[test]
  fn toggle_play_alternates() {
    let (state, effects) = reduce(open(1, 0), ViewerAction::TogglePlay);
    assert!(state.playback().is_playing);
    assert_eq!(effects, [Effect::PlayAudio]);
    let (state, effects) = reduce(state, ViewerAction::TogglePlay);
    assert!(!state.playback().is_playing);
    assert_eq!(effects, [Effect::PauseAudio]);
  }

  #[test]
  fn native_events_update_playback() {
    let state = reduce(open(1, 0), ViewerAction::Played).0;
    assert!(state.playback().is_playing);
    let state = reduce(state, ViewerAction::MetadataLoaded(f64::NAN)).0;
    assert_eq!(state.playback().duration, 0.0);
    let state = reduce(state, ViewerAction::MetadataLoaded(200.0)).0;
    let state = reduce(state, ViewerAction::TimeUpdate(50.0)).0;
    assert_eq!(state.playback().progress(), 0.25);
    let state = reduce(state, ViewerAction::Ended).0;
    assert!(!state.playback().is_playing);
    assert_eq!(state.playback().current_time, 50.0);
  }

  #[test]
  fn seek_is_clamped_to_duration() {
    let state = reduce(open(1, 0), ViewerAction::MetadataLoaded(100.0)).0;
    let (state, effects) = reduce(state, ViewerAction::Seek(250.0));
    assert_eq!(state.playback().current_time, 100.0);
    assert_eq!(effects, [Effect::SeekAudio(100.0)]);
    let (state, _) = reduce(state, ViewerAction::Seek(-3.0));
    assert_eq!(state.playback().current_time, 0.0);
    let (state, _) = reduce(state, ViewerAction::SeekBy(5.0));
    assert_eq!(state.playback().current_time, 5.0);
    let (state, _) = reduce(state, ViewerAction::SeekBy(-10.0));
    assert_eq!(state.playback().current_time, 0.0);
  }

  #[test]
  fn seek_before_metadata_is_ignored() {
    let state = reduce(open(1, 0), ViewerAction::TogglePlay).0;
    let state = reduce(state, ViewerAction::TimeUpdate(12.0)).0;
    let (state, effects) = reduce(state, ViewerAction::SeekBy(5.0));
    assert!(effects.is_empty());
    assert_eq!(state.playback().current_time, 12.0);
    let (state, effects) = reduce(state, ViewerAction::Seek(30.0));
    assert!(effects.is_empty());
    assert_eq!(state.playback().current_time, 12.0);

    let state = reduce(state, ViewerAction::MetadataLoaded(60.0)).0;
    let (_, effects) = reduce(state, ViewerAction::SeekBy(5.0));
    assert_eq!(effects, [Effect::SeekAudio(17.0)]);
  }

  #[test]
  fn keys_map_only_while_open() {
    assert_eq!(key_action(&ViewerState::Closed, KeyCode::Esc, None), None);
    let state = open(3, 1);
    assert_eq!(key_action(&state, KeyCode::Esc, Some(MediaKind::Image)), Some(ViewerAction::Close));
    assert_eq!(key_action(&state, KeyCode::Left, Some(MediaKind::Image)), Some(ViewerAction::Previous));
    assert_eq!(key_action(&state, KeyCode::Right, Some(MediaKind::Image)), Some(ViewerAction::Next));
  }

  #[test]
  fn space_toggles_only_for_audio() {
    let state = open(2, 0);
    assert_eq!(key_action(&state, KeyCode::Char(' '), Some(MediaKind::Audio)), Some(ViewerAction::TogglePlay));
    assert_eq!(key_action(&state, KeyCode::Char(' '), Some(MediaKind::Youtube)), None);
    assert_eq!(key_action(&state, KeyCode::Char(' '), None), None);
  }
}
