use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::{
  io::AsyncBufReadExt,
  io::BufReader as TokioBufReader,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info};

use crate::viewer::ViewerAction;

/// Marker so status lines can be told apart from anything else mpv prints.
const STATUS_TAG: &str = "FOLIO";

/// One parsed mpv status line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MpvStatus {
  pub time: Option<f64>,
  pub duration: Option<f64>,
  pub paused: bool,
}

/// Parse a line printed through `--term-status-msg=FOLIO ${=time-pos} ${=duration} ${pause}`.
/// Properties mpv does not know yet come through empty or as `(unavailable)`.
pub fn parse_status(line: &str) -> Option<MpvStatus> {
  let rest = line.trim().strip_prefix(STATUS_TAG)?;
  let parts: Vec<&str> = rest.split_whitespace().collect();
  let num = |s: Option<&&str>| s.and_then(|s| s.parse::<f64>().ok()).filter(|v| v.is_finite());
  let paused = match parts.last() {
    Some(&"yes") => true,
    Some(&"no") => false,
    _ => return None,
  };
  let (time, duration) = match parts.len() {
    3 => (num(parts.first()), num(parts.get(1))),
    2 => (num(parts.first()), None),
    _ => (None, None),
  };
  Some(MpvStatus { time, duration, paused })
}

/// Audio playback for `audio` entries, backed by an `mpv` child process.
///
/// mpv reports progress on stdout; pause and seek go through its JSON IPC socket.
pub struct AudioPlayer {
  current_process: Option<TokioChild>,
  monitor_handle: Option<JoinHandle<()>>,
  status_rx: Option<mpsc::Receiver<String>>,
  ipc_socket_path: Option<String>,
  last_status: Option<MpvStatus>,
  /// Source currently loaded, as handed to mpv.
  pub source: Option<String>,
}

impl AudioPlayer {
  pub fn new() -> Self {
    Self {
      current_process: None,
      monitor_handle: None,
      status_rx: None,
      ipc_socket_path: None,
      last_status: None,
      source: None,
    }
  }

  pub fn is_loaded(&self) -> bool {
    self.current_process.is_some()
  }

  /// Spawn mpv on `source` (a file path or URL). Any previous track is stopped first.
  pub async fn play(&mut self, source: &str) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let socket_path = std::env::temp_dir().join(format!("folio-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Stale socket from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args([
      "--no-video",
      "--no-terminal-input",
      &format!("--term-status-msg={} ${{=time-pos}} ${{=duration}} ${{pause}}", STATUS_TAG),
      &format!("--input-ipc-server={}", socket_path_str),
      "--",
      source,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Never piped: an undrained stderr pipe blocks mpv.
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(32);

    let monitor_handle = tokio::spawn(async move {
      let mut lines = TokioBufReader::new(stdout).lines();
      while let Ok(Some(line)) = lines.next_line().await {
        // mpv redraws the status line with carriage returns.
        for part in line.split('\r').filter(|p| !p.trim().is_empty()) {
          if tx.send(part.to_string()).await.is_err() {
            return;
          }
        }
      }
    });

    info!(source = %source, "player: started mpv");
    self.current_process = Some(child);
    self.monitor_handle = Some(monitor_handle);
    self.status_rx = Some(rx);
    self.ipc_socket_path = Some(socket_path_str);
    self.source = Some(source.to_string());
    Ok(())
  }

  async fn send_ipc(&self, command: serde_json::Value) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let mut payload = serde_json::json!({ "command": command }).to_string();
    payload.push('\n');
    let written = stream.try_write(payload.as_bytes()).context("Failed to send command to mpv")?;
    if written < payload.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, payload.len()));
    }
    Ok(())
  }

  pub async fn set_paused(&self, paused: bool) -> Result<()> {
    debug!(paused, "player: set pause");
    self.send_ipc(serde_json::json!(["set_property", "pause", paused])).await
  }

  pub async fn seek(&self, seconds: f64) -> Result<()> {
    debug!(seconds, "player: seek");
    self.send_ipc(serde_json::json!(["set_property", "time-pos", seconds])).await
  }

  /// Drain mpv output and translate it into the native events the viewer reducer
  /// understands: metadata, time updates, play/pause changes and end of track.
  pub fn poll_events(&mut self) -> Vec<ViewerAction> {
    let mut events = Vec::new();

    if let Some(rx) = &mut self.status_rx {
      while let Ok(line) = rx.try_recv() {
        let Some(status) = parse_status(&line) else { continue };
        let previous = self.last_status;
        if let Some(d) = status.duration
          && previous.and_then(|p| p.duration) != Some(d)
        {
          events.push(ViewerAction::MetadataLoaded(d));
        }
        if let Some(t) = status.time {
          events.push(ViewerAction::TimeUpdate(t));
        }
        if previous.map(|p| p.paused) != Some(status.paused) {
          events.push(if status.paused { ViewerAction::Paused } else { ViewerAction::Played });
        }
        self.last_status = Some(status);
      }
    }

    let exited = match self.current_process.as_mut() {
      Some(child) => matches!(child.try_wait(), Ok(Some(_))),
      None => false,
    };
    if exited {
      info!("player: track ended");
      self.current_process = None;
      self.status_rx = None;
      self.last_status = None;
      if let Some(handle) = self.monitor_handle.take() {
        handle.abort();
      }
      if let Some(path) = self.ipc_socket_path.take() {
        let _ = std::fs::remove_file(&path);
      }
      self.source = None;
      events.push(ViewerAction::Ended);
    }

    events
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.status_rx = None;
    self.last_status = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
      info!("player: stopped mpv");
    }
    self.source = None;

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}
