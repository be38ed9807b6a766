use std::{
    path::PathBuf,
    process::Stdio,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    process::{Child, Command},
    sync::{Mutex, OnceCell, watch},
    task::JoinHandle,
    time,
};
use uuid::Uuid;

pub const INVALID_VIDEO_ID: &str = "Invalid video ID";
pub const LOAD_FAILED: &str = "Failed to load video";
pub const INIT_FAILED: &str = "Player initialization failed";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Lifecycle of one embedded player instance. Transitions only move forward:
/// `Loading -> Ready | Error`, `Ready -> Error`. `Ready` and `Error` are
/// terminal for the instance; a new video id gets a fresh manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerPhase {
    Loading,
    Ready,
    Error(String),
}

impl PlayerPhase {
    pub fn is_settled(&self) -> bool {
        !matches!(self, PlayerPhase::Loading)
    }
}

#[derive(Debug)]
pub enum LaunchFailure {
    /// The player started but could not load the video.
    Load(String),
    /// The player process could not be spawned at all.
    Init(String),
}

/// Seam to the external playback runtime.
#[async_trait]
pub trait PlayerBackend: Send + Sync + 'static {
    /// Locate the playback runtime. Idempotent; the real backend probes the
    /// binary once per process and reuses the result for every instance.
    async fn acquire(&self) -> std::result::Result<(), String>;

    /// Spawn a player for the video and resolve once playback control is
    /// available.
    async fn open(&self, video_id: &str) -> std::result::Result<PlayerHandle, LaunchFailure>;
}

/// A running player instance. Exclusively owned by one manager and destroyed
/// with it.
pub struct PlayerHandle {
    child: Option<Child>,
    ipc_socket: Option<PathBuf>,
}

impl PlayerHandle {
    /// Handle with no underlying process, for backends that manage playback
    /// elsewhere (tests).
    pub fn detached() -> Self {
        Self {
            child: None,
            ipc_socket: None,
        }
    }

    async fn shutdown(mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        if let Some(socket) = self.ipc_socket.take() {
            let _ = tokio::fs::remove_file(&socket).await;
        }
    }
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Owns the lifecycle of one embedded player instance for one video id.
pub struct PlayerManager {
    phase: watch::Receiver<PlayerPhase>,
    monitor: Option<JoinHandle<()>>,
    handle: Arc<Mutex<Option<PlayerHandle>>>,
}

impl PlayerManager {
    /// Start acquiring a player for `video_id`. A blank id fails immediately
    /// without touching the backend.
    pub fn launch(video_id: &str, backend: Arc<dyn PlayerBackend>) -> Self {
        let (tx, rx) = watch::channel(PlayerPhase::Loading);
        let handle = Arc::new(Mutex::new(None));

        if video_id.trim().is_empty() {
            advance(&tx, PlayerPhase::Error(INVALID_VIDEO_ID.to_string()));
            return Self {
                phase: rx,
                monitor: None,
                handle,
            };
        }

        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let id = video_id.to_string();
        let slot = Arc::clone(&handle);
        let monitor = tokio::spawn(async move {
            let phase = match backend.acquire().await {
                Err(reason) => {
                    tracing::warn!(generation, %reason, "player runtime unavailable");
                    PlayerPhase::Error(LOAD_FAILED.to_string())
                }
                Ok(()) => match backend.open(&id).await {
                    Ok(player) => {
                        *slot.lock().await = Some(player);
                        PlayerPhase::Ready
                    }
                    Err(LaunchFailure::Load(reason)) => {
                        tracing::warn!(generation, %reason, "player could not load video");
                        PlayerPhase::Error(LOAD_FAILED.to_string())
                    }
                    Err(LaunchFailure::Init(reason)) => {
                        tracing::warn!(generation, %reason, "player spawn failed");
                        PlayerPhase::Error(INIT_FAILED.to_string())
                    }
                },
            };
            tracing::debug!(generation, ?phase, "player settled");
            advance(&tx, phase);
        });

        Self {
            phase: rx,
            monitor: Some(monitor),
            handle,
        }
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase.borrow().clone()
    }

    pub fn watch_phase(&self) -> watch::Receiver<PlayerPhase> {
        self.phase.clone()
    }

    /// Wait until the instance leaves `Loading`.
    pub async fn wait_settled(&self) -> PlayerPhase {
        let mut rx = self.phase.clone();
        match rx.wait_for(PlayerPhase::is_settled).await {
            Ok(phase) => phase.clone(),
            // Monitor was torn down before settling; report what we have.
            Err(_) => self.phase(),
        }
    }

    /// Tear the instance down: stop the readiness monitor and destroy the
    /// underlying player. Late monitor completions are discarded with it.
    pub async fn shutdown(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
        if let Some(player) = self.handle.lock().await.take() {
            player.shutdown().await;
        }
    }
}

impl Drop for PlayerManager {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
        // Child processes are spawned with kill_on_drop; releasing the
        // handle here is enough when shutdown() was never awaited.
        if let Ok(mut slot) = self.handle.try_lock() {
            slot.take();
        }
    }
}

/// Apply a phase transition, ignoring anything that would move backwards
/// out of a terminal phase.
fn advance(tx: &watch::Sender<PlayerPhase>, next: PlayerPhase) {
    tx.send_if_modified(|current| {
        let allowed = matches!(current, PlayerPhase::Loading)
            || (matches!(current, PlayerPhase::Ready) && matches!(next, PlayerPhase::Error(_)));
        if allowed {
            *current = next;
        }
        allowed
    });
}

/// Plays videos through a local `mpv` process; readiness is its IPC socket
/// appearing on disk.
pub struct MpvBackend {
    ready_timeout: Duration,
}

impl Default for MpvBackend {
    fn default() -> Self {
        Self {
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

static MPV_PROBE: OnceCell<std::result::Result<(), String>> = OnceCell::const_new();

#[async_trait]
impl PlayerBackend for MpvBackend {
    async fn acquire(&self) -> std::result::Result<(), String> {
        MPV_PROBE
            .get_or_init(|| async {
                let probe = Command::new("mpv")
                    .arg("--version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await;
                match probe {
                    Ok(status) if status.success() => Ok(()),
                    Ok(status) => Err(format!("mpv probe exited with {status}")),
                    Err(e) => Err(format!("mpv not found: {e}")),
                }
            })
            .await
            .clone()
    }

    async fn open(&self, video_id: &str) -> std::result::Result<PlayerHandle, LaunchFailure> {
        let socket =
            std::env::temp_dir().join(format!("vidosik-player-{}.sock", Uuid::new_v4()));
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");

        let mut child = Command::new("mpv")
            .arg("--really-quiet")
            .arg("--force-window=yes")
            .arg(format!("--input-ipc-server={}", socket.display()))
            .arg(&watch_url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LaunchFailure::Init(e.to_string()))?;

        let deadline = time::Instant::now() + self.ready_timeout;
        loop {
            if socket.exists() {
                return Ok(PlayerHandle {
                    child: Some(child),
                    ipc_socket: Some(socket),
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => {
                    return Err(LaunchFailure::Load(format!("player exited early: {status}")));
                }
                Ok(None) => {}
                Err(e) => return Err(LaunchFailure::Load(e.to_string())),
            }
            if time::Instant::now() >= deadline {
                let _ = child.start_kill();
                return Err(LaunchFailure::Load(
                    "timed out waiting for playback".to_string(),
                ));
            }
            time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}
