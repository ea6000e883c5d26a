//! Audible notifications for finished timers and loop cycles

use std::{
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Mutex,
};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// What a notifier is asked to signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A non-loop timer reached zero
    Finished { label: String },
    /// A loop timer reached zero and restarted
    CycleCompleted { label: String },
}

impl Notice {
    pub fn label(&self) -> &str {
        match self {
            Notice::Finished { label } | Notice::CycleCompleted { label } => label,
        }
    }
}

/// Fire-and-forget notification sink. Implementations must never panic or
/// block the caller.
pub trait Notify: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Plays a sound file through an external player, falling back to the
/// terminal bell
#[derive(Debug, Clone)]
pub struct SoundNotifier {
    player: String,
    sound: PathBuf,
    muted: bool,
}

impl SoundNotifier {
    pub fn new(player: impl Into<String>, sound: impl Into<PathBuf>, muted: bool) -> Self {
        Self {
            player: player.into(),
            sound: sound.into(),
            muted,
        }
    }
}

impl Notify for SoundNotifier {
    fn notify(&self, notice: Notice) {
        let what = match notice {
            Notice::Finished { .. } => "finished",
            Notice::CycleCompleted { .. } => "completed a cycle",
        };
        info!("Timer \"{}\" {}", notice.label(), what);

        if self.muted {
            debug!("Sound muted, skipping playback");
            return;
        }

        let player = self.player.clone();
        let sound = self.sound.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = play_sound(&player, &sound).await {
                        warn!("Failed to play notification sound: {}, ringing bell instead", e);
                        ring_bell();
                    }
                });
            }
            Err(_) => {
                debug!("No async runtime available, ringing bell");
                ring_bell();
            }
        }
    }
}

/// Run the player on the sound file and wait for it to exit
pub async fn play_sound(player: &str, sound: &Path) -> Result<(), String> {
    if !sound.exists() {
        return Err(format!("Sound file {} not found", sound.display()));
    }

    debug!("Playing {} with {}", sound.display(), player);
    let status = Command::new(player)
        .arg(sound)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", player, e))?;

    if !status.success() {
        return Err(format!("{} exited with {}", player, status));
    }
    Ok(())
}

/// Write BEL to stdout. Failures are only logged.
pub fn ring_bell() {
    let mut stdout = std::io::stdout();
    if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
        warn!("Failed to ring terminal bell: {}", e);
    }
}

/// Notifier that records every notice, for tests and headless runs
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
