//! Notification delivery
//!
//! The timer core only knows the [`Notifier`] trait. The production
//! implementation shows a desktop notification via notify-rust and plays a
//! completion sound through whichever CLI player is installed, probed once
//! at startup in a fixed preference order.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::Settings;

const FREEDESKTOP_SOUND_DIR: &str = "/usr/share/sounds/freedesktop/stereo";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("desktop notification failed: {0}")]
    Desktop(#[from] notify_rust::error::Error),
    #[error("sound playback failed: {0}")]
    Sound(#[from] std::io::Error),
    #[error("no sound backend available")]
    NoSoundBackend,
}

/// Per-delivery options, read from settings at elapsed time. Defaults are
/// substituted for anything the settings store cannot provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOptions {
    pub enable_notification: bool,
    pub enable_sound: bool,
    /// 0-100. Forwarded as-is; the CLI backends do not take a volume flag.
    pub volume: u32,
    pub sound_file: String,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            enable_notification: true,
            enable_sound: true,
            volume: 80,
            sound_file: "bell.oga".to_string(),
        }
    }
}

impl NotifyOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut opts = Self {
            enable_notification: settings.enable_notification,
            enable_sound: settings.enable_sound,
            volume: settings.volume,
            sound_file: settings.default_sound.clone(),
        };
        if opts.sound_file.trim().is_empty() {
            opts.sound_file = Self::default().sound_file;
        }
        opts
    }
}

/// Fire-and-forget notification collaborator.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str, opts: &NotifyOptions) -> Result<(), NotifyError>;
}

/// CLI sound players, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SoundBackend {
    CanberraGtkPlay,
    Paplay,
    GstPlay,
}

impl SoundBackend {
    const ALL: [SoundBackend; 3] = [
        SoundBackend::CanberraGtkPlay,
        SoundBackend::Paplay,
        SoundBackend::GstPlay,
    ];

    fn program(self) -> &'static str {
        match self {
            SoundBackend::CanberraGtkPlay => "canberra-gtk-play",
            SoundBackend::Paplay => "paplay",
            SoundBackend::GstPlay => "gst-play-1.0",
        }
    }

    fn args(self, sound_path: Option<&Path>) -> Vec<String> {
        let path = sound_path.map(|p| p.to_string_lossy().into_owned());
        match (self, path) {
            (SoundBackend::CanberraGtkPlay, Some(p)) => vec!["-f".into(), p],
            (SoundBackend::CanberraGtkPlay, None) => vec!["-i".into(), "bell".into()],
            (SoundBackend::Paplay, Some(p)) => vec![p],
            (SoundBackend::Paplay, None) => vec![],
            (SoundBackend::GstPlay, Some(p)) => vec!["--quiet".into(), p],
            (SoundBackend::GstPlay, None) => vec![],
        }
    }

    fn probe() -> Option<SoundBackend> {
        for backend in SoundBackend::ALL {
            for dir in ["/usr/bin", "/usr/local/bin"] {
                if Path::new(dir).join(backend.program()).exists() {
                    return Some(backend);
                }
            }
        }
        None
    }
}

/// Desktop notifier: notify-rust for the visual part, a probed CLI player
/// for the sound.
pub struct DesktopNotifier {
    base_dir: Option<PathBuf>,
    backend: Option<SoundBackend>,
}

impl DesktopNotifier {
    /// `base_dir` is an optional directory whose `sounds/` subdirectory is
    /// searched for relative sound file names.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        let backend = SoundBackend::probe();
        match backend {
            Some(b) => debug!("sound backend: {}", b.program()),
            None => debug!("no CLI sound backend found"),
        }
        Self { base_dir, backend }
    }

    fn show_desktop(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .appname("yrtimer")
            .summary(title)
            .body(body)
            .show()?;
        Ok(())
    }

    /// Resolve a configured sound name against the known locations:
    /// absolute path, then `<base>/sounds/<name>`, then the freedesktop
    /// stereo directory with bell.oga and dialog-information.oga as
    /// fallbacks.
    fn resolve_sound_path(&self, preferred: &str) -> Option<PathBuf> {
        let preferred = preferred.trim();

        if preferred.starts_with('/') {
            let path = PathBuf::from(preferred);
            if path.exists() {
                return Some(path);
            }
        }

        if !preferred.is_empty() {
            if let Some(base) = &self.base_dir {
                let path = base.join("sounds").join(preferred);
                if path.exists() {
                    return Some(path);
                }
            }
        }

        for candidate in [preferred, "bell.oga", "dialog-information.oga"] {
            if candidate.is_empty() {
                continue;
            }
            let path = Path::new(FREEDESKTOP_SOUND_DIR).join(candidate);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    fn play_sound(&self, sound_file: &str) -> Result<(), NotifyError> {
        let Some(backend) = self.backend else {
            return Err(NotifyError::NoSoundBackend);
        };
        let path = self.resolve_sound_path(sound_file);
        let args = backend.args(path.as_deref());
        Command::new(backend.program())
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str, opts: &NotifyOptions) -> Result<(), NotifyError> {
        let mut first_err = None;

        if opts.enable_notification {
            if let Err(e) = self.show_desktop(title, body) {
                warn!("desktop notification failed: {e}");
                first_err = Some(e);
            }
        }
        if opts.enable_sound {
            if let Err(e) = self.play_sound(&opts.sound_file) {
                warn!("sound playback failed: {e}");
                first_err = first_err.or(Some(e));
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
