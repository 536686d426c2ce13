//! Timer service background loop
//!
//! The timer core is deliberately single-threaded (`Rc`/`RefCell`), so it
//! runs on its own thread under a current-thread runtime and a `LocalSet`.
//! The HTTP layer talks to it through a command channel; every command
//! carries a oneshot reply with the snapshot after the command applied.
//! Snapshots are also published over a watch channel for cheap reads.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::anyhow;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::core::clock::Clock;
use crate::core::repeat::RepeatScheduler;
use crate::core::timer::{Timer, TimerSnapshot};
use crate::core::tokio_clock::TokioClock;
use crate::notify::{DesktopNotifier, Notifier};
use crate::persist;
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("timer service is not available")]
    Unavailable,
}

#[derive(Debug)]
pub enum TimerCommand {
    Start {
        seconds: Option<i64>,
        reply: oneshot::Sender<TimerSnapshot>,
    },
    Pause {
        reply: oneshot::Sender<TimerSnapshot>,
    },
    Reset {
        reply: oneshot::Sender<TimerSnapshot>,
    },
    SetPaused {
        seconds: i64,
        reply: oneshot::Sender<TimerSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to the timer service thread.
#[derive(Debug, Clone)]
pub struct TimerServiceHandle {
    command_tx: mpsc::UnboundedSender<TimerCommand>,
    snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl TimerServiceHandle {
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.snapshot_rx.borrow()
    }

    pub async fn start(&self, seconds: Option<i64>) -> Result<TimerSnapshot, ServiceError> {
        self.send(|reply| TimerCommand::Start { seconds, reply }).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, ServiceError> {
        self.send(|reply| TimerCommand::Pause { reply }).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot, ServiceError> {
        self.send(|reply| TimerCommand::Reset { reply }).await
    }

    pub async fn set_paused(&self, seconds: i64) -> Result<TimerSnapshot, ServiceError> {
        self.send(|reply| TimerCommand::SetPaused { seconds, reply })
            .await
    }

    /// Ask the service to persist its final state and stop.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(TimerCommand::Shutdown { reply: reply_tx })
            .map_err(|_| ServiceError::Unavailable)?;
        reply_rx.await.map_err(|_| ServiceError::Unavailable)
    }

    async fn send(
        &self,
        make: impl FnOnce(oneshot::Sender<TimerSnapshot>) -> TimerCommand,
    ) -> Result<TimerSnapshot, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(make(reply_tx))
            .map_err(|_| ServiceError::Unavailable)?;
        reply_rx.await.map_err(|_| ServiceError::Unavailable)
    }
}

/// Spawn the timer service on its own thread and return the handle.
///
/// `sound_dir` is forwarded to the notifier as the base directory for
/// relative sound file names.
pub fn spawn_timer_service(
    settings: Arc<Settings>,
    state_file: PathBuf,
    sound_dir: Option<PathBuf>,
) -> anyhow::Result<TimerServiceHandle> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(TimerSnapshot::idle());

    std::thread::Builder::new()
        .name("yrtimer-timer".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("failed to build timer runtime: {e}");
                    return;
                }
            };
            // Collaborators are single-threaded, so they are built on the
            // service thread itself.
            let clock: Rc<dyn Clock> = Rc::new(TokioClock::new());
            let notifier: Rc<dyn Notifier> = Rc::new(DesktopNotifier::new(sound_dir));
            let local = tokio::task::LocalSet::new();
            local.block_on(
                &runtime,
                run_timer_loop(settings, state_file, command_rx, snapshot_tx, clock, notifier),
            );
        })
        .map_err(|e| anyhow!("failed to spawn timer thread: {e}"))?;

    Ok(TimerServiceHandle {
        command_tx,
        snapshot_rx,
    })
}

async fn run_timer_loop(
    settings: Arc<Settings>,
    state_file: PathBuf,
    mut command_rx: mpsc::UnboundedReceiver<TimerCommand>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
) {
    info!("starting timer service");

    let timer = Timer::new(Rc::clone(&clock));
    let scheduler = RepeatScheduler::new(Rc::clone(&clock), notifier, Arc::clone(&settings));

    // Publish every change to the watch channel for the HTTP layer.
    timer.on_changed(Box::new(move |snapshot| {
        snapshot_tx
            .send(snapshot)
            .map_err(|_| anyhow!("snapshot channel closed"))
    }));

    // Persist every change so a crash loses at most one second.
    let persist_path = state_file.clone();
    timer.on_changed(Box::new(move |snapshot| {
        persist::save_last_state(&persist_path, snapshot)?;
        Ok(())
    }));

    {
        let scheduler = scheduler.clone();
        timer.on_elapsed(Box::new(move || scheduler.handle_elapsed()));
    }

    // A countdown that was running when we last stopped comes back paused.
    match persist::load_last_state(&state_file) {
        Ok(Some(last)) => {
            if let Some(remaining) = persist::paused_resume(&last) {
                info!(remaining, "restoring previous countdown as paused");
                timer.set_paused(remaining as i64);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("could not load persisted timer state: {e}"),
    }

    while let Some(command) = command_rx.recv().await {
        match command {
            TimerCommand::Start { seconds, reply } => {
                // a fresh countdown cancels any in-flight repeat window
                scheduler.cancel();
                timer.start(seconds);
                let _ = reply.send(timer.snapshot());
            }
            TimerCommand::Pause { reply } => {
                timer.pause();
                let _ = reply.send(timer.snapshot());
            }
            TimerCommand::Reset { reply } => {
                scheduler.cancel();
                timer.reset();
                let _ = reply.send(timer.snapshot());
            }
            TimerCommand::SetPaused { seconds, reply } => {
                timer.set_paused(seconds);
                let _ = reply.send(timer.snapshot());
            }
            TimerCommand::Shutdown { reply } => {
                debug!("timer service shutting down");
                if let Err(e) = persist::save_last_state(&state_file, timer.snapshot()) {
                    warn!("could not persist final timer state: {e}");
                }
                scheduler.cancel();
                let _ = reply.send(());
                break;
            }
        }
    }

    info!("timer service stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timer::TimerState;
    use crate::notify::{NotifyError, NotifyOptions};
    use std::cell::RefCell;
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingNotifier {
        delivered: RefCell<usize>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(
            &self,
            _title: &str,
            _body: &str,
            _opts: &NotifyOptions,
        ) -> Result<(), NotifyError> {
            *self.delivered.borrow_mut() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn commands_round_trip_through_the_service() {
        let dir = tempdir().unwrap();
        let state_file = dir.path().join("last-state.json");
        let handle =
            spawn_timer_service(Arc::new(Settings::default()), state_file.clone(), None).unwrap();

        let snap = handle.start(Some(120)).await.unwrap();
        assert_eq!(snap.state, TimerState::Running);
        assert_eq!(snap.remaining_seconds, 120);

        let snap = handle.pause().await.unwrap();
        assert_eq!(snap.state, TimerState::Paused);
        assert_eq!(snap.remaining_seconds, 120);

        let snap = handle.set_paused(65).await.unwrap();
        assert_eq!(snap.state, TimerState::Paused);
        assert_eq!(snap.remaining_seconds, 65);

        let snap = handle.reset().await.unwrap();
        assert_eq!(snap.state, TimerState::Idle);
        assert_eq!(snap.remaining_seconds, 0);

        // the watch channel tracks the last applied command
        assert_eq!(handle.snapshot().state, TimerState::Idle);

        handle.shutdown().await.unwrap();
        let last = persist::load_last_state(&state_file).unwrap().unwrap();
        assert_eq!(last.state, TimerState::Idle);

        assert!(matches!(
            handle.start(Some(1)).await,
            Err(ServiceError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn a_running_record_is_restored_as_paused() {
        let dir = tempdir().unwrap();
        let state_file = dir.path().join("last-state.json");
        persist::save_last_state(
            &state_file,
            TimerSnapshot {
                state: TimerState::Running,
                remaining_seconds: 300,
            },
        )
        .unwrap();

        let handle =
            spawn_timer_service(Arc::new(Settings::default()), state_file.clone(), None).unwrap();

        // restoration happens before the first command is served
        let snap = handle.pause().await.unwrap();
        assert_eq!(snap.state, TimerState::Paused);
        assert_eq!(snap.remaining_seconds, 300);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn a_fresh_start_drops_an_armed_repeat_window() {
        let dir = tempdir().unwrap();
        let state_file = dir.path().join("last-state.json");
        let mut settings = Settings::default();
        settings.repeat_enabled = true;
        settings.repeat_count = 3;
        settings.repeat_interval_seconds = 5;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(TimerSnapshot::idle());
        let handle = TimerServiceHandle {
            command_tx,
            snapshot_rx,
        };

        let notifier = Rc::new(RecordingNotifier::default());
        let local = tokio::task::LocalSet::new();
        local
            .run_until({
                let notifier = Rc::clone(&notifier);
                let handle = handle.clone();
                async move {
                    let clock: Rc<dyn Clock> = Rc::new(TokioClock::new());
                    let service = tokio::task::spawn_local(run_timer_loop(
                        Arc::new(settings),
                        state_file,
                        command_rx,
                        snapshot_tx,
                        clock,
                        Rc::clone(&notifier) as Rc<dyn Notifier>,
                    ));

                    handle.start(Some(1)).await.unwrap();
                    let mut rx = handle.snapshot_rx.clone();
                    while rx.borrow_and_update().state != TimerState::Idle {
                        rx.changed().await.unwrap();
                    }
                    // the elapsed notification has gone out and the repeat
                    // window is armed for another delivery in 5s
                    assert_eq!(*notifier.delivered.borrow(), 1);

                    let snap = handle.start(Some(600)).await.unwrap();
                    assert_eq!(snap.state, TimerState::Running);

                    // well past every repeat the old window would have fired
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    assert_eq!(*notifier.delivered.borrow(), 1);

                    handle.shutdown().await.unwrap();
                    service.await.unwrap();
                }
            })
            .await;
    }
}
