//! Per-session background tasks
//!
//! One liveness poll, one inactivity watch and one activity listener run
//! while a session is authenticated. They are spawned together and
//! aborted together; none of them ever aborts itself, side effects that
//! end the session run on a separate task.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::manager::SessionManager;
use crate::ui::LogoutReason;

pub(crate) struct Background {
    liveness: JoinHandle<()>,
    inactivity: JoinHandle<()>,
    listener: JoinHandle<()>,
}

impl Background {
    /// Spawn the task set for the current session
    pub(crate) fn spawn(manager: &SessionManager, session_id: &str) -> Self {
        let policy = manager.policy();
        let start = Instant::now();

        let liveness = {
            let manager = manager.clone();
            let period = policy.liveness_interval;
            let session_id = session_id.to_string();
            tokio::spawn(async move {
                let mut ticker = interval_at(start + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    tracing::debug!(session_id = %session_id, "Liveness poll");
                    let manager = manager.clone();
                    tokio::spawn(async move {
                        manager.poll_liveness().await;
                    });
                }
            })
        };

        let inactivity = {
            let manager = manager.clone();
            let period = policy.inactivity_check_interval;
            let session_id = session_id.to_string();
            tokio::spawn(async move {
                let mut ticker = interval_at(start + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    let now = ticker.tick().await;
                    if manager.idle_expired(now) {
                        tracing::info!(session_id = %session_id, "Inactivity timeout reached");
                        let manager = manager.clone();
                        tokio::spawn(async move {
                            manager.force_logout(LogoutReason::Inactivity).await;
                        });
                        break;
                    }
                }
            })
        };

        // Subscribe before spawning so no event published after arming is missed
        let mut events = manager.activity_bus().subscribe();
        let listener = {
            let manager = manager.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => manager.record_activity(event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::trace!(skipped, "Activity listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        Self {
            liveness,
            inactivity,
            listener,
        }
    }

    pub(crate) fn abort(self) {
        self.liveness.abort();
        self.inactivity.abort();
        self.listener.abort();
    }

    pub(crate) fn timer_count(&self) -> usize {
        [&self.liveness, &self.inactivity]
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}
