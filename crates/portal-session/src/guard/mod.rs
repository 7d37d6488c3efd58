//! Inactivity guard: logs the user out after a period without activity.
//!
//! Mounting a guard spawns one tokio task that owns the [`InactivityTimer`]
//! and drives the [`state::step`] machine. The task waits on three sources in
//! priority order: control messages from the [`SessionGuard`] handle, the
//! most recent activity instant published by the activity listeners, and the
//! timer deadline. Activity is published through a `watch` channel, so a burst
//! of signals collapses into its latest instant and none is ever dropped.

pub mod state;

use crate::{
    activity::{ActivityHub, ActivityMonitor},
    config::GuardConfig,
    error::GuardError,
    logout::{LogoutInvoker, LogoutReport, LogoutTrigger},
    timer::InactivityTimer,
};
use state::{GuardAction, GuardEvent, GuardState, step};
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{
    sync::{
        mpsc::{self, Receiver, Sender},
        oneshot::{self, Sender as ReplyTx},
        watch,
    },
    task::JoinHandle,
    time::{Instant, sleep_until, timeout},
};

// Default timeout for state queries (5s).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExit {
    LoggedOut(LogoutReport),
    Unmounted,
}

enum GuardMessage {
    State { reply: ReplyTx<GuardState> },
    Unmount { reply: ReplyTx<()> },
}

type SharedMonitor = Arc<Mutex<ActivityMonitor>>;

fn detach(monitor: &SharedMonitor) {
    monitor
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .detach();
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

struct GuardTask {
    rx: Receiver<GuardMessage>,
    activity: watch::Receiver<Instant>,
    timer: InactivityTimer,
    monitor: SharedMonitor,
    invoker: Arc<LogoutInvoker>,
}

impl GuardTask {
    async fn run(mut self) -> GuardExit {
        let mut state = GuardState::Active;
        let mut unmount_reply: Option<ReplyTx<()>> = None;
        loop {
            let deadline = self.timer.deadline();
            let event = tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(GuardMessage::State { reply }) => {
                        let _ = reply.send(state);
                        continue;
                    }
                    Some(GuardMessage::Unmount { reply }) => {
                        unmount_reply = Some(reply);
                        GuardEvent::Unmount
                    }
                    None => GuardEvent::Unmount,
                },
                changed = self.activity.changed() => match changed {
                    Ok(()) => GuardEvent::Activity { at: *self.activity.borrow_and_update() },
                    Err(_) => GuardEvent::Unmount,
                },
                () = wait_for(deadline) => GuardEvent::DeadlineReached { now: Instant::now() },
            };

            let (next, actions) = step(state, event, &mut self.timer);
            state = next;
            let mut report = None;
            for action in actions {
                match action {
                    GuardAction::Rescheduled(deadline) => {
                        tracing::trace!(?deadline, "inactivity timer reset");
                    }
                    GuardAction::Detach => detach(&self.monitor),
                    GuardAction::Logout(trigger) => {
                        tracing::info!(%trigger, "inactivity timeout reached, logging out");
                        report = Some(self.logout(trigger, &mut unmount_reply).await);
                    }
                    GuardAction::NoOp => {}
                }
            }

            match (state, report) {
                (GuardState::Terminating, Some(report)) => {
                    if let Some(reply) = unmount_reply.take() {
                        let _ = reply.send(());
                    }
                    return GuardExit::LoggedOut(report);
                }
                (GuardState::Unmounted, _) => {
                    if let Some(reply) = unmount_reply.take() {
                        let _ = reply.send(());
                    }
                    tracing::debug!("session guard unmounted");
                    return GuardExit::Unmounted;
                }
                _ => {}
            }
        }
    }

    /// Runs the logout while still answering the handle. State queries see
    /// `Terminating`; an unmount request is answered once the logout is done.
    async fn logout(
        &mut self,
        trigger: LogoutTrigger,
        unmount_reply: &mut Option<ReplyTx<()>>,
    ) -> LogoutReport {
        let invoker = self.invoker.clone();
        let invoke = invoker.invoke(trigger);
        tokio::pin!(invoke);
        loop {
            tokio::select! {
                biased;
                report = &mut invoke => return report,
                Some(msg) = self.rx.recv() => match msg {
                    GuardMessage::State { reply } => {
                        let _ = reply.send(GuardState::Terminating);
                    }
                    GuardMessage::Unmount { reply } => *unmount_reply = Some(reply),
                },
            }
        }
    }
}

/// Handle to a mounted inactivity guard.
///
/// Dropping the handle detaches the activity listeners and stops the guard
/// task without logging out.
pub struct SessionGuard {
    tx: Sender<GuardMessage>,
    monitor: SharedMonitor,
    join: Option<JoinHandle<GuardExit>>,
    request_timeout: Duration,
}

impl SessionGuard {
    /// Starts the timer and listens for activity on `hub`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        config: &GuardConfig,
        hub: &ActivityHub,
        invoker: Arc<LogoutInvoker>,
    ) -> Result<Self, GuardError> {
        if config.timeout_ms == 0 {
            return Err(GuardError::InvalidTimeout);
        }
        if config.mailbox_capacity == 0 {
            return Err(GuardError::InvalidCapacity);
        }
        if config.activity_events.is_empty() {
            return Err(GuardError::NoActivityEvents);
        }

        let mounted_at = Instant::now();
        let mut timer = InactivityTimer::new(config.timeout());
        timer.start(mounted_at);

        let (activity_tx, activity_rx) = watch::channel(mounted_at);
        let monitor = ActivityMonitor::attach(hub, &config.activity_events, move |kind| {
            activity_tx.send_replace(Instant::now());
            tracing::trace!(%kind, "activity");
        });
        let monitor = Arc::new(Mutex::new(monitor));

        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let task = GuardTask {
            rx,
            activity: activity_rx,
            timer,
            monitor: monitor.clone(),
            invoker,
        };
        let join = tokio::spawn(task.run());
        tracing::debug!(timeout_ms = config.timeout_ms, "session guard mounted");

        Ok(Self {
            tx,
            monitor,
            join: Some(join),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Current state, or `Closed` once the guard task has finished.
    ///
    /// Reports `Terminating` while the inactivity logout is in flight.
    pub async fn state(&self) -> Result<GuardState, GuardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(GuardMessage::State { reply: reply_tx })
            .await
            .map_err(|_| GuardError::Closed)?;
        match timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(_)) => Err(GuardError::Closed),
            Err(_) => Err(GuardError::Timeout(self.request_timeout)),
        }
    }

    /// Cancels the timer and removes every activity listener.
    ///
    /// Idempotent. When a logout is already running it is allowed to finish;
    /// this returns once the guard task is gone either way.
    pub async fn unmount(&self) {
        detach(&self.monitor);
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(GuardMessage::Unmount { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }

    /// Waits for the guard task to finish and reports why it did.
    ///
    /// Cancel-safe; the exit is reported once, later calls get `Closed`.
    pub async fn wait(&mut self) -> Result<GuardExit, GuardError> {
        let join = self.join.as_mut().ok_or(GuardError::Closed)?;
        let exit = join
            .await
            .map_err(|err| GuardError::TaskFailed(err.to_string()));
        self.join = None;
        exit
    }

    pub async fn closed(mut self) -> Result<GuardExit, GuardError> {
        self.wait().await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        detach(&self.monitor);
    }
}
