use crate::{logout::LogoutTrigger, timer::InactivityTimer};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Active,
    Terminating,
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    Activity { at: Instant },
    DeadlineReached { now: Instant },
    Unmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    Rescheduled(Instant),
    Logout(LogoutTrigger),
    Detach,
    NoOp,
}

fn expire(timer: &mut InactivityTimer) -> (GuardState, Vec<GuardAction>) {
    timer.cancel();
    (
        GuardState::Terminating,
        vec![GuardAction::Detach, GuardAction::Logout(LogoutTrigger::Auto)],
    )
}

/// Advances the guard state machine by one event.
///
/// Timer mutations happen here, so the returned actions only describe side
/// effects the caller still has to perform.
pub fn step(
    state: GuardState,
    event: GuardEvent,
    timer: &mut InactivityTimer,
) -> (GuardState, Vec<GuardAction>) {
    match (state, event) {
        (GuardState::Active, GuardEvent::Activity { at }) => {
            // A signal stamped at or after the deadline lost the race to it.
            if timer.has_expired(at) {
                return expire(timer);
            }
            let deadline = timer.reset(at);
            (GuardState::Active, vec![GuardAction::Rescheduled(deadline)])
        }
        (GuardState::Active, GuardEvent::DeadlineReached { now }) => {
            if timer.has_expired(now) {
                expire(timer)
            } else {
                (GuardState::Active, vec![GuardAction::NoOp])
            }
        }
        (GuardState::Active | GuardState::Terminating, GuardEvent::Unmount) => {
            timer.cancel();
            (GuardState::Unmounted, vec![GuardAction::Detach])
        }
        (GuardState::Terminating, _) => (GuardState::Terminating, vec![GuardAction::NoOp]),
        (GuardState::Unmounted, _) => (GuardState::Unmounted, vec![GuardAction::NoOp]),
    }
}
