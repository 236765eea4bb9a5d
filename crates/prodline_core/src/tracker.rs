//! Component status transitions and active-time accounting.
//!
//! Every status change goes through [`apply_status_change_with`]: the requested
//! move is first classified into a [`Transition`], then that transition's effects
//! are applied to a copy of the component. Nothing here performs I/O; callers
//! load the component, pass the current time in, and persist the result.

use crate::error::AppError;
use crate::model::{Component, PauseInterval, Status};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

const MILLIS_PER_MINUTE: i128 = 60_000;

/// How `startedAt` behaves when a component enters `InProgress` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartedAtPolicy {
    /// Stamp `startedAt` only when it is unset for the current lifecycle.
    #[default]
    KeepFirst,
    /// Stamp `startedAt` on every entry into `InProgress`, resumes included.
    ResetOnEveryStart,
}

/// What to do with a status pair that has no entry in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Strict,
    /// Overwrite the status and `updatedAt` without touching time fields.
    Lenient,
}

/// What to do when pause accounting exceeds the elapsed wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeTimePolicy {
    /// Validate the pause history and fail on inconsistent data.
    #[default]
    Reject,
    Clamp,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackerOptions {
    #[serde(default)]
    pub started_at: StartedAtPolicy,
    #[serde(default)]
    pub transitions: TransitionPolicy,
    #[serde(default)]
    pub negative_time: NegativeTimePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one.
    Stay,
    /// Draft to InProgress with no pause pending.
    Start,
    /// Draft to InProgress while paused.
    Resume,
    /// InProgress to Draft.
    Pause,
    /// Any other status to Done.
    Finish,
    /// Done to InProgress, or a start of a component still carrying a finish
    /// stamp; begins a new lifecycle.
    Reopen,
    /// A pair the table does not cover (Done to Draft).
    Overwrite,
}

impl Transition {
    pub fn classify(from: Status, to: Status, paused: bool) -> Self {
        match (from, to) {
            (Status::Draft, Status::Draft)
            | (Status::InProgress, Status::InProgress)
            | (Status::Done, Status::Done) => Transition::Stay,
            (Status::Draft, Status::InProgress) if paused => Transition::Resume,
            (Status::Draft, Status::InProgress) => Transition::Start,
            (Status::Done, Status::InProgress) => Transition::Reopen,
            (Status::Draft | Status::InProgress, Status::Done) => Transition::Finish,
            (Status::InProgress, Status::Draft) => Transition::Pause,
            (Status::Done, Status::Draft) => Transition::Overwrite,
        }
    }
}

/// Applies a status change with the default [`TrackerOptions`].
pub fn apply_status_change(
    current: &Component,
    requested: Status,
    now: OffsetDateTime,
) -> Result<Component, AppError> {
    apply_status_change_with(current, requested, now, TrackerOptions::default())
}

pub fn apply_status_change_with(
    current: &Component,
    requested: Status,
    now: OffsetDateTime,
    options: TrackerOptions,
) -> Result<Component, AppError> {
    let transition = match Transition::classify(current.status, requested, current.is_paused()) {
        // A finish stamp left behind by a lenient Done -> Draft overwrite.
        Transition::Start | Transition::Resume if current.finished_at.is_some() => {
            Transition::Reopen
        }
        other => other,
    };
    log::debug!(
        "component {}: {} -> {} ({:?})",
        current.id,
        current.status,
        requested,
        transition
    );

    let mut next = current.clone();

    match transition {
        Transition::Stay => {}
        Transition::Start => {
            stamp_started_at(&mut next, now, options.started_at);
            next.paused_at = None;
        }
        Transition::Resume => {
            if let Some(last) = next.pause_history.last_mut()
                && last.is_open()
            {
                last.finished_at = Some(now);
            }
            stamp_started_at(&mut next, now, options.started_at);
            next.paused_at = None;
        }
        Transition::Pause => {
            next.paused_at = Some(now);
            next.pause_history.push(PauseInterval::open(now));
        }
        Transition::Finish => {
            next.finished_at = Some(now);
            next.paused_at = None;
            if let Some(started_at) = next.started_at {
                next.total_time_spent = time_spent_minutes(
                    started_at,
                    &next.pause_history,
                    now,
                    options.negative_time,
                )?;
            }
        }
        Transition::Reopen => {
            next.started_at = Some(now);
            next.finished_at = None;
            next.paused_at = None;
            next.pause_history.clear();
        }
        Transition::Overwrite => {
            if options.transitions == TransitionPolicy::Strict {
                return Err(AppError::invalid_transition(format!(
                    "component {} cannot move from {} to {}",
                    current.id, current.status, requested
                )));
            }
        }
    }

    next.status = requested;
    next.updated_at = now;
    Ok(next)
}

fn stamp_started_at(component: &mut Component, now: OffsetDateTime, policy: StartedAtPolicy) {
    match policy {
        StartedAtPolicy::KeepFirst => {
            component.started_at.get_or_insert(now);
        }
        StartedAtPolicy::ResetOnEveryStart => component.started_at = Some(now),
    }
}

/// Sum of closed pause intervals. Open intervals count as zero.
pub fn paused_duration(history: &[PauseInterval]) -> Duration {
    history
        .iter()
        .filter_map(PauseInterval::duration)
        .fold(Duration::ZERO, |total, pause| total + pause)
}

/// Active minutes between `started_at` and `now`, floored, without any policy applied.
pub fn active_minutes(
    started_at: OffsetDateTime,
    history: &[PauseInterval],
    now: OffsetDateTime,
) -> Result<i64, AppError> {
    let active = (now - started_at) - paused_duration(history);
    let minutes = active.whole_milliseconds().div_euclid(MILLIS_PER_MINUTE);
    i64::try_from(minutes).map_err(|_| AppError::invalid_data("elapsed time out of range"))
}

pub fn time_spent_minutes(
    started_at: OffsetDateTime,
    history: &[PauseInterval],
    now: OffsetDateTime,
    policy: NegativeTimePolicy,
) -> Result<i64, AppError> {
    if policy == NegativeTimePolicy::Reject {
        validate_pause_history(history)?;
    }

    let minutes = active_minutes(started_at, history, now)?;
    if minutes >= 0 {
        return Ok(minutes);
    }

    match policy {
        NegativeTimePolicy::Reject => Err(AppError::invalid_data(format!(
            "pause history exceeds elapsed time ({minutes} minutes)"
        ))),
        NegativeTimePolicy::Clamp => {
            log::warn!("clamping negative time spent ({minutes} minutes) to zero");
            Ok(0)
        }
        NegativeTimePolicy::Keep => Ok(minutes),
    }
}

/// Checks that intervals are ordered, well formed, and that only the last one is open.
pub fn validate_pause_history(history: &[PauseInterval]) -> Result<(), AppError> {
    let last_index = history.len().saturating_sub(1);
    let mut previous_start: Option<OffsetDateTime> = None;

    for (index, pause) in history.iter().enumerate() {
        if let Some(previous) = previous_start
            && pause.started_at < previous
        {
            return Err(AppError::invalid_data(format!(
                "pause {index} starts before the pause preceding it"
            )));
        }

        match pause.finished_at {
            Some(finished_at) if finished_at < pause.started_at => {
                return Err(AppError::invalid_data(format!(
                    "pause {index} finishes before it starts"
                )));
            }
            None if index != last_index => {
                return Err(AppError::invalid_data(format!(
                    "pause {index} is open but is not the latest pause"
                )));
            }
            _ => {}
        }

        previous_start = Some(pause.started_at);
    }

    Ok(())
}
