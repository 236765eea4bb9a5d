use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::serde::rfc3339;
use time::{Duration, OffsetDateTime};

/// Lifecycle state shared by components and jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Draft,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match cleaned.as_str() {
            "draft" | "pause" | "paused" => Ok(Status::Draft),
            "inprogress" | "start" | "started" | "progress" => Ok(Status::InProgress),
            "done" | "finish" | "finished" => Ok(Status::Done),
            _ => Err(AppError::invalid_input(format!(
                "unknown status '{}' (expected draft, in-progress or done)",
                raw.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseInterval {
    #[serde(with = "rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(default, with = "rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
}

impl PauseInterval {
    pub fn open(started_at: OffsetDateTime) -> Self {
        Self {
            started_at,
            finished_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.finished_at.is_none()
    }

    /// Length of a closed interval; open intervals have none.
    pub fn duration(&self) -> Option<Duration> {
        self.finished_at.map(|finished_at| finished_at - self.started_at)
    }
}

/// One production step of a job, with its time-tracking state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub job_id: String,
    pub name: String,
    #[serde(default)]
    pub sequence: u32,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    #[serde(default, with = "rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339::option")]
    pub paused_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub pause_history: Vec<PauseInterval>,
    /// Net active minutes, written on entry into `Done`.
    #[serde(default)]
    pub total_time_spent: i64,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Component {
    pub fn new_draft(
        id: String,
        job_id: String,
        sequence: u32,
        name: &str,
        description: &str,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            job_id,
            name: name.to_string(),
            sequence,
            description: description.to_string(),
            status: Status::Draft,
            started_at: None,
            finished_at: None,
            paused_at: None,
            pause_history: Vec::new(),
            total_time_spent: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }
}
