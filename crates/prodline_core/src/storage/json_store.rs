use crate::error::AppError;
use crate::model::Job;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "jobs.json";
const STORE_ENV_VAR: &str = "PRODLINE_STORE_PATH";

#[derive(Debug, Deserialize)]
struct StoredJobs {
    schema_version: u32,
    #[serde(default)]
    revision: u64,
    jobs: Vec<Job>,
}

#[derive(Serialize)]
struct StoredJobsRef<'a> {
    schema_version: u32,
    revision: u64,
    jobs: &'a [Job],
}

#[derive(Debug, Deserialize)]
struct StoredHeader {
    #[serde(default)]
    revision: u64,
}

/// Jobs as loaded from disk, tagged with the revision they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    pub jobs: Vec<Job>,
    pub revision: u64,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    super::app_file(STORE_ENV_VAR, STORE_FILE_NAME)
}

pub fn load_jobs(path: &Path) -> Result<Vec<Job>, AppError> {
    Ok(load_state(path)?.jobs)
}

pub fn load_state(path: &Path) -> Result<JobState, AppError> {
    if !path.exists() {
        return Ok(JobState {
            jobs: Vec::new(),
            revision: 0,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredJobs =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    check_unique_ids(&stored.jobs)?;

    Ok(JobState {
        jobs: stored.jobs,
        revision: stored.revision,
    })
}

fn check_unique_ids(jobs: &[Job]) -> Result<(), AppError> {
    let mut job_ids = HashSet::new();
    let mut component_ids = HashSet::new();

    for job in jobs {
        if !job_ids.insert(job.id.as_str()) {
            return Err(AppError::invalid_data(format!("duplicate job id {}", job.id)));
        }
        for component in &job.components {
            if !component_ids.insert(component.id.as_str()) {
                return Err(AppError::invalid_data(format!(
                    "duplicate component id {}",
                    component.id
                )));
            }
        }
    }

    Ok(())
}

fn disk_revision(path: &Path) -> Result<u64, AppError> {
    if !path.exists() {
        return Ok(0);
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let header: StoredHeader =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;
    Ok(header.revision)
}

/// Writes `state` if nobody saved since it was loaded, and returns the new revision.
pub fn save_state(path: &Path, state: &JobState) -> Result<u64, AppError> {
    let on_disk = disk_revision(path)?;
    if on_disk != state.revision {
        return Err(AppError::conflict(format!(
            "store changed since it was read (revision {} on disk, {} loaded)",
            on_disk, state.revision
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let revision = state.revision + 1;
    let stored = StoredJobsRef {
        schema_version: SCHEMA_VERSION,
        revision,
        jobs: &state.jobs,
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    log::debug!("saved {} jobs at revision {}", state.jobs.len(), revision);
    Ok(revision)
}
