use crate::error::AppError;
use crate::model::{Component, Job, Status, house_model};
use crate::stats::StatusCounts;
use crate::storage::json_store;
use crate::tracker::{TrackerOptions, apply_status_change_with};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub name: String,
    pub model: String,
    pub start_date: String,
    pub deadline: String,
    pub resp_user: String,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct ComponentUpdate {
    pub job: Job,
    pub component: Component,
}

#[derive(Debug, Clone)]
pub struct ProductionLine {
    pub component_name: String,
    pub jobs: Vec<Job>,
    pub status_counts: StatusCounts,
}

pub fn create_job(request: &NewJob) -> Result<Job, AppError> {
    let path = json_store::store_path()?;
    create_job_with_path(&path, request, OffsetDateTime::now_utc())
}

pub fn list_jobs() -> Result<Vec<Job>, AppError> {
    let path = json_store::store_path()?;
    json_store::load_jobs(&path)
}

pub fn get_job(id: &str) -> Result<Job, AppError> {
    let path = json_store::store_path()?;
    get_job_with_path(&path, id)
}

pub fn set_job_status(id: &str, status: Status) -> Result<Job, AppError> {
    let path = json_store::store_path()?;
    set_job_status_with_path(&path, id, status, OffsetDateTime::now_utc())
}

pub fn update_component_status(
    component_id: &str,
    status: Status,
    options: TrackerOptions,
) -> Result<ComponentUpdate, AppError> {
    let path = json_store::store_path()?;
    update_component_status_with_path(
        &path,
        component_id,
        status,
        OffsetDateTime::now_utc(),
        options,
    )
}

pub fn production_line(
    component_name: &str,
    show_completed: bool,
) -> Result<ProductionLine, AppError> {
    let path = json_store::store_path()?;
    production_line_with_path(&path, component_name, show_completed)
}

fn create_job_with_path(
    path: &Path,
    request: &NewJob,
    now: OffsetDateTime,
) -> Result<Job, AppError> {
    let name = required(&request.name, "name is required")?;
    let resp_user = required(&request.resp_user, "responsible user is required")?;
    let model = house_model(&request.model).ok_or_else(|| {
        AppError::invalid_input(format!("unknown house model '{}'", request.model.trim()))
    })?;

    let start_date = parse_date_input(&request.start_date, "start date")?;
    let deadline = parse_date_input(&request.deadline, "deadline")?;
    if deadline < start_date {
        return Err(AppError::invalid_input("deadline is before the start date"));
    }

    let mut state = json_store::load_state(path)?;
    let id = next_job_id(&state.jobs);
    let components = model
        .components
        .iter()
        .map(|step| {
            Component::new_draft(
                format!("{id}-c{}", step.sequence),
                id.clone(),
                step.sequence,
                step.name,
                step.description,
                now,
            )
        })
        .collect();

    let job = Job {
        id,
        name: name.to_string(),
        model: model.key.to_string(),
        start_date,
        deadline,
        status: request.status,
        resp_user: resp_user.to_string(),
        components,
        created_at: now,
        updated_at: now,
    };

    state.jobs.push(job.clone());
    json_store::save_state(path, &state)?;
    log::info!("created job {} ({}, model {})", job.id, job.name, job.model);

    Ok(job)
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::invalid_input(message))
    } else {
        Ok(trimmed)
    }
}

fn next_job_id(jobs: &[Job]) -> String {
    let mut nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    loop {
        let id = format!("job-{nanos}");
        if !jobs.iter().any(|job| job.id == id) {
            return id;
        }
        nanos += 1;
    }
}

/// Accepts RFC3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date_input(raw: &str, field: &str) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| AppError::invalid_input(format!("{field} must be RFC3339 or YYYY-MM-DD")))
}

fn get_job_with_path(path: &Path, id: &str) -> Result<Job, AppError> {
    let trimmed_id = required(id, "id is required")?;

    json_store::load_jobs(path)?
        .into_iter()
        .find(|job| job.id == trimmed_id)
        .ok_or_else(|| AppError::not_found("job not found"))
}

fn set_job_status_with_path(
    path: &Path,
    id: &str,
    status: Status,
    now: OffsetDateTime,
) -> Result<Job, AppError> {
    let trimmed_id = required(id, "id is required")?;

    let mut state = json_store::load_state(path)?;
    let job = state
        .jobs
        .iter_mut()
        .find(|job| job.id == trimmed_id)
        .ok_or_else(|| AppError::not_found("job not found"))?;

    job.status = status;
    job.updated_at = now;
    let updated = job.clone();
    json_store::save_state(path, &state)?;

    Ok(updated)
}

fn locate_component(jobs: &[Job], component_id: &str) -> Option<(usize, usize)> {
    jobs.iter().enumerate().find_map(|(job_index, job)| {
        job.components
            .iter()
            .position(|component| component.id == component_id)
            .map(|component_index| (job_index, component_index))
    })
}

fn update_component_status_with_path(
    path: &Path,
    component_id: &str,
    status: Status,
    now: OffsetDateTime,
    options: TrackerOptions,
) -> Result<ComponentUpdate, AppError> {
    let trimmed_id = required(component_id, "component id is required")?;

    let mut state = json_store::load_state(path)?;
    let (job_index, component_index) = locate_component(&state.jobs, trimmed_id)
        .ok_or_else(|| AppError::not_found("component not found"))?;

    let job = &mut state.jobs[job_index];
    let previous = job.components[component_index].status;
    let next = apply_status_change_with(&job.components[component_index], status, now, options)?;
    job.components[component_index] = next.clone();
    job.updated_at = now;
    let updated_job = job.clone();

    json_store::save_state(path, &state)?;
    log::info!(
        "component {} of job {}: {} -> {}",
        next.id,
        updated_job.id,
        previous,
        next.status
    );

    Ok(ComponentUpdate {
        job: updated_job,
        component: next,
    })
}

fn production_line_with_path(
    path: &Path,
    component_name: &str,
    show_completed: bool,
) -> Result<ProductionLine, AppError> {
    let name = required(component_name, "component name is required")?;

    let jobs = json_store::load_jobs(path)?;
    let mut status_counts = StatusCounts::default();
    let mut line_jobs = Vec::new();

    for job in jobs {
        let Some(component) = job.component_named(name) else {
            continue;
        };
        status_counts.record(component.status);
        if show_completed || component.status != Status::Done {
            line_jobs.push(job);
        }
    }

    Ok(ProductionLine {
        component_name: name.to_string(),
        jobs: line_jobs,
        status_counts,
    })
}
