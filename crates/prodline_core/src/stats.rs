use crate::model::{Job, Status};
use serde::Serialize;
use time::macros::format_description;
use time::{Date, Duration, UtcOffset};

const DAILY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub draft: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Draft => self.draft += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Done => self.done += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.draft + self.in_progress + self.done
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    pub name: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageTimeStats {
    pub name: String,
    /// Rounded mean of `totalTimeSpent`, in minutes.
    pub average_time: i64,
    pub total_jobs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub date: String,
    pub pending: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overall: StatusCounts,
    pub components: Vec<ComponentStats>,
    pub average_times: Vec<AverageTimeStats>,
    pub daily: Vec<DailyStats>,
}

pub fn dashboard(jobs: &[Job], today: Date) -> Dashboard {
    Dashboard {
        overall: overall_stats(jobs),
        components: component_stats(jobs),
        average_times: average_time_stats(jobs),
        daily: daily_stats(jobs, today),
    }
}

pub fn overall_stats(jobs: &[Job]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for component in jobs.iter().flat_map(|job| &job.components) {
        counts.record(component.status);
    }
    counts
}

/// Status counts per component name, in the order names first appear.
pub fn component_stats(jobs: &[Job]) -> Vec<ComponentStats> {
    let mut stats: Vec<ComponentStats> = Vec::new();

    for component in jobs.iter().flat_map(|job| &job.components) {
        match stats.iter_mut().find(|entry| entry.name == component.name) {
            Some(entry) => entry.counts.record(component.status),
            None => {
                let mut counts = StatusCounts::default();
                counts.record(component.status);
                stats.push(ComponentStats {
                    name: component.name.clone(),
                    counts,
                });
            }
        }
    }

    stats
}

pub fn average_time_stats(jobs: &[Job]) -> Vec<AverageTimeStats> {
    let mut totals: Vec<(String, i64, usize)> = Vec::new();

    for component in jobs.iter().flat_map(|job| &job.components) {
        let position = match totals.iter().position(|(name, _, _)| *name == component.name) {
            Some(position) => position,
            None => {
                totals.push((component.name.clone(), 0, 0));
                totals.len() - 1
            }
        };

        if component.status == Status::Done && component.total_time_spent > 0 {
            let entry = &mut totals[position];
            entry.1 += component.total_time_spent;
            entry.2 += 1;
        }
    }

    totals
        .into_iter()
        .filter(|(_, _, count)| *count > 0)
        .map(|(name, total, count)| {
            let count_i64 = count as i64;
            AverageTimeStats {
                name,
                average_time: (total + count_i64 / 2) / count_i64,
                total_jobs: count,
            }
        })
        .filter(|stats| stats.average_time > 0)
        .collect()
}

/// Components touched on each of the seven days ending at `today`, oldest first.
pub fn daily_stats(jobs: &[Job], today: Date) -> Vec<DailyStats> {
    let days: Vec<Date> = (0..DAILY_WINDOW_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub(Duration::days(offset)))
        .collect();
    let mut counts = vec![(0usize, 0usize); days.len()];

    for component in jobs.iter().flat_map(|job| &job.components) {
        let updated = component.updated_at.to_offset(UtcOffset::UTC).date();
        if let Some(index) = days.iter().position(|day| *day == updated) {
            if component.status == Status::Done {
                counts[index].1 += 1;
            } else {
                counts[index].0 += 1;
            }
        }
    }

    days.iter()
        .zip(counts)
        .map(|(day, (pending, completed))| DailyStats {
            date: format_day(*day),
            pending,
            completed,
        })
        .collect()
}

fn format_day(day: Date) -> String {
    day.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string())
}
