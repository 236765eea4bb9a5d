pub mod config;
pub mod error;
pub mod job_api;
pub mod model;
pub mod stats;
pub mod storage;
pub mod tracker;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Component, Status};
    use time::macros::datetime;

    #[test]
    fn new_component_starts_as_untracked_draft() {
        let now = datetime!(2025-03-01 08:00 UTC);
        let component = Component::new_draft(
            "job-1-c0".to_string(),
            "job-1".to_string(),
            0,
            "Steel frame",
            "Weld the galvanized steel frame",
            now,
        );

        assert_eq!(component.status, Status::Draft);
        assert_eq!(component.started_at, None);
        assert_eq!(component.finished_at, None);
        assert_eq!(component.paused_at, None);
        assert!(component.pause_history.is_empty());
        assert_eq!(component.total_time_spent, 0);
        assert_eq!(component.updated_at, now);
    }

    #[test]
    fn status_uses_display_names_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"In Progress\""
        );
        let parsed: Status = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(parsed, Status::Done);
    }

    #[test]
    fn status_parses_loose_cli_spellings() {
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("In Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!(" DRAFT ".parse::<Status>().unwrap(), Status::Draft);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Done);
        assert_eq!("later".parse::<Status>().unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::not_found("component not found");
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "not_found - component not found");
    }
}
