use crate::model::{Component, Status};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::serde::rfc3339;

/// A manufacturing order: one house unit moving through its production steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub name: String,
    pub model: String,
    #[serde(with = "rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub deadline: OffsetDateTime,
    pub status: Status,
    pub resp_user: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Job {
    pub fn component_named(&self, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| component.name == name)
    }
}
