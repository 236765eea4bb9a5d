mod catalog;
mod component;
mod job;

pub use catalog::{HouseComponent, HouseModel, house_model, house_models};
pub use component::{Component, PauseInterval, Status};
pub use job::Job;
