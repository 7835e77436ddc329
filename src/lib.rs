//! Library and Binary to create a fair monthly service schedule for a roster of volunteers,
//! spreading work over the year and rotating everyone through the positions of their jobs
//! for an example how to use: see main.rs

pub mod availability;
pub mod config;
pub mod csv;
pub mod dates;
pub mod error;
pub mod schedule;
pub mod score;
pub mod siblings;

pub use config::{Config, load_config};
pub use schedule::{GenerateRequest, Schedule, SchedulePreview, generate};
