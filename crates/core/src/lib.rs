#![forbid(unsafe_code)]

pub mod dashboard;
pub mod error;
pub mod model;
pub mod prompt;
pub mod time;

pub use dashboard::DashboardSummary;
pub use error::Error;
pub use prompt::{PromptAssembler, PromptContext};
pub use time::Clock;
