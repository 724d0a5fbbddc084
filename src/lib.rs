pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{AutoPrompter, ConsolePrompter, SystemHost};
pub use config::toml_config::DoctorConfig;
pub use core::doctor::{Doctor, DoctorContext};
pub use domain::model::{CheckOutcome, DoctorReport};
pub use utils::error::{DoctorError, Result};
