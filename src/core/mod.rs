pub mod checks;
pub mod doctor;

pub use crate::domain::model::{CheckOutcome, DoctorReport};
pub use crate::domain::ports::{Host, Prompter};
pub use crate::utils::error::Result;
