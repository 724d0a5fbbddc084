pub mod error;
pub mod logger;
pub mod output;
pub mod secrets;
pub mod validation;
