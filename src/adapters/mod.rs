// Adapters layer: concrete implementations of the domain ports.

pub mod host;
pub mod prompt;

pub use host::SystemHost;
pub use prompt::{AutoPrompter, ConsolePrompter};
