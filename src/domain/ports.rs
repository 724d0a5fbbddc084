use crate::domain::model::{CommandOutput, Platform};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Everything the checks need from the machine they run on.
#[async_trait]
pub trait Host: Send + Sync {
    /// Runs a program to completion. A non-zero exit is reported in the
    /// output, not as an error; errors mean the program could not be spawned.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    fn has_program(&self, program: &str) -> bool;

    fn platform(&self) -> Platform;

    async fn is_listening(&self, port: u16) -> bool;

    fn process_name(&self, pid: u32) -> Option<String>;

    fn terminate(&self, pid: u32) -> Result<()>;

    /// Bytes available to unprivileged users on the filesystem holding `path`.
    fn available_space(&self, path: &Path) -> Result<u64>;

    async fn sleep(&self, duration: Duration);
}

pub trait Prompter: Send {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Returns the zero-based index of the chosen option, or `None` to skip.
    fn choose(&mut self, question: &str, options: &[&str], default: usize)
        -> Result<Option<usize>>;
}
