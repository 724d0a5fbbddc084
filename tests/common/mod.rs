#![allow(dead_code)]

use async_trait::async_trait;
use devenv_doctor::domain::model::{CommandOutput, Platform};
use devenv_doctor::domain::ports::{Host, Prompter};
use devenv_doctor::utils::output::Reporter;
use devenv_doctor::{DoctorConfig, DoctorContext, DoctorError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct HostState {
    programs: HashSet<String>,
    responses: HashMap<String, VecDeque<CommandOutput>>,
    calls: Vec<String>,
    listening: HashSet<u16>,
    process_names: HashMap<u32, String>,
    frees_on_terminate: HashMap<u32, u16>,
    terminated: Vec<u32>,
    available_space: Option<u64>,
    sleeps: usize,
}

/// Scripted stand-in for the machine. Clones share state, so a test can keep
/// a handle after boxing one into the context.
#[derive(Clone)]
pub struct FakeHost {
    platform: Platform,
    state: Arc<Mutex<HostState>>,
}

impl FakeHost {
    pub fn new(platform: Platform) -> Self {
        let host = Self {
            platform,
            state: Arc::new(Mutex::new(HostState::default())),
        };
        host.state.lock().unwrap().available_space = Some(500 * 1024 * 1024 * 1024);
        host
    }

    pub fn with_program(self, program: &str) -> Self {
        self.state.lock().unwrap().programs.insert(program.to_string());
        self
    }

    /// Queues a response; the last queued response repeats forever.
    pub fn respond(self, command: &str, output: CommandOutput) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .entry(command.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn listening(self, port: u16) -> Self {
        self.state.lock().unwrap().listening.insert(port);
        self
    }

    /// A process listening on `port` that releases it when terminated.
    pub fn owned_by(self, port: u16, pid: u32, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.listening.insert(port);
            state.process_names.insert(pid, name.to_string());
            state.frees_on_terminate.insert(pid, port);
        }
        self.with_program("lsof").respond(
            &format!("lsof -nP -iTCP:{} -sTCP:LISTEN -t", port),
            CommandOutput::ok(&format!("{}\n", pid)),
        )
    }

    pub fn available_space(self, bytes: Option<u64>) -> Self {
        self.state.lock().unwrap().available_space = bytes;
        self
    }

    /// A healthy Docker installation.
    pub fn with_docker(self) -> Self {
        self.with_program("docker")
            .respond(
                "docker info --format {{.ServerVersion}}",
                CommandOutput::ok("27.3.1\n"),
            )
            .respond("docker compose version --short", CommandOutput::ok("2.29.7\n"))
            .respond(
                "docker info --format {{json .}}",
                CommandOutput::ok(r#"{"MemTotal":8589934592,"NCPU":4,"OperatingSystem":"Docker Desktop"}"#),
            )
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn called(&self, command: &str) -> bool {
        self.calls().iter().any(|call| call == command)
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.state.lock().unwrap().terminated.clone()
    }

    pub fn sleeps(&self) -> usize {
        self.state.lock().unwrap().sleeps
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let mut state = self.state.lock().unwrap();
        state.calls.push(command.clone());

        let Some(queue) = state.responses.get_mut(&command) else {
            return Ok(CommandOutput::failed("not scripted"));
        };
        let output = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        Ok(output)
    }

    fn has_program(&self, program: &str) -> bool {
        self.state.lock().unwrap().programs.contains(program)
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn is_listening(&self, port: u16) -> bool {
        self.state.lock().unwrap().listening.contains(&port)
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        self.state.lock().unwrap().process_names.get(&pid).cloned()
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.terminated.push(pid);
        if let Some(port) = state.frees_on_terminate.remove(&pid) {
            state.listening.remove(&port);
        }
        Ok(())
    }

    fn available_space(&self, _path: &Path) -> Result<u64> {
        self.state
            .lock()
            .unwrap()
            .available_space
            .ok_or_else(|| DoctorError::IoError(std::io::Error::other("statfs failed")))
    }

    async fn sleep(&self, _duration: Duration) {
        self.state.lock().unwrap().sleeps += 1;
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Answer {
    Confirm(bool),
    Choose(Option<usize>),
}

/// Replays answers in order. Once the script runs out every prompt declines.
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    answers: Arc<Mutex<VecDeque<Answer>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            asked: Arc::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str, _default: bool) -> Result<bool> {
        self.asked.lock().unwrap().push(question.to_string());
        match self.answers.lock().unwrap().pop_front() {
            Some(Answer::Confirm(answer)) => Ok(answer),
            Some(other) => panic!("expected a confirmation for '{}', got {:?}", question, other),
            None => Ok(false),
        }
    }

    fn choose(&mut self, question: &str, _options: &[&str], _default: usize) -> Result<Option<usize>> {
        self.asked.lock().unwrap().push(question.to_string());
        match self.answers.lock().unwrap().pop_front() {
            Some(Answer::Choose(answer)) => Ok(answer),
            Some(other) => panic!("expected a choice for '{}', got {:?}", question, other),
            None => Ok(None),
        }
    }
}

pub fn context(
    root: &Path,
    config: DoctorConfig,
    host: &FakeHost,
    prompter: &ScriptedPrompter,
) -> DoctorContext {
    DoctorContext::new(
        root.to_path_buf(),
        config,
        Box::new(host.clone()),
        Box::new(prompter.clone()),
        Reporter::sink(),
    )
}

pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

pub fn set_mode_of(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
}
