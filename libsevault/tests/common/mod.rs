//! Shared helpers for libsevault integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsevault::{BackendRegistry, CommandOutput, CommandRunner, DriverConfig, VolumeDriver};
use parking_lot::Mutex;

/// A command invocation observed by [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Fake `mount`/`umount` collaborator: records every call and answers with
/// a configurable result.
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    result: Mutex<CommandOutput>,
}

impl RecordingRunner {
    pub fn succeeding() -> Arc<Self> {
        Self::with_result(CommandOutput::ok())
    }

    pub fn with_result(result: CommandOutput) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            result: Mutex::new(result),
        })
    }

    pub fn set_result(&self, result: CommandOutput) {
        *self.result.lock() = result;
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.program == program)
            .count()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        self.calls.lock().push(Invocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        Ok(self.result.lock().clone())
    }
}

pub fn driver(state_root: &Path, runner: Arc<RecordingRunner>) -> VolumeDriver {
    VolumeDriver::new(
        DriverConfig::new(state_root),
        BackendRegistry::builtin("nfs"),
        runner,
    )
    .expect("builtin registry has nfs")
}

pub fn opts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}
