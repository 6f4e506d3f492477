// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invokes the configured agent as a child process, feeding it the prompt
//! on stdin and reading its stdout as the decision/artifact report.

use deespec_engine::{AgentArtifacts, AgentError, AgentInvoke};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub struct ProcessAgent {
    command: String,
    args: Vec<String>,
}

impl ProcessAgent {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

impl AgentInvoke for ProcessAgent {
    fn invoke(&self, prompt: &str, timeout: Duration) -> Result<AgentArtifacts, AgentError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| AgentError::Failed(err.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|err| AgentError::Failed(err.to_string()))?;
        }

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait().map_err(|err| AgentError::Failed(err.to_string()))? {
                Some(_) => break,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(AgentError::Timeout(timeout));
                }
                None => std::thread::sleep(Duration::from_millis(50)),
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| AgentError::Failed(err.to_string()))?;
        let raw_output = String::from_utf8_lossy(&output.stdout).into_owned();
        let decision_text = raw_output.lines().last().map(str::to_string);

        Ok(AgentArtifacts {
            raw_output,
            decision_text,
            files_touched: Vec::new(),
        })
    }
}
