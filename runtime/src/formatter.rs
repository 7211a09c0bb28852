//! Post-run formatting of the data directory via the project's yarn scripts.
//!
//! Runs `yarn install` then `yarn format:check --write`. A failing step is
//! logged and the next one still runs; nothing here fails the scrape.

use std::process::ExitStatus;
use tokio::process::Command;

/// One external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatStep {
    pub program: String,
    pub args: Vec<String>,
}

impl FormatStep {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Summary of a formatter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatReport {
    /// A program was missing from PATH; nothing ran.
    Skipped { missing: String },
    /// All steps ran; `failed` lists those that exited unsuccessfully.
    Ran { steps: usize, failed: Vec<String> },
}

/// The sequence of commands run after a scrape.
#[derive(Debug, Clone)]
pub struct Formatter {
    steps: Vec<FormatStep>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(vec![
            FormatStep::new("yarn", &["install"]),
            FormatStep::new("yarn", &["format:check", "--write"]),
        ])
    }
}

impl Formatter {
    pub fn new(steps: Vec<FormatStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[FormatStep] {
        &self.steps
    }

    /// Run every step in order.
    pub async fn run(&self) -> FormatReport {
        for step in &self.steps {
            if which::which(&step.program).is_err() {
                tracing::warn!("{} not found on PATH, skipping formatting", step.program);
                return FormatReport::Skipped {
                    missing: step.program.clone(),
                };
            }
        }

        let mut failed = Vec::new();
        for step in &self.steps {
            let shown = step.display();
            tracing::info!("running {shown}");
            match self.spawn(step).await {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    tracing::warn!("{shown} exited with {status}");
                    failed.push(shown);
                }
                Err(e) => {
                    tracing::warn!("{shown} could not be started: {e}");
                    failed.push(shown);
                }
            }
        }

        FormatReport::Ran {
            steps: self.steps.len(),
            failed,
        }
    }

    async fn spawn(&self, step: &FormatStep) -> std::io::Result<ExitStatus> {
        Command::new(&step.program).args(&step.args).status().await
    }
}
