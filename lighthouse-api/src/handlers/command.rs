//! Handlers that run a local program.

use async_trait::async_trait;
use lighthouse_core::{ActionHandler, ArgValue};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{json, Map, Value};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::config::CommandOutput;
use crate::constants::{RESULT_FAILED, RESULT_SUCCESS};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("Invalid placeholder regex"));

/// Number of positional arguments a template references (highest index + 1).
pub fn template_arity(templates: &[String]) -> usize {
    templates
        .iter()
        .flat_map(|t| PLACEHOLDER.captures_iter(t))
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .map(|idx| idx + 1)
        .max()
        .unwrap_or(0)
}

/// Substitute `{N}` with the N-th argument. Out-of-range placeholders stay
/// as written.
pub fn render_args(templates: &[String], args: &[ArgValue]) -> Vec<String> {
    templates
        .iter()
        .map(|t| {
            PLACEHOLDER
                .replace_all(t, |caps: &Captures<'_>| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|idx| args.get(idx))
                        .map(ToString::to_string)
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned()
        })
        .collect()
}

/// Runs `program` with templated arguments and reports the outcome.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    action: String,
    program: String,
    args: Vec<String>,
    output: CommandOutput,
    arity: usize,
    timeout: Option<Duration>,
}

impl CommandHandler {
    pub fn new(action: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        let arity = template_arity(&args);
        Self {
            action: action.into(),
            program: program.into(),
            args,
            output: CommandOutput::Status,
            arity,
            timeout: None,
        }
    }

    pub fn with_output(mut self, output: CommandOutput) -> Self {
        self.output = output;
        self
    }

    /// Override the arity derived from the placeholders.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn run(&self, argv: Vec<String>) -> Result<Output, String> {
        let mut command = Command::new(&self.program);
        command
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, args = ?argv, "Running handler command");
        let output = command.output();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| format!("timed out after {:?}", limit))?,
            None => output.await,
        };
        result.map_err(|e| format!("failed to run {}: {}", self.program, e))
    }

    fn status_payload(&self, args: &[ArgValue], outcome: Result<Output, String>) -> Value {
        let mut response = Map::new();
        response.insert("action".to_string(), json!(self.action));
        match args {
            [] => {}
            [single] => {
                response.insert("target".to_string(), json!(single));
            }
            many => {
                response.insert("target".to_string(), json!(many));
            }
        }

        // A non-zero exit with empty stderr fails without an `error` field.
        let (succeeded, error) = match outcome {
            Ok(output) if output.status.success() => (true, None),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                (false, Some(stderr).filter(|s| !s.is_empty()))
            }
            Err(e) => (false, Some(e)),
        };
        let result = if succeeded { RESULT_SUCCESS } else { RESULT_FAILED };
        response.insert("result".to_string(), json!(result));
        if let Some(error) = error {
            response.insert("error".to_string(), json!(error));
        }
        Value::Object(response)
    }

    fn lines_payload(&self, field: &str, outcome: Result<Output, String>) -> Value {
        let lines = match outcome {
            Ok(output) if output.status.success() => Some(
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(|line| line.trim_end().to_string())
                    .collect::<Vec<_>>(),
            ),
            Ok(output) => {
                tracing::warn!(
                    program = %self.program,
                    status = %output.status,
                    "Handler command failed"
                );
                None
            }
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "Handler command failed");
                None
            }
        };
        let result = if lines.is_some() { RESULT_SUCCESS } else { RESULT_FAILED };

        let mut response = Map::new();
        response.insert("action".to_string(), json!(self.action));
        response.insert(field.to_string(), json!(lines));
        response.insert("result".to_string(), json!(result));
        Value::Object(response)
    }
}

#[async_trait]
impl ActionHandler for CommandHandler {
    fn arity(&self) -> usize {
        self.arity
    }

    async fn call(&self, args: Vec<ArgValue>) -> Value {
        let argv = render_args(&self.args, &args);
        let outcome = self.run(argv).await;
        match &self.output {
            CommandOutput::Status => self.status_payload(&args, outcome),
            CommandOutput::Lines { field } => self.lines_payload(field, outcome),
        }
    }
}
