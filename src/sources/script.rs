//! Script sources: trusted executable content whose output is configuration.
//!
//! Nothing is registered by default. An evaluator runs with the full
//! privileges of the host process, so only register one for files you
//! control. Unlike the strict decoders, a failing script contributes an
//! empty map to the merge instead of aborting the load.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// What a script evaluated to.
pub enum ScriptOutput {
    /// The configuration value itself.
    Value(Value),
    /// A zero-argument producer, invoked once by the loader.
    Producer(Box<dyn FnOnce() -> Value + Send>),
}

impl ScriptOutput {
    /// Collapse to a value, invoking the producer if there is one.
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Producer(produce) => produce(),
        }
    }
}

impl From<Value> for ScriptOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for ScriptOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Evaluates a script source.
#[async_trait]
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluate the script at `path`.
    ///
    /// # Errors
    ///
    /// Any error message is logged and replaced by an empty contribution.
    async fn evaluate(&self, path: &Path) -> std::result::Result<ScriptOutput, String>;
}

/// Runs the file as a program and decodes its standard output as JSON.
///
/// # Examples
///
/// ```rust,no_run
/// use layerstack_config::prelude::*;
/// use layerstack_config::sources::CommandEvaluator;
///
/// # async fn example() -> Result<()> {
/// let config = ConfigAccessor::builder()
///     .with_script("sh", CommandEvaluator::new().with_interpreter("sh"))
///     .with_file("config/generated.sh")
///     .build_and_load()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "script")]
#[derive(Debug, Default, Clone)]
pub struct CommandEvaluator {
    interpreter: Option<String>,
}

#[cfg(feature = "script")]
impl CommandEvaluator {
    /// Execute script files directly.
    pub fn new() -> Self {
        Self { interpreter: None }
    }

    /// Run script files through an interpreter (e.g. `sh`, `python3`).
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }
}

#[cfg(feature = "script")]
#[async_trait]
impl ScriptEvaluator for CommandEvaluator {
    async fn evaluate(&self, path: &Path) -> std::result::Result<ScriptOutput, String> {
        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let mut command = tokio::process::Command::new(interpreter);
                command.arg(path);
                command
            }
            None => tokio::process::Command::new(path),
        };
        let output = command
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", path.display(), e))?;
        if !output.status.success() {
            return Err(format!("{} exited with {}", path.display(), output.status));
        }
        serde_json::from_slice(&output.stdout)
            .map(ScriptOutput::Value)
            .map_err(|e| format!("invalid JSON output from {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_output() {
        let output = ScriptOutput::from(json!({"a": 1}));
        assert_eq!(output.into_value(), json!({"a": 1}));
    }

    #[test]
    fn test_producer_output() {
        let output = ScriptOutput::Producer(Box::new(|| json!({"generated": true})));
        assert_eq!(output.into_value(), json!({"generated": true}));
    }

    #[cfg(all(feature = "script", unix))]
    #[tokio::test]
    async fn test_command_evaluator_reads_stdout() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let script = temp_dir.path().join("gen.sh");
        std::fs::write(&script, "echo '{\"port\": 9090}'\n").unwrap();

        let evaluator = CommandEvaluator::new().with_interpreter("sh");
        let output = evaluator.evaluate(&script).await.unwrap();
        assert_eq!(output.into_value(), json!({"port": 9090}));
    }

    #[cfg(all(feature = "script", unix))]
    #[tokio::test]
    async fn test_command_evaluator_failure() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let script = temp_dir.path().join("fail.sh");
        std::fs::write(&script, "exit 3\n").unwrap();

        let evaluator = CommandEvaluator::new().with_interpreter("sh");
        assert!(evaluator.evaluate(&script).await.is_err());
    }
}
