use solvegate_core::HandDescriptor;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Everything the engine printed on a clean exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEngineOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("solver engine exceeded its time budget of {budget:?}")]
    Timeout { budget: Duration },
    #[error("failed to start solver engine at {}: {reason}", path.display())]
    SpawnFailure { path: PathBuf, reason: String },
    #[error("solver engine failed ({status})")]
    EngineFailure { status: String, stderr: String },
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Timeout { .. } => "timeout",
            EngineError::SpawnFailure { .. } => "spawn_failure",
            EngineError::EngineFailure { .. } => "engine_failure",
        }
    }
}

/// Runs the external solving engine, one child process per call.
#[derive(Debug, Clone)]
pub struct EngineInvoker {
    default_budget: Duration,
}

impl EngineInvoker {
    pub fn new(default_budget: Duration) -> Self {
        Self { default_budget }
    }

    pub fn default_budget(&self) -> Duration {
        self.default_budget
    }

    /// Spawns the engine for `descriptor` and waits for it within the
    /// descriptor's budget, or the default one.
    ///
    /// The child gets no stdin and its output is captured. It is killed on
    /// timeout, and also when the returned future is dropped before
    /// completion, so an abandoned request never leaves an engine running.
    pub async fn invoke(
        &self,
        descriptor: &HandDescriptor,
        engine_path: &Path,
    ) -> Result<RawEngineOutput, EngineError> {
        let budget = descriptor.time_budget.unwrap_or(self.default_budget);
        run_engine(engine_path, build_args(descriptor), budget).await
    }
}

/// Argument vector for the engine. Order is fixed: core spot description,
/// tuning knobs, then bet sizes by key.
pub fn build_args(descriptor: &HandDescriptor) -> Vec<OsString> {
    let mut args: Vec<String> = vec![
        "--board".into(),
        descriptor.board.to_string(),
        "--oop-range".into(),
        descriptor.oop_range.to_string(),
        "--ip-range".into(),
        descriptor.ip_range.to_string(),
        "--pot-size".into(),
        descriptor.pot_size.to_string(),
        "--effective-stack".into(),
        descriptor.effective_stack.to_string(),
        "--position".into(),
        descriptor.position.to_string(),
        "--accuracy".into(),
        descriptor.tuning.accuracy.to_string(),
        "--max-iterations".into(),
        descriptor.tuning.max_iterations.to_string(),
        "--thread-count".into(),
        descriptor.tuning.thread_count.to_string(),
        "--use-isomorphism".into(),
        descriptor.tuning.use_isomorphism.to_string(),
    ];
    if let Some(sizing) = &descriptor.bet_sizing {
        for (key, sizes) in sizing.iter() {
            let joined = sizes
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            args.push("--bet-size".into());
            args.push(format!("{key}={joined}"));
        }
    }
    args.into_iter().map(OsString::from).collect()
}

pub(crate) async fn run_engine(
    engine_path: &Path,
    args: Vec<OsString>,
    budget: Duration,
) -> Result<RawEngineOutput, EngineError> {
    let started = Instant::now();
    let mut child = Command::new(engine_path)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| EngineError::SpawnFailure {
            path: engine_path.to_path_buf(),
            reason: err.to_string(),
        })?;

    tracing::debug!(
        engine_path = %engine_path.display(),
        pid = child.id().unwrap_or_default(),
        budget_ms = budget.as_millis() as u64,
        "solver engine spawned"
    );

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let outcome = {
        let collect = async {
            tokio::try_join!(child.wait(), drain(stdout), drain(stderr))
        };
        tokio::time::timeout(budget, collect).await
    };

    match outcome {
        Ok(Ok((status, stdout, stderr))) => {
            let elapsed = started.elapsed();
            let stdout = String::from_utf8_lossy(&stdout).into_owned();
            let stderr = String::from_utf8_lossy(&stderr).into_owned();
            if status.success() {
                Ok(RawEngineOutput {
                    stdout,
                    stderr,
                    elapsed,
                })
            } else {
                Err(EngineError::EngineFailure {
                    status: describe_status(status),
                    stderr,
                })
            }
        }
        Ok(Err(err)) => {
            terminate(&mut child).await;
            Err(EngineError::EngineFailure {
                status: "output collection failed".into(),
                stderr: err.to_string(),
            })
        }
        Err(_) => {
            terminate(&mut child).await;
            Err(EngineError::Timeout { budget })
        }
    }
}

async fn drain<R>(pipe: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kills the child and reaps it.
async fn terminate(child: &mut tokio::process::Child) {
    let pid = child.id();
    if let Err(err) = child.kill().await {
        tracing::warn!(pid = ?pid, error = %err, "failed to kill solver engine");
    } else {
        tracing::debug!(pid = ?pid, "solver engine killed");
    }
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {signal}");
        }
    }
    "unknown exit status".into()
}
