//! Mock solver engines for integration tests.
//!
//! Each engine is a small `/bin/sh` script written into a temp dir. Scripts
//! that need to be killed `exec` into their long-running command so the pid
//! we spawned is the process that must disappear.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub struct MockEngine {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl MockEngine {
    pub fn with_script(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("TexasSolverConsole");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write engine script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod engine script");
        Self { dir, path }
    }

    /// Prints a progress line and then `json` on stdout.
    pub fn emitting(json: &str) -> Self {
        Self::with_script(&format!(
            "echo 'Iter: 1 exploitability 3.1'\ncat <<'__JSON__'\n{json}\n__JSON__"
        ))
    }

    pub fn sample_tree() -> Self {
        Self::emitting(SAMPLE_TREE)
    }

    /// Records its own pid, then becomes a long sleep.
    pub fn hanging() -> Self {
        let engine = Self::with_script("true");
        let pid_file = engine.pid_file();
        std::fs::write(
            &engine.path,
            format!("#!/bin/sh\necho $$ > '{}'\nexec sleep 30\n", pid_file.display()),
        )
        .expect("rewrite engine script");
        engine
    }

    /// Writes its argument vector, one per line, next to itself.
    pub fn recording_args() -> Self {
        let engine = Self::with_script("true");
        let args_file = engine.args_file();
        std::fs::write(
            &engine.path,
            format!(
                "#!/bin/sh\nfor a in \"$@\"; do echo \"$a\"; done > '{}'\ncat <<'__JSON__'\n{}\n__JSON__\n",
                args_file.display(),
                SAMPLE_TREE
            ),
        )
        .expect("rewrite engine script");
        engine
    }

    pub fn pid_file(&self) -> PathBuf {
        self.dir.path().join("engine.pid")
    }

    pub fn args_file(&self) -> PathBuf {
        self.dir.path().join("engine.args")
    }

    pub fn recorded_pid(&self) -> u32 {
        std::fs::read_to_string(self.pid_file())
            .expect("pid file")
            .trim()
            .parse()
            .expect("pid")
    }

    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.args_file())
            .expect("args file")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// A zombie waiting to be reaped counts as gone.
pub fn process_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(Path::new(&format!("/proc/{pid}/stat"))) else {
        return false;
    };
    match stat.rsplit_once(')') {
        Some((_, rest)) => !matches!(rest.trim_start().chars().next(), Some('Z' | 'X')),
        None => true,
    }
}

/// Polls until `pid` is gone or `within` elapses.
pub async fn wait_for_exit(pid: u32, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !process_alive(pid)
}

/// Polls for the pid a hanging engine records on startup.
pub async fn wait_for_pid(engine: &MockEngine, within: Duration) -> u32 {
    let deadline = Instant::now() + within;
    loop {
        if let Some(pid) = std::fs::read_to_string(engine.pid_file())
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            return pid;
        }
        assert!(Instant::now() < deadline, "engine never recorded its pid");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub const SAMPLE_TREE: &str = r#"{
  "node_type": "action_node",
  "player": 1,
  "actions": ["CHECK", "BET 5.000000"],
  "strategy": {
    "actions": ["CHECK", "BET 5.000000"],
    "strategy": {
      "AdAc": [0.25, 0.75],
      "KdKc": [0.75, 0.25]
    }
  },
  "childrens": {
    "CHECK": {
      "node_type": "action_node",
      "player": 0,
      "actions": ["CHECK", "BET 5.000000"],
      "strategy": {"strategy": {"AsKs": [0.5, 0.5], "AhKd": [1.0, 0.0]}},
      "childrens": {
        "CHECK": {"node_type": "chance_node", "dealcards": {"7c": {"node_type": "showdown_node"}}},
        "BET 5.000000": {"node_type": "terminal_node"}
      }
    },
    "BET 5.000000": {"node_type": "terminal_node"}
  }
}"#;
