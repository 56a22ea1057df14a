//! Stress test runner
//!
//! This module provides the `stress` subcommand, which runs `cargo test`
//! over and over until a run fails. Races between lookups and transfers
//! only show up under some schedules, so a single green run proves little.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Instant;

/// Test target run by `--loom` when no `--test` is given. Doctests and the
/// regular suites build caches outside `loom::model` and cannot run under loom.
const LOOM_TEST_TARGET: &str = "concurrent_sorted_cache_loom_tests";

/// Arguments for the stress subcommand
#[derive(Args, Debug)]
pub struct StressArgs {
    /// Number of runs; 0 repeats until a failure
    #[arg(long, short = 'n', default_value_t = 100)]
    pub runs: u32,

    /// Restrict each run to one test target (e.g. concurrent_sorted_cache_thread_tests)
    #[arg(long)]
    pub test: Option<String>,

    /// Comma-separated features to enable (e.g. serde)
    #[arg(long)]
    pub features: Option<String>,

    /// Build and run the tests in release mode
    #[arg(long)]
    pub release: bool,

    /// Run the loom model checks instead of the regular suite
    /// (defaults the test target to concurrent_sorted_cache_loom_tests)
    #[arg(long)]
    pub loom: bool,
}

impl StressArgs {
    fn target(&self) -> Option<&str> {
        match (&self.test, self.loom) {
            (Some(target), _) => Some(target.as_str()),
            (None, true) => Some(LOOM_TEST_TARGET),
            (None, false) => None,
        }
    }

    fn test_command(&self, root: &Path) -> Command {
        let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let mut cmd = Command::new(cargo);
        cmd.current_dir(root).args(["test", "--package", "sortmru"]);

        if let Some(target) = self.target() {
            cmd.args(["--test", target]);
        }
        if let Some(features) = &self.features {
            cmd.args(["--features", features]);
        }
        if self.release {
            cmd.arg("--release");
        }
        if self.loom {
            let existing = env::var("RUSTFLAGS").unwrap_or_default();
            cmd.env("RUSTFLAGS", format!("{existing} --cfg loom").trim_start());
        }
        cmd
    }

    fn describe(&self) -> String {
        let mut parts = vec!["cargo test --package sortmru".to_string()];
        if let Some(target) = self.target() {
            parts.push(format!("--test {target}"));
        }
        if let Some(features) = &self.features {
            parts.push(format!("--features {features}"));
        }
        if self.release {
            parts.push("--release".to_string());
        }
        if self.loom {
            parts.insert(0, "RUSTFLAGS=\"--cfg loom\"".to_string());
        }
        parts.join(" ")
    }
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    // xtask is in project_root/xtask, so go up one level
    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map_or_else(|| manifest_dir.clone(), PathBuf::from)
    } else {
        manifest_dir
    }
}

fn report_failure(run: u32, output: &Output) {
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |code| code.to_string());
    eprintln!("--- Result: FAILED (exit code: {code}) ---");
    eprintln!();
    eprintln!("--- STDOUT (run {run}) ---");
    eprintln!("{}", String::from_utf8_lossy(&output.stdout));
    eprintln!();
    eprintln!("--- STDERR (run {run}) ---");
    eprintln!("{}", String::from_utf8_lossy(&output.stderr));
}

/// Run the stress loop
pub fn run(args: &StressArgs) -> Result<()> {
    let root = project_root();
    let started = Instant::now();

    eprintln!("==============================================");
    eprintln!("  Stress Test Runner (xtask)");
    eprintln!("==============================================");
    eprintln!("  Command: {}", args.describe());
    if args.runs == 0 {
        eprintln!("  Runs:    until failure");
    } else {
        eprintln!("  Runs:    {}", args.runs);
    }
    eprintln!();

    let mut run = 0;
    while args.runs == 0 || run < args.runs {
        run += 1;
        eprintln!("--- [ Run {run} ] ---");

        let output = args
            .test_command(&root)
            .output()
            .with_context(|| format!("Failed to run `{}`", args.describe()))?;

        if !output.status.success() {
            report_failure(run, &output);
            bail!(
                "test suite failed on run {run} after {:.1?}",
                started.elapsed()
            );
        }
        eprintln!("--- Result: PASSED ---");
    }

    eprintln!();
    eprintln!("All {run} runs passed in {:.1?}.", started.elapsed());
    Ok(())
}
