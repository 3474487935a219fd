#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Credential file inside an isolated test directory.
pub fn store_path(dir: &Path) -> PathBuf {
    dir.join("credentials.json")
}

/// Run the CLI binary against an isolated credential file.
pub fn run_cli(args: &[&str], store: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_authfetch"));
    cmd.arg("--store").arg(store);
    cmd.args(args);
    cmd.env_remove("AUTHFETCH_BASE_URL");
    cmd.env_remove("AUTHFETCH_STORE");
    cmd.env("NO_COLOR", "1");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], store: &Path) -> String {
    let output = run_cli(args, store);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure.
pub fn run_cli_failure(args: &[&str], store: &Path) -> String {
    let output = run_cli(args, store);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Store both tokens through the CLI.
pub fn login(store: &Path, access: &str, refresh: &str) {
    run_cli_success(
        &["login", "--access-token", access, "--refresh-token", refresh],
        store,
    );
}

/// Parse `status --json` output into (key, stored) pairs.
pub fn stored_keys(store: &Path) -> Vec<(String, bool)> {
    let stdout = run_cli_success(&["status", "--json"], store);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["key"].as_str().unwrap().to_string(),
                s["stored"].as_bool().unwrap(),
            )
        })
        .collect()
}
