//! SSH transport against stand-in launcher scripts

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use workshop_stack::error::TransportError;
use workshop_stack::provision::{CommandConfig, CommandTransport, Connection, SshTransport};
use workshop_stack::resources::Secret;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn connection() -> Connection {
    Connection {
        host: "10.0.1.4".to_string(),
        user: "azureuser".to_string(),
        password: Secret::new("s3cret"),
    }
}

fn transport(program: &Path, timeout_secs: u64) -> SshTransport {
    SshTransport::new(CommandConfig::with_timeout_secs(timeout_secs))
        .with_program(program.to_string_lossy())
}

#[tokio::test]
async fn test_success_collects_output_and_passes_password_by_env() {
    let dir = TempDir::new().unwrap();
    let program = script(dir.path(), "ok.sh", r#"for last; do :; done
echo "pw=$SSHPASS"
echo "last=$last""#);

    let output = transport(&program, 10)
        .run(&connection(), "uptime")
        .await
        .unwrap();

    assert_eq!(output.stdout, ["pw=s3cret", "last=uptime"]);
}

#[tokio::test]
async fn test_non_zero_exit() {
    let dir = TempDir::new().unwrap();
    let program = script(dir.path(), "fail.sh", "echo boom >&2; exit 3");

    let err = transport(&program, 10)
        .run(&connection(), "uptime")
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::NonZeroExit { code: Some(3), .. }));
}

#[tokio::test]
async fn test_timeout_kills_command() {
    let dir = TempDir::new().unwrap();
    let program = script(dir.path(), "slow.sh", "sleep 30");

    let err = transport(&program, 1)
        .run(&connection(), "uptime")
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { timeout_secs: 1, .. }));
}

#[tokio::test]
async fn test_missing_program() {
    let dir = TempDir::new().unwrap();
    let err = transport(&dir.path().join("nope"), 1)
        .run(&connection(), "uptime")
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Spawn { .. }));
}
