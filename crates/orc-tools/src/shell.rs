//! The `shell` toolset (spec §4.2 "Shell tool security"). Two modes: strict
//! (the command must be in the agent's allow-list) and permissive (any
//! command). The mode is fixed at agent construction and never elevated at
//! run time.

use std::collections::HashMap;
use std::time::Duration;

use orc_domain::config::ShellMode;
use orc_domain::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;

#[derive(Debug, Clone, Deserialize)]
pub struct ShellRequest {
    pub command: String,
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Blocked regardless of mode: overriding these can redirect the shell's
/// own interpreter or loader, defeating any allow-list.
fn is_dangerous_env_var(name: &str) -> bool {
    const BLOCKED: &[&str] = &[
        "LD_PRELOAD", "LD_LIBRARY_PATH", "LD_AUDIT",
        "DYLD_INSERT_LIBRARIES", "DYLD_LIBRARY_PATH",
        "PATH", "HOME", "SHELL", "IFS", "BASH_ENV", "ENV",
    ];
    BLOCKED.contains(&name.to_ascii_uppercase().as_str())
}

/// Extract the leading command word (e.g. `"ls -la"` -> `"ls"`) used for
/// the strict-mode allow-list check.
fn leading_command(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or("")
}

pub async fn run(
    mode: ShellMode,
    allow: &[String],
    req: ShellRequest,
    timeout: Duration,
) -> Result<Value> {
    if mode == ShellMode::Strict {
        let leading = leading_command(&req.command);
        if !allow.iter().any(|a| a == leading) {
            return Err(Error::InvalidInput(format!(
                "command '{leading}' is not in the strict-mode allow-list"
            )));
        }
    }

    for name in req.env.keys() {
        if is_dangerous_env_var(name) {
            return Err(Error::InvalidInput(format!(
                "environment variable '{name}' is blocked by security policy"
            )));
        }
    }

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(&req.command);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    if let Some(wd) = &req.workdir {
        cmd.current_dir(wd);
    }
    for (k, v) in &req.env {
        cmd.env(k, v);
    }

    let child = cmd
        .spawn()
        .map_err(|e| Error::Internal(format!("failed to spawn shell: {e}")))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::ToolTimeout {
            tool: "shell".to_string(),
            elapsed_ms: timeout.as_millis() as u64,
        })?
        .map_err(|e| Error::Internal(format!("shell wait failed: {e}")))?;

    Ok(serde_json::json!({
        "exit_code": output.status.code(),
        "stdout": String::from_utf8_lossy(&output.stdout),
        "stderr": String::from_utf8_lossy(&output.stderr),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn strict_mode_rejects_commands_outside_allow_list() {
        let req = ShellRequest {
            command: "rm -rf /".to_string(),
            workdir: None,
            env: HashMap::new(),
        };
        let result = run(ShellMode::Strict, &["ls".to_string()], req, Duration::from_secs(5)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn strict_mode_allows_listed_command() {
        let req = ShellRequest {
            command: "echo hi".to_string(),
            workdir: None,
            env: HashMap::new(),
        };
        let result = run(ShellMode::Strict, &["echo".to_string()], req, Duration::from_secs(5)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn dangerous_env_var_is_rejected_in_any_mode() {
        let mut env = HashMap::new();
        env.insert("LD_PRELOAD".to_string(), "evil.so".to_string());
        let req = ShellRequest { command: "echo hi".to_string(), workdir: None, env };
        let result = run(ShellMode::Permissive, &[], req, Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
