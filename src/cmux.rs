use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use serde_json::Value;

use crate::config::CanopyConfig;

// cmux's own control vocabulary calls sessions "workspaces"; the subcommand
// and capability names below are the wire protocol, not ours.
pub const METHOD_CREATE: &str = "workspace.create";
pub const METHOD_RENAME: &str = "workspace.rename";
pub const METHOD_SELECT: &str = "workspace.select";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub status: String,
}

pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, String>;
}

pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|error| error.to_string())?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            status: output.status.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub methods: HashSet<String>,
}

impl Capabilities {
    pub fn supports(&self, method: &str) -> bool {
        self.methods.contains(method)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LiveSession {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "ref")]
    pub target_ref: String,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CapabilitiesResponse {
    #[serde(default)]
    methods: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ListSessionsResponse {
    #[serde(default)]
    workspaces: Vec<LiveSession>,
}

pub struct CmuxClient<R: CommandRunner> {
    binary: String,
    socket: Option<PathBuf>,
    runner: R,
}

impl CmuxClient<ProcessRunner> {
    pub fn from_config(config: &CanopyConfig) -> Self {
        Self::with_runner(
            config.cmux_binary.clone(),
            config.cmux_socket.clone(),
            ProcessRunner,
        )
    }
}

impl<R: CommandRunner> CmuxClient<R> {
    pub fn with_runner(binary: String, socket: Option<PathBuf>, runner: R) -> Self {
        Self {
            binary,
            socket,
            runner,
        }
    }

    fn invoke(
        &self,
        subcommand: &str,
        json_output: bool,
        extra: &[String],
    ) -> Result<String, String> {
        let mut args: Vec<String> = Vec::with_capacity(extra.len() + 4);
        if let Some(socket) = &self.socket {
            args.push("--socket".to_string());
            args.push(socket.to_string_lossy().to_string());
        }
        if json_output {
            args.push("--json".to_string());
        }
        args.push(subcommand.to_string());
        args.extend_from_slice(extra);

        let output = self
            .runner
            .run(&self.binary, &args)
            .map_err(|error| format!("cmux {subcommand}: {error}"))?;

        if !output.success {
            let stderr = output.stderr.trim();
            if stderr.is_empty() {
                return Err(format!("cmux {subcommand}: {}", output.status));
            }
            return Err(format!("cmux {subcommand}: {stderr}"));
        }

        Ok(output.stdout)
    }

    pub fn capabilities(&self) -> Result<Capabilities, String> {
        let stdout = self.invoke("capabilities", true, &[])?;
        let response: CapabilitiesResponse = serde_json::from_str(&stdout)
            .map_err(|error| format!("cmux capabilities: parse response: {error}"))?;
        Ok(Capabilities {
            methods: response.methods.into_iter().collect(),
        })
    }

    pub fn create_session_with_command(&self, init_command: &str) -> Result<String, String> {
        if init_command.trim().is_empty() {
            return Err("cmux new-workspace: init command is required".to_string());
        }
        let stdout = self.invoke(
            "new-workspace",
            false,
            &["--command".to_string(), init_command.to_string()],
        )?;

        let line = stdout.trim();
        let Some(id) = line.strip_prefix("OK ") else {
            return Err(format!("cmux new-workspace: unexpected response: {line:?}"));
        };
        let id = id.trim();
        if id.is_empty() {
            return Err("cmux new-workspace: response carried no session id".to_string());
        }
        Ok(id.to_string())
    }

    pub fn rename_session(&self, session_id: &str, title: &str) -> Result<(), String> {
        if session_id.trim().is_empty() {
            return Err("cmux rename-workspace: session id is required".to_string());
        }
        if title.trim().is_empty() {
            return Err("cmux rename-workspace: title is required".to_string());
        }
        self.invoke(
            "rename-workspace",
            false,
            &[
                "--workspace".to_string(),
                session_id.to_string(),
                "--title".to_string(),
                title.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn select_session(&self, session_id: &str) -> Result<(), String> {
        if session_id.trim().is_empty() {
            return Err("cmux select-workspace: session id is required".to_string());
        }
        self.invoke(
            "select-workspace",
            false,
            &["--workspace".to_string(), session_id.to_string()],
        )?;
        Ok(())
    }

    pub fn list_sessions(&self) -> Result<Vec<LiveSession>, String> {
        let stdout = self.invoke("list-workspaces", true, &[])?;
        let response: ListSessionsResponse = serde_json::from_str(&stdout)
            .map_err(|error| format!("cmux list-workspaces: parse response: {error}"))?;
        Ok(response.workspaces)
    }

    pub fn identify(&self, session_id: &str, surface: &str) -> Result<Value, String> {
        if session_id.trim().is_empty() {
            return Err("cmux identify: session id is required".to_string());
        }
        let mut extra = vec!["--workspace".to_string(), session_id.to_string()];
        if !surface.trim().is_empty() {
            extra.push("--surface".to_string());
            extra.push(surface.to_string());
        }
        let stdout = self.invoke("identify", true, &extra)?;
        serde_json::from_str(&stdout)
            .map_err(|error| format!("cmux identify: parse response: {error}"))
    }
}

impl<R: CommandRunner> crate::service::SessionBackend for CmuxClient<R> {
    fn capabilities(&self) -> Result<Capabilities, String> {
        CmuxClient::capabilities(self)
    }

    fn create_session_with_command(&self, init_command: &str) -> Result<String, String> {
        CmuxClient::create_session_with_command(self, init_command)
    }

    fn rename_session(&self, session_id: &str, title: &str) -> Result<(), String> {
        CmuxClient::rename_session(self, session_id, title)
    }

    fn select_session(&self, session_id: &str) -> Result<(), String> {
        CmuxClient::select_session(self, session_id)
    }

    fn list_sessions(&self) -> Result<Vec<LiveSession>, String> {
        CmuxClient::list_sessions(self)
    }

    fn identify(&self, session_id: &str, surface: &str) -> Result<Value, String> {
        CmuxClient::identify(self, session_id, surface)
    }
}

pub struct CmuxBackendFactory {
    config: CanopyConfig,
}

impl CmuxBackendFactory {
    pub fn new(config: CanopyConfig) -> Self {
        Self { config }
    }
}

impl crate::service::BackendFactory for CmuxBackendFactory {
    type Backend = CmuxClient<ProcessRunner>;

    fn connect(&self) -> Self::Backend {
        CmuxClient::from_config(&self.config)
    }
}
