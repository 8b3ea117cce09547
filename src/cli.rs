use std::io::Write;
use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::domain::{dedupe_workspace_ids, validate_workspace_id, workspace_id_error_message};
use crate::event_log::{Event, EventLogger};
use crate::paths;
use crate::service::{
    BackendFactory, EntryCandidate, ErrorCode, OpenOutcome, SelectionError, SessionService,
    SwitchSelector, WorkspaceCandidate,
};

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

const USAGE: &str = "usage: canopy <command> [flags]

commands:
  open    open workspaces as cmux sessions
  list    list mapped cmux sessions (prunes stale entries)
  status  show mapped cmux sessions with live state
  switch  select a mapped cmux session

global flags:
  --event-log <path>  append JSONL events to <path>
";

const OPEN_USAGE: &str = "usage: canopy open [flags] [workspace-id]

flags:
  --workspace <id>     target workspace (repeatable)
  --multi              allow multiple targets
  --concurrency <n>    parallel workers (requires --multi)
  --format <fmt>       output format: human, json
";

const LIST_USAGE: &str = "usage: canopy list [flags]

flags:
  --workspace <id>     only this workspace
  --format <fmt>       output format: human, json
";

const STATUS_USAGE: &str = "usage: canopy status [flags]

flags:
  --workspace <id>     only this workspace
  --format <fmt>       output format: human, json
";

const SWITCH_USAGE: &str = "usage: canopy switch [flags]

flags:
  --workspace <id>     workspace to switch to
  --session <id>       cmux session to switch to
  --format <fmt>       output format: human, json
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub struct Cli<'a, F: BackendFactory> {
    pub service: &'a SessionService<F>,
    pub selector: Option<&'a dyn SwitchSelector>,
    pub logger: &'a dyn EventLogger,
    pub cwd: PathBuf,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl<F: BackendFactory> Cli<'_, F> {
    pub fn run(&mut self, args: &[String]) -> i32 {
        let Some(command) = args.first() else {
            let _ = write!(self.err, "{USAGE}");
            return EXIT_USAGE;
        };
        match command.as_str() {
            "open" => self.run_open(&args[1..]),
            "list" => self.run_list(&args[1..]),
            "status" => self.run_status(&args[1..]),
            "switch" => self.run_switch(&args[1..]),
            "-h" | "--help" | "help" => {
                let _ = write!(self.out, "{USAGE}");
                EXIT_OK
            }
            unknown => {
                let _ = writeln!(self.err, "unknown command: {unknown:?}");
                let _ = write!(self.err, "{USAGE}");
                EXIT_USAGE
            }
        }
    }

    fn run_open(&mut self, args: &[String]) -> i32 {
        let mut format = OutputFormat::Human;
        let mut multi = false;
        let mut concurrency: usize = 1;
        let mut target_ids: Vec<String> = Vec::new();
        let mut positionals: Vec<String> = Vec::new();

        let mut iter = args.iter();
        while let Some(argument) = iter.next() {
            match argument.as_str() {
                "-h" | "--help" | "help" => {
                    let _ = write!(self.out, "{OPEN_USAGE}");
                    return EXIT_OK;
                }
                "--multi" => multi = true,
                "--format" => {
                    let Some(value) = iter.next() else {
                        return self.usage_error("open", OPEN_USAGE, "--format requires a value");
                    };
                    match OutputFormat::parse(value.trim()) {
                        Some(parsed) => format = parsed,
                        None => {
                            return self.usage_error(
                                "open",
                                OPEN_USAGE,
                                &format!(
                                    "unsupported --format: {:?} (supported: human, json)",
                                    value.trim()
                                ),
                            );
                        }
                    }
                }
                "--concurrency" => {
                    let Some(value) = iter.next() else {
                        return self.usage_error(
                            "open",
                            OPEN_USAGE,
                            "--concurrency requires a value",
                        );
                    };
                    match parse_positive_int(value.trim(), "--concurrency") {
                        Ok(parsed) => concurrency = parsed,
                        Err(message) => return self.usage_error("open", OPEN_USAGE, &message),
                    }
                }
                "--workspace" => {
                    let Some(value) = iter.next() else {
                        return self.usage_error("open", OPEN_USAGE, "--workspace requires a value");
                    };
                    target_ids.push(value.trim().to_string());
                }
                other => {
                    if let Some(value) = other.strip_prefix("--format=") {
                        match OutputFormat::parse(value.trim()) {
                            Some(parsed) => format = parsed,
                            None => {
                                return self.usage_error(
                                    "open",
                                    OPEN_USAGE,
                                    &format!(
                                        "unsupported --format: {:?} (supported: human, json)",
                                        value.trim()
                                    ),
                                );
                            }
                        }
                        continue;
                    }
                    if let Some(value) = other.strip_prefix("--concurrency=") {
                        match parse_positive_int(value.trim(), "--concurrency") {
                            Ok(parsed) => concurrency = parsed,
                            Err(message) => return self.usage_error("open", OPEN_USAGE, &message),
                        }
                        continue;
                    }
                    if let Some(value) = other.strip_prefix("--workspace=") {
                        target_ids.push(value.trim().to_string());
                        continue;
                    }
                    if other.starts_with('-') {
                        return self.usage_error(
                            "open",
                            OPEN_USAGE,
                            &format!("unknown flag for open: {other:?}"),
                        );
                    }
                    positionals.push(other.to_string());
                }
            }
        }

        if positionals.len() > 1 {
            return self.usage_error(
                "open",
                OPEN_USAGE,
                &format!("unexpected args for open: {:?}", positionals[1..].join(" ")),
            );
        }
        target_ids.extend(positionals);
        let target_ids = dedupe_workspace_ids(&target_ids);

        if concurrency > 1 && !multi {
            return self.command_error("open", format, ErrorCode::InvalidArgument, "", "--concurrency requires --multi", EXIT_USAGE);
        }
        if !multi && target_ids.len() > 1 {
            return self.command_error("open", format, ErrorCode::InvalidArgument, "", "multiple targets require --multi", EXIT_USAGE);
        }
        if target_ids.is_empty() {
            return self.command_error("open", format, ErrorCode::InvalidArgument, "", "workspace id is required", EXIT_USAGE);
        }
        for workspace_id in &target_ids {
            if let Err(error) = validate_workspace_id(workspace_id) {
                let message = format!(
                    "invalid workspace id: {}",
                    workspace_id_error_message(&error)
                );
                return self.command_error("open", format, ErrorCode::InvalidArgument, workspace_id, &message, EXIT_USAGE);
            }
        }
        let workspace_hint = if target_ids.len() == 1 {
            target_ids[0].clone()
        } else {
            String::new()
        };

        let root = match self.resolve_root() {
            Ok(root) => root,
            Err(message) => {
                return self.command_error("open", format, ErrorCode::Internal, &workspace_hint, &message, EXIT_ERROR);
            }
        };

        let outcome = match self.service.open(&root, &target_ids, concurrency, multi) {
            Ok(outcome) => outcome,
            Err(error) => {
                let exit_code = exit_code_for(error.code);
                return self.command_error("open", format, error.code, &workspace_hint, &error.message, exit_code);
            }
        };

        let outcome_kind = if outcome.failures.is_empty() { "ok" } else { "partial" };
        self.logger.log(
            Event::new("open", outcome_kind)
                .with_data("succeeded", json!(outcome.results.len()))
                .with_data("failed", json!(outcome.failures.len())),
        );
        self.write_open_result(format, multi, &outcome)
    }

    fn write_open_result(&mut self, format: OutputFormat, multi: bool, outcome: &OpenOutcome) -> i32 {
        let single = !multi && outcome.results.len() == 1 && outcome.failures.is_empty();
        if format == OutputFormat::Json {
            if single {
                let result = &outcome.results[0];
                self.write_json(&envelope(
                    true,
                    "open",
                    &result.workspace_id,
                    Some(opened_session_json(result)),
                    None,
                ));
                return EXIT_OK;
            }
            let items: Vec<Value> = outcome.results.iter().map(opened_session_json).collect();
            let failures: Vec<Value> = outcome
                .failures
                .iter()
                .map(|failure| {
                    json!({
                        "workspace_id": failure.workspace_id,
                        "code": failure.code.as_str(),
                        "message": failure.message,
                    })
                })
                .collect();
            let result = json!({
                "count": items.len() + failures.len(),
                "succeeded": items.len(),
                "failed": failures.len(),
                "items": items,
                "failures": failures,
            });
            if outcome.failures.is_empty() {
                self.write_json(&envelope(true, "open", "", Some(result), None));
                return EXIT_OK;
            }
            self.write_json(&envelope(
                false,
                "open",
                "",
                Some(result),
                Some((ErrorCode::PartialFailure.as_str(), "some workspaces failed to open")),
            ));
            return EXIT_ERROR;
        }

        if single {
            let result = &outcome.results[0];
            let _ = writeln!(self.out, "opened cmux session");
            let _ = writeln!(self.out, "  workspace: {}", result.workspace_id);
            let _ = writeln!(self.out, "  session: {}", result.session_id);
            let _ = writeln!(self.out, "  title: {}", result.title);
            let _ = writeln!(self.out, "  cwd: {}", result.worktree_path.display());
            return EXIT_OK;
        }

        let total = outcome.results.len() + outcome.failures.len();
        let _ = writeln!(self.out, "opened {} / {}", outcome.results.len(), total);
        for result in &outcome.results {
            let _ = writeln!(self.out, "  {} => {}", result.workspace_id, result.session_id);
            let _ = writeln!(self.out, "    title: {}", result.title);
            let _ = writeln!(self.out, "    cwd: {}", result.worktree_path.display());
        }
        if !outcome.failures.is_empty() {
            let _ = writeln!(self.out, "  failed: {}", outcome.failures.len());
            for failure in &outcome.failures {
                let _ = writeln!(
                    self.err,
                    "open ({}): {} ({})",
                    failure.workspace_id,
                    failure.message,
                    failure.code.as_str()
                );
            }
            return EXIT_ERROR;
        }
        EXIT_OK
    }

    fn run_list(&mut self, args: &[String]) -> i32 {
        let (format, workspace_id) = match self.parse_scoped_flags("list", LIST_USAGE, args) {
            Ok(parsed) => parsed,
            Err(exit_code) => return exit_code,
        };

        let root = match self.resolve_root() {
            Ok(root) => root,
            Err(message) => {
                return self.command_error("list", format, ErrorCode::Internal, &workspace_id, &message, EXIT_ERROR);
            }
        };

        let outcome = match self.service.list(&root, &workspace_id) {
            Ok(outcome) => outcome,
            Err(error) => {
                let exit_code = exit_code_for(error.code);
                return self.command_error("list", format, error.code, &workspace_id, &error.message, exit_code);
            }
        };

        self.logger.log(
            Event::new("list", "ok")
                .with_data("rows", json!(outcome.rows.len()))
                .with_data("pruned", json!(outcome.pruned_count)),
        );

        if format == OutputFormat::Json {
            let items: Vec<Value> = outcome
                .rows
                .iter()
                .map(|row| {
                    json!({
                        "workspace_id": row.workspace_id,
                        "session_id": row.session_id,
                        "ordinal": row.ordinal,
                        "title": row.title,
                        "last_used_at": row.last_used_at,
                    })
                })
                .collect();
            let mut result = json!({
                "items": items,
                "runtime_checked": outcome.runtime_checked,
                "pruned_count": outcome.pruned_count,
            });
            if let Some(warning) = &outcome.warning
                && let Value::Object(object) = &mut result
            {
                object.insert("warning".to_string(), json!(warning));
            }
            self.write_json(&envelope(true, "list", &workspace_id, Some(result), None));
            return EXIT_OK;
        }

        if let Some(warning) = &outcome.warning {
            let _ = writeln!(self.err, "warning: {warning}");
        }
        if outcome.rows.is_empty() {
            let _ = writeln!(self.out, "no cmux sessions mapped");
            return EXIT_OK;
        }
        for row in &outcome.rows {
            let _ = writeln!(
                self.out,
                "{}  [{}]  {}  {}",
                row.workspace_id, row.ordinal, row.session_id, row.title
            );
        }
        if outcome.pruned_count > 0 {
            let _ = writeln!(self.out, "pruned {} stale entries", outcome.pruned_count);
        }
        EXIT_OK
    }

    fn run_status(&mut self, args: &[String]) -> i32 {
        let (format, workspace_id) = match self.parse_scoped_flags("status", STATUS_USAGE, args) {
            Ok(parsed) => parsed,
            Err(exit_code) => return exit_code,
        };

        let root = match self.resolve_root() {
            Ok(root) => root,
            Err(message) => {
                return self.command_error("status", format, ErrorCode::Internal, &workspace_id, &message, EXIT_ERROR);
            }
        };

        let outcome = match self.service.status(&root, &workspace_id) {
            Ok(outcome) => outcome,
            Err(error) => {
                let exit_code = exit_code_for(error.code);
                return self.command_error("status", format, error.code, &workspace_id, &error.message, exit_code);
            }
        };

        self.logger.log(
            Event::new("status", "ok")
                .with_data("rows", json!(outcome.rows.len()))
                .with_data("runtime_checked", json!(outcome.runtime_checked)),
        );

        if format == OutputFormat::Json {
            let items: Vec<Value> = outcome
                .rows
                .iter()
                .map(|row| {
                    json!({
                        "workspace_id": row.workspace_id,
                        "session_id": row.session_id,
                        "ordinal": row.ordinal,
                        "title": row.title,
                        "exists": row.exists,
                    })
                })
                .collect();
            let mut result = json!({
                "items": items,
                "runtime_checked": outcome.runtime_checked,
            });
            if let Some(warning) = &outcome.warning
                && let Value::Object(object) = &mut result
            {
                object.insert("warning".to_string(), json!(warning));
            }
            self.write_json(&envelope(true, "status", &workspace_id, Some(result), None));
            return EXIT_OK;
        }

        if let Some(warning) = &outcome.warning {
            let _ = writeln!(self.err, "warning: {warning}");
        }
        if outcome.rows.is_empty() {
            let _ = writeln!(self.out, "no cmux sessions mapped");
            return EXIT_OK;
        }
        for row in &outcome.rows {
            let liveness = if !outcome.runtime_checked {
                "unknown"
            } else if row.exists {
                "live"
            } else {
                "stale"
            };
            let _ = writeln!(
                self.out,
                "{}  [{}]  {}  {}  {}",
                row.workspace_id, row.ordinal, row.session_id, row.title, liveness
            );
        }
        EXIT_OK
    }

    fn run_switch(&mut self, args: &[String]) -> i32 {
        let mut format = OutputFormat::Human;
        let mut workspace_id = String::new();
        let mut session_handle = String::new();

        let mut iter = args.iter();
        while let Some(argument) = iter.next() {
            match argument.as_str() {
                "-h" | "--help" | "help" => {
                    let _ = write!(self.out, "{SWITCH_USAGE}");
                    return EXIT_OK;
                }
                "--format" => {
                    let Some(value) = iter.next() else {
                        return self.usage_error("switch", SWITCH_USAGE, "--format requires a value");
                    };
                    match OutputFormat::parse(value.trim()) {
                        Some(parsed) => format = parsed,
                        None => {
                            return self.usage_error(
                                "switch",
                                SWITCH_USAGE,
                                &format!(
                                    "unsupported --format: {:?} (supported: human, json)",
                                    value.trim()
                                ),
                            );
                        }
                    }
                }
                "--workspace" => {
                    let Some(value) = iter.next() else {
                        return self.usage_error("switch", SWITCH_USAGE, "--workspace requires a value");
                    };
                    workspace_id = value.trim().to_string();
                }
                "--session" => {
                    let Some(value) = iter.next() else {
                        return self.usage_error("switch", SWITCH_USAGE, "--session requires a value");
                    };
                    session_handle = value.trim().to_string();
                }
                other => {
                    if let Some(value) = other.strip_prefix("--format=") {
                        match OutputFormat::parse(value.trim()) {
                            Some(parsed) => format = parsed,
                            None => {
                                return self.usage_error(
                                    "switch",
                                    SWITCH_USAGE,
                                    &format!(
                                        "unsupported --format: {:?} (supported: human, json)",
                                        value.trim()
                                    ),
                                );
                            }
                        }
                        continue;
                    }
                    if let Some(value) = other.strip_prefix("--workspace=") {
                        workspace_id = value.trim().to_string();
                        continue;
                    }
                    if let Some(value) = other.strip_prefix("--session=") {
                        session_handle = value.trim().to_string();
                        continue;
                    }
                    return self.usage_error(
                        "switch",
                        SWITCH_USAGE,
                        &format!("unexpected arg for switch: {other:?}"),
                    );
                }
            }
        }

        if !workspace_id.is_empty()
            && let Err(error) = validate_workspace_id(&workspace_id)
        {
            let message = format!(
                "invalid workspace id: {}",
                workspace_id_error_message(&error)
            );
            return self.command_error("switch", format, ErrorCode::InvalidArgument, &workspace_id, &message, EXIT_USAGE);
        }

        let root = match self.resolve_root() {
            Ok(root) => root,
            Err(message) => {
                return self.command_error("switch", format, ErrorCode::Internal, &workspace_id, &message, EXIT_ERROR);
            }
        };

        let selector = if format == OutputFormat::Json {
            None
        } else {
            self.selector
        };
        let outcome = match self
            .service
            .switch(&root, &workspace_id, &session_handle, selector)
        {
            Ok(outcome) => outcome,
            Err(error) => {
                let exit_code = exit_code_for(error.code);
                return self.command_error("switch", format, error.code, &workspace_id, &error.message, exit_code);
            }
        };

        self.logger.log(
            Event::new("switch", "ok")
                .with_data("workspace_id", json!(outcome.workspace_id))
                .with_data("session_id", json!(outcome.session_id)),
        );

        if format == OutputFormat::Json {
            let result = json!({
                "workspace_id": outcome.workspace_id,
                "session_id": outcome.session_id,
                "ordinal": outcome.ordinal,
                "title": outcome.title,
            });
            self.write_json(&envelope(true, "switch", &outcome.workspace_id, Some(result), None));
            return EXIT_OK;
        }

        let _ = writeln!(self.out, "switched cmux session");
        let _ = writeln!(self.out, "  workspace: {}", outcome.workspace_id);
        let _ = writeln!(self.out, "  session: {}", outcome.session_id);
        let _ = writeln!(self.out, "  title: {}", outcome.title);
        EXIT_OK
    }

    fn parse_scoped_flags(
        &mut self,
        command: &'static str,
        usage: &'static str,
        args: &[String],
    ) -> Result<(OutputFormat, String), i32> {
        let mut format = OutputFormat::Human;
        let mut workspace_id = String::new();

        let mut iter = args.iter();
        while let Some(argument) = iter.next() {
            match argument.as_str() {
                "-h" | "--help" | "help" => {
                    let _ = write!(self.out, "{usage}");
                    return Err(EXIT_OK);
                }
                "--format" => {
                    let Some(value) = iter.next() else {
                        return Err(self.usage_error(command, usage, "--format requires a value"));
                    };
                    match OutputFormat::parse(value.trim()) {
                        Some(parsed) => format = parsed,
                        None => {
                            return Err(self.usage_error(
                                command,
                                usage,
                                &format!(
                                    "unsupported --format: {:?} (supported: human, json)",
                                    value.trim()
                                ),
                            ));
                        }
                    }
                }
                "--workspace" => {
                    let Some(value) = iter.next() else {
                        return Err(self.usage_error(command, usage, "--workspace requires a value"));
                    };
                    workspace_id = value.trim().to_string();
                }
                other => {
                    if let Some(value) = other.strip_prefix("--format=") {
                        match OutputFormat::parse(value.trim()) {
                            Some(parsed) => format = parsed,
                            None => {
                                return Err(self.usage_error(
                                    command,
                                    usage,
                                    &format!(
                                        "unsupported --format: {:?} (supported: human, json)",
                                        value.trim()
                                    ),
                                ));
                            }
                        }
                        continue;
                    }
                    if let Some(value) = other.strip_prefix("--workspace=") {
                        workspace_id = value.trim().to_string();
                        continue;
                    }
                    return Err(self.usage_error(
                        command,
                        usage,
                        &format!("unexpected arg for {command}: {other:?}"),
                    ));
                }
            }
        }

        if !workspace_id.is_empty()
            && let Err(error) = validate_workspace_id(&workspace_id)
        {
            let message = format!(
                "invalid workspace id: {}",
                workspace_id_error_message(&error)
            );
            return Err(self.command_error(command, format, ErrorCode::InvalidArgument, &workspace_id, &message, EXIT_USAGE));
        }

        Ok((format, workspace_id))
    }

    fn resolve_root(&self) -> Result<PathBuf, String> {
        paths::resolve_existing_root(&self.cwd)
            .map_err(|error| format!("resolve canopy root: {}", error.message()))
    }

    fn usage_error(&mut self, command: &str, usage: &str, message: &str) -> i32 {
        let _ = writeln!(self.err, "{command}: {message}");
        let _ = write!(self.err, "{usage}");
        EXIT_USAGE
    }

    fn command_error(
        &mut self,
        action: &str,
        format: OutputFormat,
        code: ErrorCode,
        workspace_id: &str,
        message: &str,
        exit_code: i32,
    ) -> i32 {
        self.logger.log(
            Event::new(action, "error")
                .with_data("code", json!(code.as_str()))
                .with_data("message", json!(message)),
        );
        if format == OutputFormat::Json {
            self.write_json(&envelope(
                false,
                action,
                workspace_id,
                None,
                Some((code.as_str(), message)),
            ));
            return exit_code;
        }
        if workspace_id.is_empty() {
            let _ = writeln!(self.err, "{action}: {message}");
        } else {
            let _ = writeln!(self.err, "{action} ({workspace_id}): {message}");
        }
        exit_code
    }

    fn write_json(&mut self, value: &Value) {
        if let Ok(encoded) = serde_json::to_string(value) {
            let _ = writeln!(self.out, "{encoded}");
        }
    }
}

fn exit_code_for(code: ErrorCode) -> i32 {
    if code == ErrorCode::InvalidArgument {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn envelope(
    ok: bool,
    action: &str,
    workspace_id: &str,
    result: Option<Value>,
    error: Option<(&str, &str)>,
) -> Value {
    let mut object = Map::new();
    object.insert("ok".to_string(), json!(ok));
    object.insert("action".to_string(), json!(action));
    if !workspace_id.is_empty() {
        object.insert("workspace_id".to_string(), json!(workspace_id));
    }
    if let Some(result) = result {
        object.insert("result".to_string(), result);
    }
    if let Some((code, message)) = error {
        object.insert(
            "error".to_string(),
            json!({ "code": code, "message": message }),
        );
    }
    Value::Object(object)
}

fn opened_session_json(result: &crate::service::OpenedSession) -> Value {
    json!({
        "workspace_id": result.workspace_id,
        "workspace_path": result.worktree_path.to_string_lossy(),
        "session_id": result.session_id,
        "ordinal": result.ordinal,
        "title": result.title,
    })
}

fn parse_positive_int(raw: &str, name: &str) -> Result<usize, String> {
    if raw.is_empty() {
        return Err(format!("{name} requires a value"));
    }
    if !raw.chars().all(|character| character.is_ascii_digit()) {
        return Err(format!("{name} must be an integer"));
    }
    let value: usize = raw
        .parse()
        .map_err(|_| format!("{name} must be an integer"))?;
    if value < 1 {
        return Err(format!("{name} must be >= 1"));
    }
    Ok(value)
}

pub fn split_event_log_flag(args: Vec<String>) -> Result<(Vec<String>, Option<PathBuf>), String> {
    let mut rest = Vec::with_capacity(args.len());
    let mut path = None;
    let mut iter = args.into_iter();
    while let Some(argument) = iter.next() {
        if argument == "--event-log" {
            let Some(value) = iter.next() else {
                return Err("--event-log requires a file path".to_string());
            };
            path = Some(PathBuf::from(value));
            continue;
        }
        if let Some(value) = argument.strip_prefix("--event-log=") {
            path = Some(PathBuf::from(value));
            continue;
        }
        rest.push(argument);
    }
    Ok((rest, path))
}

pub struct PromptSelector;

impl SwitchSelector for PromptSelector {
    fn select_workspace(
        &self,
        candidates: &[WorkspaceCandidate],
    ) -> Result<String, SelectionError> {
        let items: Vec<(String, String)> = candidates
            .iter()
            .map(|candidate| {
                (
                    candidate.workspace_id.clone(),
                    format!("{} mapped", candidate.mapped_count),
                )
            })
            .collect();
        prompt_choice("workspace", &items)
    }

    fn select_entry(
        &self,
        _workspace_id: &str,
        candidates: &[EntryCandidate],
    ) -> Result<String, SelectionError> {
        let items: Vec<(String, String)> = candidates
            .iter()
            .map(|candidate| (candidate.session_id.clone(), candidate.title.clone()))
            .collect();
        prompt_choice("session", &items)
    }
}

fn prompt_choice(label: &str, items: &[(String, String)]) -> Result<String, SelectionError> {
    use std::io::{BufRead, IsTerminal};

    if !std::io::stdin().is_terminal() {
        return Err(SelectionError::Unavailable);
    }

    eprintln!("select a {label}:");
    for (index, (id, note)) in items.iter().enumerate() {
        eprintln!("  {}. {id}  {note}", index + 1);
    }
    eprint!("choice [1-{}]: ", items.len());

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return Err(SelectionError::Failed("could not read selection".to_string()));
    }
    let trimmed = line.trim();
    let choice: usize = trimmed
        .parse()
        .map_err(|_| SelectionError::Failed(format!("invalid selection: {trimmed:?}")))?;
    if choice < 1 || choice > items.len() {
        return Err(SelectionError::Failed(format!(
            "selection out of range: {choice}"
        )));
    }
    Ok(items[choice - 1].0.clone())
}
