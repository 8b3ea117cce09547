use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::cmux::{Capabilities, LiveSession, METHOD_CREATE, METHOD_RENAME, METHOD_SELECT};
use crate::domain::OpenTarget;
use crate::mapping::{self, MappingEntry, MappingFile, MappingStore};
use crate::workspaces;

pub const REQUIRED_METHODS: [&str; 3] = [METHOD_CREATE, METHOD_RENAME, METHOD_SELECT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument,
    CapabilityMissing,
    CreateFailed,
    RenameFailed,
    SelectFailed,
    StateWriteFailed,
    WorkspaceNotFound,
    PartialFailure,
    SelectionUnavailable,
    Internal,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::CapabilityMissing => "cmux_capability_missing",
            Self::CreateFailed => "cmux_create_failed",
            Self::RenameFailed => "cmux_rename_failed",
            Self::SelectFailed => "cmux_select_failed",
            Self::StateWriteFailed => "state_write_failed",
            Self::WorkspaceNotFound => "workspace_not_found",
            Self::PartialFailure => "partial_failure",
            Self::SelectionUnavailable => "non_interactive_selection_required",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub trait SessionBackend {
    fn capabilities(&self) -> Result<Capabilities, String>;
    fn create_session_with_command(&self, init_command: &str) -> Result<String, String>;
    fn rename_session(&self, session_id: &str, title: &str) -> Result<(), String>;
    fn select_session(&self, session_id: &str) -> Result<(), String>;
    fn list_sessions(&self) -> Result<Vec<LiveSession>, String>;
    fn identify(&self, session_id: &str, surface: &str) -> Result<Value, String>;
}

// Backend clients are not shared across workers; every worker connects its
// own instance.
pub trait BackendFactory: Sync {
    type Backend: SessionBackend;

    fn connect(&self) -> Self::Backend;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    Unavailable,
    Failed(String),
}

pub trait SwitchSelector {
    fn select_workspace(
        &self,
        candidates: &[WorkspaceCandidate],
    ) -> Result<String, SelectionError>;
    fn select_entry(
        &self,
        workspace_id: &str,
        candidates: &[EntryCandidate],
    ) -> Result<String, SelectionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceCandidate {
    pub workspace_id: String,
    pub mapped_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCandidate {
    pub session_id: String,
    pub ordinal: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
    pub workspace_id: String,
    pub worktree_path: PathBuf,
    pub session_id: String,
    pub ordinal: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFailure {
    pub workspace_id: String,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOutcome {
    pub results: Vec<OpenedSession>,
    pub failures: Vec<OpenFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub workspace_id: String,
    pub session_id: String,
    pub ordinal: i64,
    pub title: String,
    pub last_used_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOutcome {
    pub rows: Vec<SessionRow>,
    pub runtime_checked: bool,
    pub pruned_count: usize,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub workspace_id: String,
    pub session_id: String,
    pub ordinal: i64,
    pub title: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusOutcome {
    pub rows: Vec<StatusRow>,
    pub runtime_checked: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub workspace_id: String,
    pub session_id: String,
    pub ordinal: i64,
    pub title: String,
}

pub struct SessionService<F: BackendFactory> {
    factory: F,
    now: fn() -> DateTime<Utc>,
}

impl<F: BackendFactory> SessionService<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            now: Utc::now,
        }
    }

    pub fn with_clock(factory: F, now: fn() -> DateTime<Utc>) -> Self {
        Self { factory, now }
    }

    pub fn open(
        &self,
        root: &Path,
        target_ids: &[String],
        concurrency: usize,
        multi: bool,
    ) -> Result<OpenOutcome, ServiceError> {
        if concurrency < 1 {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "concurrency must be >= 1",
            ));
        }
        if !multi && target_ids.len() > 1 {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "multiple targets require multi mode",
            ));
        }

        let client = self.factory.connect();
        let capabilities = client.capabilities().map_err(|error| {
            ServiceError::new(
                ErrorCode::CapabilityMissing,
                format!("read cmux capabilities: {error}"),
            )
        })?;
        for method in REQUIRED_METHODS {
            if !capabilities.supports(method) {
                return Err(ServiceError::new(
                    ErrorCode::CapabilityMissing,
                    format!("cmux capability missing: {method}"),
                ));
            }
        }

        let store = MappingStore::for_root(root);
        let mapping = store.load().map_err(|error| {
            ServiceError::new(
                ErrorCode::StateWriteFailed,
                format!("load session mapping: {}", error.message()),
            )
        })?;

        let shared = Mutex::new(mapping);
        let outcome = if multi && concurrency > 1 && target_ids.len() > 1 {
            self.open_concurrent(root, target_ids, concurrency, &shared)
        } else {
            self.open_sequential(&client, root, target_ids, &shared)
        };

        let mut mapping = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        if !outcome.results.is_empty() {
            store.save(&mut mapping).map_err(|error| {
                ServiceError::new(
                    ErrorCode::StateWriteFailed,
                    format!("save session mapping: {}", error.message()),
                )
            })?;
        }
        Ok(outcome)
    }

    // Strict input order; the first failure stops the run.
    fn open_sequential(
        &self,
        client: &F::Backend,
        root: &Path,
        target_ids: &[String],
        shared: &Mutex<MappingFile>,
    ) -> OpenOutcome {
        let mut outcome = OpenOutcome::default();
        for workspace_id in target_ids {
            let target = match workspaces::resolve_open_target(root, workspace_id) {
                Ok(target) => target,
                Err(error) => {
                    outcome.failures.push(OpenFailure {
                        workspace_id: workspace_id.clone(),
                        code: ErrorCode::WorkspaceNotFound,
                        message: error.message(),
                    });
                    break;
                }
            };
            match self.open_one(client, &target, shared) {
                Ok(result) => outcome.results.push(result),
                Err((code, message)) => {
                    outcome.failures.push(OpenFailure {
                        workspace_id: workspace_id.clone(),
                        code,
                        message,
                    });
                    break;
                }
            }
        }
        outcome
    }

    // All resolved targets are attempted; one job's failure never stops the
    // others. Results are re-sorted into input order after the pool drains.
    fn open_concurrent(
        &self,
        root: &Path,
        target_ids: &[String],
        concurrency: usize,
        shared: &Mutex<MappingFile>,
    ) -> OpenOutcome {
        let mut failures = Vec::new();
        let mut jobs: Vec<(usize, OpenTarget)> = Vec::new();
        for (index, workspace_id) in target_ids.iter().enumerate() {
            match workspaces::resolve_open_target(root, workspace_id) {
                Ok(target) => jobs.push((index, target)),
                Err(error) => failures.push(OpenFailure {
                    workspace_id: workspace_id.clone(),
                    code: ErrorCode::WorkspaceNotFound,
                    message: error.message(),
                }),
            }
        }
        if jobs.is_empty() {
            return OpenOutcome {
                results: Vec::new(),
                failures,
            };
        }

        let cursor = AtomicUsize::new(0);
        let collected: Mutex<Vec<(usize, Result<OpenedSession, OpenFailure>)>> =
            Mutex::new(Vec::with_capacity(jobs.len()));

        thread::scope(|scope| {
            for _ in 0..concurrency {
                scope.spawn(|| {
                    let client = self.factory.connect();
                    loop {
                        let slot = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some((index, target)) = jobs.get(slot) else {
                            break;
                        };
                        let outcome = match self.open_one(&client, target, shared) {
                            Ok(result) => Ok(result),
                            Err((code, message)) => Err(OpenFailure {
                                workspace_id: target.workspace_id.clone(),
                                code,
                                message,
                            }),
                        };
                        let mut sink =
                            collected.lock().unwrap_or_else(PoisonError::into_inner);
                        sink.push((*index, outcome));
                    }
                });
            }
        });

        let mut collected = collected
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        collected.sort_by_key(|(index, _)| *index);

        let mut outcome = OpenOutcome {
            results: Vec::with_capacity(collected.len()),
            failures,
        };
        for (_, job_outcome) in collected {
            match job_outcome {
                Ok(result) => outcome.results.push(result),
                Err(failure) => outcome.failures.push(failure),
            }
        }
        outcome
    }

    fn open_one(
        &self,
        client: &F::Backend,
        target: &OpenTarget,
        shared: &Mutex<MappingFile>,
    ) -> Result<OpenedSession, (ErrorCode, String)> {
        let init_command = format!("cd {}", shell_quote_cd_path(&target.worktree_path));
        let session_id = client
            .create_session_with_command(&init_command)
            .map_err(|error| {
                (
                    ErrorCode::CreateFailed,
                    format!("create cmux session: {error}"),
                )
            })?;

        // The lock covers the in-memory mutation only, never a backend call.
        let ordinal = {
            let mut mapping = lock_shared(shared);
            mapping::allocate_ordinal(&mut mapping, &target.workspace_id)
        }
        .map_err(|error| {
            (
                ErrorCode::StateWriteFailed,
                format!("allocate session ordinal: {}", error.message()),
            )
        })?;

        let title = mapping::format_session_title(&target.workspace_id, &target.title, ordinal)
            .map_err(|error| {
                (
                    ErrorCode::RenameFailed,
                    format!("format session title: {}", error.message()),
                )
            })?;
        client.rename_session(&session_id, &title).map_err(|error| {
            (
                ErrorCode::RenameFailed,
                format!("rename cmux session: {error}"),
            )
        })?;
        client.select_session(&session_id).map_err(|error| {
            (
                ErrorCode::SelectFailed,
                format!("select cmux session: {error}"),
            )
        })?;

        let now = (self.now)().to_rfc3339_opts(SecondsFormat::Secs, true);
        {
            let mut mapping = lock_shared(shared);
            let workspace = mapping
                .workspaces
                .entry(target.workspace_id.clone())
                .or_default();
            workspace.entries.push(MappingEntry {
                session_id: session_id.clone(),
                ordinal,
                title_snapshot: title.clone(),
                created_at: now.clone(),
                last_used_at: now,
            });
        }

        Ok(OpenedSession {
            workspace_id: target.workspace_id.clone(),
            worktree_path: target.worktree_path.clone(),
            session_id,
            ordinal,
            title,
        })
    }

    pub fn list(&self, root: &Path, workspace_filter: &str) -> Result<ListOutcome, ServiceError> {
        let store = MappingStore::for_root(root);
        let mut mapping = store.load().map_err(|error| {
            ServiceError::new(
                ErrorCode::Internal,
                format!("load session mapping: {}", error.message()),
            )
        })?;

        let mut outcome = ListOutcome::default();
        let client = self.factory.connect();
        match client.list_sessions() {
            Err(error) => outcome.warning = Some(format!("list cmux sessions: {error}")),
            Ok(live) => {
                outcome.runtime_checked = true;
                let (_, pruned) = reconcile_with_live(&store, &mut mapping, &live, true)
                    .map_err(|error| {
                        ServiceError::new(
                            ErrorCode::StateWriteFailed,
                            format!("save session mapping: {}", error.message()),
                        )
                    })?;
                outcome.pruned_count = pruned;
                if live.is_empty() {
                    let (probe_pruned, warning) = prune_by_probe(&store, &mut mapping, &client);
                    outcome.pruned_count += probe_pruned;
                    if warning.is_some() {
                        outcome.warning = warning;
                    }
                }
            }
        }

        outcome.rows = collect_rows(&mapping, workspace_filter);
        Ok(outcome)
    }

    // Read-only: reports liveness per entry but never prunes.
    pub fn status(
        &self,
        root: &Path,
        workspace_filter: &str,
    ) -> Result<StatusOutcome, ServiceError> {
        let store = MappingStore::for_root(root);
        let mut mapping = store.load().map_err(|error| {
            ServiceError::new(
                ErrorCode::Internal,
                format!("load session mapping: {}", error.message()),
            )
        })?;

        let mut outcome = StatusOutcome::default();
        let client = self.factory.connect();
        let exists = match client.list_sessions() {
            Err(error) => {
                outcome.warning = Some(format!("list cmux sessions: {error}"));
                HashSet::new()
            }
            Ok(live) => {
                outcome.runtime_checked = true;
                let (exists, _) = reconcile_with_live(&store, &mut mapping, &live, false)
                    .map_err(|error| {
                        ServiceError::new(
                            ErrorCode::Internal,
                            format!("reconcile session mapping: {}", error.message()),
                        )
                    })?;
                exists
            }
        };

        for (workspace_id, workspace) in &mapping.workspaces {
            if !workspace_filter.is_empty() && workspace_filter != workspace_id {
                continue;
            }
            for entry in &workspace.entries {
                outcome.rows.push(StatusRow {
                    workspace_id: workspace_id.clone(),
                    session_id: entry.session_id.clone(),
                    ordinal: entry.ordinal,
                    title: entry.title_snapshot.clone(),
                    exists: exists.contains(entry.session_id.trim()),
                });
            }
        }
        Ok(outcome)
    }

    pub fn switch(
        &self,
        root: &Path,
        workspace_id: &str,
        session_handle: &str,
        selector: Option<&dyn SwitchSelector>,
    ) -> Result<SwitchOutcome, ServiceError> {
        let store = MappingStore::for_root(root);
        let mapping = store.load().map_err(|error| {
            ServiceError::new(
                ErrorCode::Internal,
                format!("load session mapping: {}", error.message()),
            )
        })?;

        let workspace_id = workspace_id.trim();
        let session_handle = session_handle.trim();

        let (resolved_workspace, entry) = if !session_handle.is_empty() {
            find_entry_by_session(&mapping, workspace_id, session_handle).ok_or_else(|| {
                ServiceError::new(
                    ErrorCode::WorkspaceNotFound,
                    format!("no mapped cmux session: {session_handle}"),
                )
            })?
        } else {
            let resolved_workspace = if workspace_id.is_empty() {
                resolve_switch_workspace(&mapping, selector)?
            } else {
                workspace_id.to_string()
            };
            let entry = resolve_switch_entry(&mapping, &resolved_workspace, selector)?;
            (resolved_workspace, entry)
        };

        let client = self.factory.connect();
        client.select_session(&entry.session_id).map_err(|error| {
            ServiceError::new(
                ErrorCode::SelectFailed,
                format!("select cmux session: {error}"),
            )
        })?;

        Ok(SwitchOutcome {
            workspace_id: resolved_workspace,
            session_id: entry.session_id,
            ordinal: entry.ordinal,
            title: entry.title_snapshot,
        })
    }
}

fn lock_shared(shared: &Mutex<MappingFile>) -> MutexGuard<'_, MappingFile> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn collect_rows(mapping: &MappingFile, workspace_filter: &str) -> Vec<SessionRow> {
    let mut rows = Vec::new();
    for (workspace_id, workspace) in &mapping.workspaces {
        if !workspace_filter.is_empty() && workspace_filter != workspace_id {
            continue;
        }
        for entry in &workspace.entries {
            rows.push(SessionRow {
                workspace_id: workspace_id.clone(),
                session_id: entry.session_id.clone(),
                ordinal: entry.ordinal,
                title: entry.title_snapshot.clone(),
                last_used_at: entry.last_used_at.clone(),
            });
        }
    }
    rows
}

fn find_entry_by_session(
    mapping: &MappingFile,
    workspace_filter: &str,
    session_handle: &str,
) -> Option<(String, MappingEntry)> {
    for (workspace_id, workspace) in &mapping.workspaces {
        if !workspace_filter.is_empty() && workspace_filter != workspace_id {
            continue;
        }
        for entry in &workspace.entries {
            if entry.session_id == session_handle {
                return Some((workspace_id.clone(), entry.clone()));
            }
        }
    }
    None
}

fn resolve_switch_workspace(
    mapping: &MappingFile,
    selector: Option<&dyn SwitchSelector>,
) -> Result<String, ServiceError> {
    let candidates: Vec<WorkspaceCandidate> = mapping
        .workspaces
        .iter()
        .filter(|(_, workspace)| !workspace.entries.is_empty())
        .map(|(workspace_id, workspace)| WorkspaceCandidate {
            workspace_id: workspace_id.clone(),
            mapped_count: workspace.entries.len(),
        })
        .collect();

    match candidates.len() {
        0 => Err(ServiceError::new(
            ErrorCode::WorkspaceNotFound,
            "no cmux sessions are mapped",
        )),
        1 => Ok(candidates[0].workspace_id.clone()),
        _ => {
            let Some(selector) = selector else {
                return Err(ServiceError::new(
                    ErrorCode::SelectionUnavailable,
                    "workspace selection requires an interactive terminal",
                ));
            };
            match selector.select_workspace(&candidates) {
                Ok(selected) => Ok(selected.trim().to_string()),
                Err(SelectionError::Unavailable) => Err(ServiceError::new(
                    ErrorCode::SelectionUnavailable,
                    "workspace selection requires an interactive terminal",
                )),
                Err(SelectionError::Failed(message)) => Err(ServiceError::new(
                    ErrorCode::Internal,
                    format!("workspace selection failed: {message}"),
                )),
            }
        }
    }
}

fn resolve_switch_entry(
    mapping: &MappingFile,
    workspace_id: &str,
    selector: Option<&dyn SwitchSelector>,
) -> Result<MappingEntry, ServiceError> {
    let entries = mapping
        .workspaces
        .get(workspace_id)
        .map(|workspace| workspace.entries.as_slice())
        .unwrap_or_default();

    match entries.len() {
        0 => Err(ServiceError::new(
            ErrorCode::WorkspaceNotFound,
            format!("no cmux sessions mapped for workspace: {workspace_id}"),
        )),
        1 => Ok(entries[0].clone()),
        _ => {
            let Some(selector) = selector else {
                return Err(ServiceError::new(
                    ErrorCode::SelectionUnavailable,
                    "session selection requires an interactive terminal",
                ));
            };
            let candidates: Vec<EntryCandidate> = entries
                .iter()
                .map(|entry| EntryCandidate {
                    session_id: entry.session_id.clone(),
                    ordinal: entry.ordinal,
                    title: entry.title_snapshot.clone(),
                })
                .collect();
            let selected = match selector.select_entry(workspace_id, &candidates) {
                Ok(selected) => selected.trim().to_string(),
                Err(SelectionError::Unavailable) => {
                    return Err(ServiceError::new(
                        ErrorCode::SelectionUnavailable,
                        "session selection requires an interactive terminal",
                    ));
                }
                Err(SelectionError::Failed(message)) => {
                    return Err(ServiceError::new(
                        ErrorCode::Internal,
                        format!("session selection failed: {message}"),
                    ));
                }
            };
            entries
                .iter()
                .find(|entry| entry.session_id == selected)
                .cloned()
                .ok_or_else(|| {
                    ServiceError::new(
                        ErrorCode::Internal,
                        format!("selected session is not mapped: {selected}"),
                    )
                })
        }
    }
}

// List-based reconciliation. An empty live list is ambiguous (no sessions vs
// backend unreachable), so pruning on it is refused.
pub fn reconcile_with_live(
    store: &MappingStore,
    mapping: &mut MappingFile,
    live: &[LiveSession],
    prune: bool,
) -> Result<(HashSet<String>, usize), mapping::MappingError> {
    let exists: HashSet<String> = live
        .iter()
        .map(|session| session.id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    if !prune || exists.is_empty() {
        return Ok((exists, 0));
    }

    let mut pruned = 0;
    for workspace in mapping.workspaces.values_mut() {
        let before = workspace.entries.len();
        workspace
            .entries
            .retain(|entry| exists.contains(entry.session_id.trim()));
        pruned += before - workspace.entries.len();
    }

    if pruned > 0 {
        store.save(mapping)?;
    }
    Ok((exists, pruned))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    Exists,
    Missing,
    Unknown,
}

// Probe-based fallback for when the live list cannot be trusted. Each
// distinct session id is probed once; entries are dropped only on a
// conclusive "not found", and a round where nothing resolved conclusively
// prunes nothing at all.
pub fn prune_by_probe(
    store: &MappingStore,
    mapping: &mut MappingFile,
    client: &impl SessionBackend,
) -> (usize, Option<String>) {
    let mut status_by_id: HashMap<String, ProbeOutcome> = HashMap::new();
    for workspace in mapping.workspaces.values() {
        for entry in &workspace.entries {
            let id = entry.session_id.trim();
            if id.is_empty() || status_by_id.contains_key(id) {
                continue;
            }
            let outcome = match client.identify(id, "") {
                Ok(_) => ProbeOutcome::Exists,
                Err(error) if is_not_found_error(&error) => ProbeOutcome::Missing,
                Err(_) => ProbeOutcome::Unknown,
            };
            status_by_id.insert(id.to_string(), outcome);
        }
    }

    let conclusive = status_by_id
        .values()
        .any(|outcome| *outcome != ProbeOutcome::Unknown);
    if !conclusive {
        return (
            0,
            Some("cmux probe could not verify any session; skipped stale pruning".to_string()),
        );
    }

    let mut pruned = 0;
    for workspace in mapping.workspaces.values_mut() {
        let before = workspace.entries.len();
        workspace.entries.retain(|entry| {
            !matches!(
                status_by_id.get(entry.session_id.trim()),
                Some(ProbeOutcome::Missing)
            )
        });
        pruned += before - workspace.entries.len();
    }

    if pruned > 0
        && let Err(error) = store.save(mapping)
    {
        return (
            0,
            Some(format!(
                "save session mapping after probe prune: {}",
                error.message()
            )),
        );
    }
    (pruned, None)
}

pub fn is_not_found_error(message: &str) -> bool {
    let message = message.trim().to_lowercase();
    if message.is_empty() {
        return false;
    }
    message.contains("not found") || message.contains("unknown workspace")
}

fn shell_quote_single(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

fn shell_escape_for_double_quotes(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('$', r"\$")
        .replace('`', r"\`")
}

pub(crate) fn shell_quote_cd_path(path: &Path) -> String {
    let home = dirs::home_dir().map(|home| home.to_string_lossy().to_string());
    shell_quote_cd_path_with_home(&path.to_string_lossy(), home.as_deref())
}

// Paths under the home directory are emitted relative to "$HOME" so the init
// command stays valid across hosts that mount the home elsewhere.
fn shell_quote_cd_path_with_home(path: &str, home: Option<&str>) -> String {
    if let Some(home) = home
        && !home.is_empty()
    {
        if path == home {
            return "\"$HOME\"".to_string();
        }
        let prefix = format!("{home}{}", std::path::MAIN_SEPARATOR);
        if let Some(suffix) = path.strip_prefix(&prefix) {
            return format!("\"$HOME/{}\"", shell_escape_for_double_quotes(suffix));
        }
    }
    shell_quote_single(path)
}
