#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

use canopy::cmux::{Capabilities, LiveSession};
use canopy::mapping::{MappingEntry, MappingFile, MappingStore};
use canopy::service::{BackendFactory, SessionBackend};
use canopy::workspaces::workspaces_dir;

pub struct TempRoot {
    pub path: PathBuf,
}

impl TempRoot {
    pub fn new(label: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be monotonic")
            .as_nanos();
        let pid = std::process::id();
        let path = std::env::temp_dir().join(format!("canopy-it-{label}-{pid}-{timestamp}"));
        fs::create_dir_all(path.join(".canopy")).expect("root marker should create");
        Self { path }
    }

    pub fn add_workspace(&self, workspace_id: &str) -> PathBuf {
        let workspace = workspaces_dir(&self.path).join(workspace_id);
        fs::create_dir_all(&workspace).expect("workspace dir should create");
        workspace
    }

    pub fn add_workspace_with_title(&self, workspace_id: &str, title: &str) -> PathBuf {
        let workspace = self.add_workspace(workspace_id);
        fs::write(
            workspace.join(".canopy.meta.json"),
            format!(
                r#"{{"schema_version":1,"workspace":{{"id":"{workspace_id}","title":"{title}","status":"active"}}}}"#
            ),
        )
        .expect("meta should write");
        workspace
    }

    pub fn store(&self) -> MappingStore {
        MappingStore::for_root(&self.path)
    }

    pub fn seed_mapping(&self, entries: &[(&str, &str, i64)]) {
        let store = self.store();
        let mut file = MappingFile::default();
        for (workspace_id, session_id, ordinal) in entries {
            let workspace = file.workspaces.entry(workspace_id.to_string()).or_default();
            workspace.entries.push(MappingEntry {
                session_id: session_id.to_string(),
                ordinal: *ordinal,
                title_snapshot: format!("{workspace_id} | work [{ordinal}]"),
                created_at: "2026-08-07T09:00:00Z".to_string(),
                last_used_at: "2026-08-07T09:00:00Z".to_string(),
            });
        }
        store.save(&mut file).expect("seed mapping should save");
    }

    pub fn mapping_bytes(&self) -> String {
        fs::read_to_string(self.store().path()).expect("mapping should read")
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub fn live_sessions(ids: &[&str]) -> Vec<LiveSession> {
    ids.iter()
        .map(|id| LiveSession {
            id: id.to_string(),
            ..Default::default()
        })
        .collect()
}

#[derive(Default)]
pub struct FakeState {
    pub methods: Option<Vec<String>>,
    pub fail_create_containing: Option<String>,
    pub fail_rename_containing: Option<String>,
    pub list_result: Option<Result<Vec<LiveSession>, String>>,
    pub identify_errors: HashMap<String, String>,
    pub sequence: AtomicUsize,
    pub create_calls: AtomicUsize,
}

pub struct FakeBackend {
    state: Arc<FakeState>,
}

impl SessionBackend for FakeBackend {
    fn capabilities(&self) -> Result<Capabilities, String> {
        let methods = self.state.methods.clone().unwrap_or_else(|| {
            vec![
                "workspace.create".to_string(),
                "workspace.rename".to_string(),
                "workspace.select".to_string(),
            ]
        });
        Ok(Capabilities {
            methods: methods.into_iter().collect(),
        })
    }

    fn create_session_with_command(&self, init_command: &str) -> Result<String, String> {
        self.state.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.state.fail_create_containing
            && init_command.contains(marker.as_str())
        {
            return Err("cmux new-workspace: boom".to_string());
        }
        let id = self.state.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("SES-{id}"))
    }

    fn rename_session(&self, _session_id: &str, title: &str) -> Result<(), String> {
        if let Some(marker) = &self.state.fail_rename_containing
            && title.contains(marker.as_str())
        {
            return Err("cmux rename-workspace: boom".to_string());
        }
        Ok(())
    }

    fn select_session(&self, _session_id: &str) -> Result<(), String> {
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<LiveSession>, String> {
        match &self.state.list_result {
            Some(result) => result.clone(),
            None => Ok(Vec::new()),
        }
    }

    fn identify(&self, session_id: &str, _surface: &str) -> Result<Value, String> {
        if let Some(error) = self.state.identify_errors.get(session_id) {
            return Err(error.clone());
        }
        Ok(json!({ "id": session_id }))
    }
}

pub struct FakeFactory {
    pub state: Arc<FakeState>,
}

impl FakeFactory {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }
}

impl BackendFactory for FakeFactory {
    type Backend = FakeBackend;

    fn connect(&self) -> FakeBackend {
        FakeBackend {
            state: Arc::clone(&self.state),
        }
    }
}

pub fn path_of(root: &Path, workspace_id: &str) -> PathBuf {
    workspaces_dir(root).join(workspace_id)
}
