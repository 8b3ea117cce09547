use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::OpenTarget;

pub const WORKSPACE_META_FILE: &str = ".canopy.meta.json";

// Only the display title is consumed here; the rest of the meta file belongs
// to the workspace-lifecycle tooling.
#[derive(Debug, Clone, Default, Deserialize)]
struct WorkspaceMetaFile {
    #[serde(default)]
    workspace: WorkspaceMetaSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WorkspaceMetaSection {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceResolveError {
    NotFound(String),
}

impl WorkspaceResolveError {
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(workspace_id) => format!("workspace not found: {workspace_id}"),
        }
    }
}

pub fn workspaces_dir(root: &Path) -> PathBuf {
    root.join("workspaces")
}

pub fn resolve_open_target(
    root: &Path,
    workspace_id: &str,
) -> Result<OpenTarget, WorkspaceResolveError> {
    let worktree_path = workspaces_dir(root).join(workspace_id);
    let is_dir = fs::metadata(&worktree_path)
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(WorkspaceResolveError::NotFound(workspace_id.to_string()));
    }

    let title = read_workspace_title(&worktree_path).unwrap_or_default();
    Ok(OpenTarget {
        workspace_id: workspace_id.to_string(),
        worktree_path,
        title,
    })
}

// Best-effort: a missing or malformed meta file just means no display title.
pub fn read_workspace_title(worktree_path: &Path) -> Option<String> {
    let raw = fs::read_to_string(worktree_path.join(WORKSPACE_META_FILE)).ok()?;
    let meta: WorkspaceMetaFile = serde_json::from_str(&raw).ok()?;
    let title = meta.workspace.title.trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}
