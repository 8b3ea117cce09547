use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: i64 = 1;
pub const UNTITLED_TITLE: &str = "(untitled)";
const MAPPING_FILE_NAME: &str = "cmux-sessions.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub ordinal: i64,
    #[serde(default)]
    pub title_snapshot: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_used_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkspaceMapping {
    #[serde(default)]
    pub next_ordinal: i64,
    #[serde(default)]
    pub entries: Vec<MappingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub workspaces: BTreeMap<String, WorkspaceMapping>,
}

impl Default for MappingFile {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            workspaces: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    UnsupportedVersion(i64),
    EmptyWorkspaceId,
    InvalidOrdinal(i64),
    Read(String),
    Parse(String),
    Write(String),
}

impl MappingError {
    pub fn message(&self) -> String {
        match self {
            Self::UnsupportedVersion(version) => {
                format!("unsupported session mapping version: {version}")
            }
            Self::EmptyWorkspaceId => "workspace id is required".to_string(),
            Self::InvalidOrdinal(ordinal) => format!("ordinal must be >= 1, got {ordinal}"),
            Self::Read(message) => format!("read session mapping: {message}"),
            Self::Parse(message) => format!("parse session mapping: {message}"),
            Self::Write(message) => format!("write session mapping: {message}"),
        }
    }
}

// Re-sorts entries, repairs out-of-range ordinals, and keeps next_ordinal
// strictly above every assigned ordinal. Runs on every load and save.
pub fn normalize(file: &mut MappingFile) -> Result<(), MappingError> {
    if file.version == 0 {
        file.version = CURRENT_VERSION;
    }
    if file.version != CURRENT_VERSION {
        return Err(MappingError::UnsupportedVersion(file.version));
    }

    for mapping in file.workspaces.values_mut() {
        mapping
            .entries
            .sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.session_id.cmp(&b.session_id)));

        let mut max_ordinal = 0;
        for (position, entry) in mapping.entries.iter_mut().enumerate() {
            if entry.ordinal < 1 {
                entry.ordinal = position as i64 + 1;
            }
            max_ordinal = max_ordinal.max(entry.ordinal);
        }
        if mapping.next_ordinal < 1 {
            mapping.next_ordinal = 1;
        }
        if mapping.next_ordinal <= max_ordinal {
            mapping.next_ordinal = max_ordinal + 1;
        }
    }
    Ok(())
}

// Not a locking primitive: callers serialize access to the shared file.
pub fn allocate_ordinal(file: &mut MappingFile, workspace_id: &str) -> Result<i64, MappingError> {
    normalize(file)?;
    let id = workspace_id.trim();
    if id.is_empty() {
        return Err(MappingError::EmptyWorkspaceId);
    }
    let mapping = file.workspaces.entry(id.to_string()).or_default();
    if mapping.next_ordinal < 1 {
        mapping.next_ordinal = 1;
    }
    let ordinal = mapping.next_ordinal;
    mapping.next_ordinal = ordinal + 1;
    Ok(ordinal)
}

// The result is stored verbatim in title_snapshot and never recomputed.
pub fn format_session_title(
    workspace_id: &str,
    raw_title: &str,
    ordinal: i64,
) -> Result<String, MappingError> {
    let id = workspace_id.trim();
    if id.is_empty() {
        return Err(MappingError::EmptyWorkspaceId);
    }
    if ordinal < 1 {
        return Err(MappingError::InvalidOrdinal(ordinal));
    }
    let title = raw_title.trim();
    let title = if title.is_empty() { UNTITLED_TITLE } else { title };
    Ok(format!("{id} | {title} [{ordinal}]"))
}

pub fn mapping_path(root: &Path) -> PathBuf {
    crate::paths::state_dir(root).join(MAPPING_FILE_NAME)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn for_root(root: &Path) -> Self {
        Self {
            path: mapping_path(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<MappingFile, MappingError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MappingFile::default());
            }
            Err(error) => return Err(MappingError::Read(error.to_string())),
        };

        let mut file: MappingFile =
            serde_json::from_str(&raw).map_err(|error| MappingError::Parse(error.to_string()))?;
        normalize(&mut file)?;
        Ok(file)
    }

    // Writes a sibling temp file and renames it over the target, so a
    // concurrent reader never observes a partially-written mapping.
    pub fn save(&self, file: &mut MappingFile) -> Result<(), MappingError> {
        normalize(file)?;

        let mut encoded = serde_json::to_string_pretty(file)
            .map_err(|error| MappingError::Write(error.to_string()))?;
        encoded.push('\n');

        let Some(parent) = self.path.parent() else {
            return Err(MappingError::Write(
                "mapping path has no parent directory".to_string(),
            ));
        };
        fs::create_dir_all(parent).map_err(|error| MappingError::Write(error.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &encoded).map_err(|error| MappingError::Write(error.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|error| MappingError::Write(error.to_string()))
    }
}
