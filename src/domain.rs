use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceIdError {
    Empty,
    LeadingDot,
    InvalidCharacter(char),
}

pub fn workspace_id_error_message(error: &WorkspaceIdError) -> String {
    match error {
        WorkspaceIdError::Empty => "workspace id is required".to_string(),
        WorkspaceIdError::LeadingDot => "workspace id must not start with '.'".to_string(),
        WorkspaceIdError::InvalidCharacter(character) => {
            format!("workspace id must be [A-Za-z0-9._-], got '{character}'")
        }
    }
}

pub fn validate_workspace_id(id: &str) -> Result<(), WorkspaceIdError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(WorkspaceIdError::Empty);
    }
    if trimmed.starts_with('.') {
        return Err(WorkspaceIdError::LeadingDot);
    }
    for character in trimmed.chars() {
        if !(character.is_ascii_alphanumeric() || matches!(character, '-' | '_' | '.')) {
            return Err(WorkspaceIdError::InvalidCharacter(character));
        }
    }
    Ok(())
}

pub fn dedupe_workspace_ids(ids: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() {
            continue;
        }
        if out.iter().any(|seen: &String| seen == id) {
            continue;
        }
        out.push(id.to_string());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTarget {
    pub workspace_id: String,
    pub worktree_path: PathBuf,
    pub title: String,
}
