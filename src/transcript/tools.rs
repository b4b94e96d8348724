// External tool detection, consulted once when the chain is built

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager {
    search_dirs: Vec<String>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self {
            search_dirs: vec![
                "/opt/homebrew/bin".to_string(),
                "/usr/local/bin".to_string(),
                "/usr/bin".to_string(),
            ],
        }
    }

    /// Locate `binary`: an explicit path is taken as-is, a bare name is
    /// looked up in the usual install directories and then on `PATH`
    pub fn get_tool_info(&self, binary: &str) -> ToolInfo {
        let path = self.locate(binary);
        let version = path.as_deref().and_then(Self::get_version);
        debug!(tool = binary, ?path, ?version, "Tool detection");

        ToolInfo {
            name: binary.to_string(),
            is_available: path.is_some(),
            version,
            path,
        }
    }

    fn locate(&self, binary: &str) -> Option<String> {
        if binary.contains(std::path::MAIN_SEPARATOR) {
            return Path::new(binary).is_file().then(|| binary.to_string());
        }

        for dir in &self.search_dirs {
            let candidate = Path::new(dir).join(binary);
            if candidate.is_file() {
                return Some(candidate.to_string_lossy().to_string());
            }
        }

        match Command::new("which").arg(binary).output() {
            Ok(output) if output.status.success() => {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!path.is_empty()).then_some(path)
            }
            _ => None,
        }
    }

    fn get_version(path: &str) -> Option<String> {
        match Command::new(path).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!out.is_empty()).then_some(out)
            }
            _ => None,
        }
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_unavailable() {
        let info = ToolManager::new().get_tool_info("definitely-not-a-real-binary-xyz");
        assert!(!info.is_available);
        assert!(info.path.is_none());
    }

    #[test]
    fn test_explicit_missing_path_is_unavailable() {
        let info = ToolManager::new().get_tool_info("/nonexistent/dir/yt-dlp");
        assert!(!info.is_available);
    }
}
