//! Workflow document reading utilities.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{DefinitionError, DefinitionResult};
use crate::models::WorkflowDefinition;

/// Serialization format of a workflow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension, falling back to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Reader for workflow documents.
pub struct DefinitionReader;

impl DefinitionReader {
    /// Parse one workflow document from a byte stream.
    ///
    /// `origin` names the stream in error messages.
    pub fn from_reader(
        mut reader: impl Read,
        format: DocumentFormat,
        origin: &str,
    ) -> DefinitionResult<WorkflowDefinition> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| DefinitionError::Read {
                origin: origin.to_string(),
                source,
            })?;
        let content = String::from_utf8(bytes).map_err(|e| DefinitionError::Parse {
            origin: origin.to_string(),
            message: format!("document is not valid UTF-8: {}", e.utf8_error()),
        })?;
        Self::from_str(&content, format, origin)
    }

    /// Parse one workflow document from text.
    pub fn from_str(
        content: &str,
        format: DocumentFormat,
        origin: &str,
    ) -> DefinitionResult<WorkflowDefinition> {
        let parsed = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| DefinitionError::Parse {
            origin: origin.to_string(),
            message,
        })
    }

    /// Read a workflow document from a file.
    pub fn read_file(path: impl AsRef<Path>) -> DefinitionResult<WorkflowDefinition> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        debug!("Reading workflow definition from {:?}", path);

        let file = File::open(path).map_err(|source| DefinitionError::Read {
            origin: origin.clone(),
            source,
        })?;
        Self::from_reader(file, DocumentFormat::from_path(path), &origin)
    }

    /// Read every workflow document directly inside `dir`.
    ///
    /// Sub-directories are skipped. Entries are visited in file-name order.
    /// When `extensions` is non-empty only files with one of those
    /// extensions are read. The first failing file aborts the whole read.
    pub fn read_dir(
        dir: impl AsRef<Path>,
        extensions: &[String],
    ) -> DefinitionResult<Vec<(PathBuf, WorkflowDefinition)>> {
        let dir = dir.as_ref();
        let mut definitions = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| DefinitionError::Read {
                origin: dir.display().to_string(),
                source: e.into(),
            })?;
            let path = entry.path();

            if path.is_dir() {
                debug!("Skipping sub-directory {:?}", path);
                continue;
            }
            if !Self::matches_extension(path, extensions) {
                debug!("Skipping {:?} (extension not selected)", path);
                continue;
            }

            let definition = Self::read_file(path).map_err(|e| DefinitionError::Load {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;
            definitions.push((path.to_path_buf(), definition));
        }

        Ok(definitions)
    }

    fn matches_extension(path: &Path, extensions: &[String]) -> bool {
        if extensions.is_empty() {
            return true;
        }
        path.extension().map_or(false, |ext| {
            let ext = ext.to_string_lossy();
            extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES_ORDER_YAML: &str = r#"
workflow_id: sales_order
model: sale.order
initial: draft
states: [draft, quotation, confirmed, cancelled]
transitions:
  - name: confirm
    from: [draft, quotation]
    to: confirmed
    validator: credit_check
  - name: cancel
    from: ["*"]
    to: cancelled
"#;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("noext")), DocumentFormat::Yaml);
    }

    #[test]
    fn test_from_reader_yaml() {
        let wf = DefinitionReader::from_reader(
            SALES_ORDER_YAML.as_bytes(),
            DocumentFormat::Yaml,
            "inline",
        )
        .unwrap();

        assert_eq!(wf.id, "sales_order");
        assert_eq!(wf.model, "sale.order");
        assert_eq!(wf.initial_state, "draft");
        assert_eq!(wf.states.len(), 4);
        assert_eq!(wf.transitions[0].validator.as_deref(), Some("credit_check"));
        assert!(wf.transitions[1].is_wildcard());
    }

    #[test]
    fn test_from_str_toml() {
        let content = r#"
workflow_id = "quality_check"
model = "quality.inspection"
initial = "pending"
states = ["pending", "passed", "failed"]

[[transitions]]
name = "pass"
from = "pending"
to = "passed"

[[transitions]]
name = "fail"
from = ["pending"]
to = "failed"
permission = "qc.inspector"
"#;
        let wf = DefinitionReader::from_str(content, DocumentFormat::Toml, "inline").unwrap();
        assert_eq!(wf.id, "quality_check");
        assert_eq!(wf.transitions.len(), 2);
        assert_eq!(wf.transitions[1].permission.as_deref(), Some("qc.inspector"));
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let err = DefinitionReader::from_str("workflow_id: [unclosed", DocumentFormat::Yaml, "bad.yaml")
            .unwrap_err();
        match err {
            DefinitionError::Parse { origin, .. } => assert_eq!(origin, "bad.yaml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let content: &[u8] = b"workflow_id: \xff\xfe\ninitial: draft\n";
        let err = DefinitionReader::from_reader(content, DocumentFormat::Yaml, "bad.yaml").unwrap_err();
        match err {
            DefinitionError::Parse { origin, message } => {
                assert_eq!(origin, "bad.yaml");
                assert!(message.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let err = DefinitionReader::from_str(r#"{"workflow_id": "x"}"#, DocumentFormat::Json, "x.json")
            .unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = DefinitionReader::read_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Read { .. }));
    }

    #[test]
    fn test_matches_extension() {
        let exts = vec!["yaml".to_string(), ".yml".to_string()];
        assert!(DefinitionReader::matches_extension(Path::new("a.yaml"), &exts));
        assert!(DefinitionReader::matches_extension(Path::new("a.YML"), &exts));
        assert!(!DefinitionReader::matches_extension(Path::new("a.json"), &exts));
        assert!(!DefinitionReader::matches_extension(Path::new("README"), &exts));
        assert!(DefinitionReader::matches_extension(Path::new("README"), &[]));
    }
}
