//! Template loader for reading prompt templates from disk.
//!
//! Templates live one per file under a root directory. The tree is walked
//! recursively; subdirectories are free-form categories and do not affect
//! template names.

use crate::types::Template;
use promptd_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of YAML template files. `json` is the only other format.
pub const YAML_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Serialization format of a template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Yaml,
    Json,
}

impl TemplateFormat {
    /// Detect the format from a file path, or `None` for unrecognized files.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if YAML_EXTENSIONS.contains(&ext) => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Somewhere templates can be loaded from.
pub trait TemplateSource: Send + Sync + std::fmt::Debug {
    /// Load the complete current set of templates.
    fn load(&self) -> AppResult<Vec<Template>>;
}

/// Templates stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource for DirectorySource {
    fn load(&self) -> AppResult<Vec<Template>> {
        load_templates(&self.root)
    }
}

/// Parse template text and validate it.
pub fn parse_template(text: &str, format: TemplateFormat) -> AppResult<Template> {
    let template: Template = match format {
        TemplateFormat::Yaml => serde_yaml::from_str(text)
            .map_err(|e| AppError::Template(format!("Failed to parse YAML: {}", e)))?,
        TemplateFormat::Json => serde_json::from_str(text)
            .map_err(|e| AppError::Template(format!("Failed to parse JSON: {}", e)))?,
    };

    validate_template(&template)?;

    Ok(template)
}

/// Load a single template file.
pub fn load_template_file(path: &Path) -> AppResult<Template> {
    let format = TemplateFormat::from_path(path).ok_or_else(|| {
        AppError::Template(format!("Unsupported template file extension: {:?}", path))
    })?;

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Template(format!("Failed to read template file {:?}: {}", path, e))
    })?;

    parse_template(&contents, format)
        .map_err(|e| AppError::Template(format!("{:?}: {}", path, e)))
}

/// Load every template found under `root`.
///
/// Only a failure to walk `root` itself is fatal. Files that cannot be read,
/// parsed or validated are logged and skipped. Entries are visited in file
/// name order so the result is the same on every platform.
pub fn load_templates(root: &Path) -> AppResult<Vec<Template>> {
    tracing::info!("Loading templates from {:?}", root);

    if !root.is_dir() {
        return Err(AppError::Load(format!(
            "Template root is not a readable directory: {:?}",
            root
        )));
    }

    let mut templates = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(AppError::Load(format!(
                    "Failed to walk template root {:?}: {}",
                    root, e
                )));
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if TemplateFormat::from_path(path).is_none() {
            continue;
        }

        match load_template_file(path) {
            Ok(template) => {
                tracing::debug!("Loaded template {} from {:?}", template.name, path);
                templates.push(template);
            }
            Err(e) => tracing::warn!("Error loading template: {}", e),
        }
    }

    tracing::info!(
        "Finished loading templates. Found {} templates in {:?}",
        templates.len(),
        root
    );

    Ok(templates)
}

/// Validate a template definition.
fn validate_template(template: &Template) -> AppResult<()> {
    if template.name.is_empty() {
        return Err(AppError::Template(
            "Template name is required".to_string(),
        ));
    }

    Ok(())
}
