//! The prompt server: registry, template source and management operations.
//!
//! Template tools and prompts resolve their template by name against the
//! live registry on every call, so a reload is visible to the next request
//! and a template removed by a reload answers with `NotFound`.

use promptd_core::{AppError, AppResult};
use promptd_prompt::{
    call_template_tool, get_template_prompt, parse_template, ArgValue, DirectorySource,
    PromptDefinition, PromptResult, Registry, TemplateFormat, TemplateSource, ToolDefinition,
    YAML_EXTENSIONS,
};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

pub const RELOAD_PROMPTS: &str = "reload_prompts";
pub const ADD_PROMPT: &str = "add_prompt";
pub const GET_PROMPT_GENERATE_RULE: &str = "get_prompt_generate_rule";
pub const GET_PROMPT_NAMES: &str = "get_prompt_names";

/// Tool names handled by the server itself. They shadow template tools of
/// the same name.
pub const MANAGEMENT_TOOLS: [&str; 4] = [
    RELOAD_PROMPTS,
    ADD_PROMPT,
    GET_PROMPT_GENERATE_RULE,
    GET_PROMPT_NAMES,
];

/// Serves the templates under a prompts directory.
#[derive(Debug)]
pub struct PromptServer {
    prompts_dir: PathBuf,
    rule_file: PathBuf,
    source: Box<dyn TemplateSource>,
    registry: Registry,
}

impl PromptServer {
    /// Create a server over `prompts_dir` and perform the initial load.
    ///
    /// Fails if the directory cannot be walked.
    pub fn new(prompts_dir: impl Into<PathBuf>, rule_file: impl Into<PathBuf>) -> AppResult<Self> {
        let prompts_dir = prompts_dir.into();
        let source = DirectorySource::new(prompts_dir.clone());
        Self::with_source(prompts_dir, rule_file, Box::new(source))
    }

    /// Create a server that loads templates from `source`.
    ///
    /// `prompts_dir` is still the write target of `add_prompt`.
    pub fn with_source(
        prompts_dir: impl Into<PathBuf>,
        rule_file: impl Into<PathBuf>,
        source: Box<dyn TemplateSource>,
    ) -> AppResult<Self> {
        let server = Self {
            prompts_dir: prompts_dir.into(),
            rule_file: rule_file.into(),
            source,
            registry: Registry::new(),
        };
        server.reload()?;
        Ok(server)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    /// Reload every template and replace the registry snapshot.
    pub fn reload(&self) -> AppResult<usize> {
        let templates = self.source.load()?;
        let count = self.registry.rebuild(templates);

        for name in MANAGEMENT_TOOLS {
            if self.registry.get(name).is_some() {
                tracing::warn!(
                    "Template {:?} is shadowed by the management tool of the same name",
                    name
                );
            }
        }

        Ok(count)
    }

    /// Write a new template file into `category` and reload.
    ///
    /// The content must be YAML whose `name` equals `filename` without its
    /// extension. Validation happens before anything touches the disk. If
    /// the reload fails the file is rolled back to its previous state.
    pub fn add_prompt(&self, category: &str, filename: &str, yaml_content: &str) -> AppResult<String> {
        if category.is_empty() || filename.is_empty() || yaml_content.is_empty() {
            return Err(AppError::InvalidArguments(
                "category, filename, and yaml_content are required and cannot be empty".to_string(),
            ));
        }

        // Both must stay below the prompts root as plain names
        if !is_plain_relative(category) {
            return Err(AppError::InvalidArguments(format!(
                "category '{}' must be a relative directory inside the prompts directory",
                category
            )));
        }
        if Path::new(filename).components().count() != 1 || !is_plain_relative(filename) {
            return Err(AppError::InvalidArguments(format!(
                "filename '{}' must be a plain file name",
                filename
            )));
        }

        let expected_name = YAML_EXTENSIONS
            .iter()
            .find_map(|ext| filename.strip_suffix(*ext)?.strip_suffix('.'))
            .ok_or_else(|| {
                AppError::InvalidArguments("filename must end with .yaml or .yml".to_string())
            })?;
        if expected_name.is_empty() {
            return Err(AppError::InvalidArguments(
                "filename must have a name before its extension".to_string(),
            ));
        }

        let template = parse_template(yaml_content, TemplateFormat::Yaml)?;

        if template.name != expected_name {
            return Err(AppError::Template(format!(
                "prompt name in YAML ('{}') does not match filename ('{}')",
                template.name, expected_name
            )));
        }

        let category_dir = self.prompts_dir.join(category);
        std::fs::create_dir_all(&category_dir).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create category directory '{}': {}", category, e),
            ))
        })?;

        let path = category_dir.join(filename);
        let previous = std::fs::read(&path).ok();

        if let Err(e) = std::fs::write(&path, yaml_content) {
            restore_file(&path, previous.as_deref()).ok();
            return Err(AppError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to write prompt file to {:?}: {}", path, e),
            )));
        }

        if let Err(reload_err) = self.reload() {
            return Err(match restore_file(&path, previous.as_deref()) {
                Ok(()) => AppError::ReloadRolledBack {
                    path,
                    reason: reload_err.to_string(),
                },
                Err(cleanup_err) => {
                    tracing::error!(
                        "Failed to roll back prompt file {:?} after reload error: {}",
                        path,
                        cleanup_err
                    );
                    AppError::ReloadOrphaned {
                        path,
                        reason: reload_err.to_string(),
                        cleanup: cleanup_err.to_string(),
                    }
                }
            });
        }

        tracing::info!("Added prompt {}/{}", category, filename);
        Ok(format!(
            "Prompt {}/{} added and reloaded successfully.",
            category, filename
        ))
    }

    /// Count and list of the active template names.
    pub fn prompt_names(&self) -> String {
        let names = self.registry.names();
        let mut text = format!("Available prompts ({}):\n", names.len());
        for name in &names {
            text.push_str("- ");
            text.push_str(name);
            text.push('\n');
        }
        text
    }

    /// Contents of the rule file describing the template format.
    pub fn generate_rule(&self) -> AppResult<String> {
        std::fs::read_to_string(&self.rule_file).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {:?}: {}", self.rule_file, e),
            ))
        })
    }

    /// Management tools followed by one tool per template.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut tools = management_tool_definitions();
        tools.extend(
            self.registry
                .catalog()
                .tools
                .into_iter()
                .filter(|t| !MANAGEMENT_TOOLS.contains(&t.name.as_str())),
        );
        tools
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.registry.catalog().prompts
    }

    /// Invoke a tool by name and return its text output.
    pub fn call_tool(&self, name: &str, args: &HashMap<String, ArgValue>) -> AppResult<String> {
        tracing::debug!("Calling tool {}", name);

        match name {
            RELOAD_PROMPTS => {
                let count = self.reload()?;
                Ok(format!("Successfully reloaded {} prompts", count))
            }
            ADD_PROMPT => self.add_prompt(
                string_arg(args, "category")?,
                string_arg(args, "filename")?,
                string_arg(args, "yaml_content")?,
            ),
            GET_PROMPT_GENERATE_RULE => self.generate_rule(),
            GET_PROMPT_NAMES => Ok(self.prompt_names()),
            _ => {
                let template = self
                    .registry
                    .get(name)
                    .ok_or_else(|| AppError::NotFound(format!("tool '{}'", name)))?;
                Ok(call_template_tool(&template, args))
            }
        }
    }

    /// Retrieve a template as a rendered prompt.
    pub fn get_prompt(&self, name: &str, args: &HashMap<String, String>) -> AppResult<PromptResult> {
        let template = self
            .registry
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("prompt '{}'", name)))?;
        Ok(get_template_prompt(&template, args))
    }
}

fn management_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::with_string_inputs(
            RELOAD_PROMPTS,
            "Hot reload all prompt templates",
            &[],
            &[],
        ),
        ToolDefinition::with_string_inputs(
            ADD_PROMPT,
            "Adds a new prompt to the server. Requires category, filename, and YAML content for the prompt. Reloads prompts on success.",
            &[
                ("category", "The category (subdirectory) for the new prompt."),
                ("filename", "The filename for the new prompt (e.g., my_new_prompt.yaml)."),
                ("yaml_content", "The YAML content of the new prompt."),
            ],
            &["category", "filename", "yaml_content"],
        ),
        ToolDefinition::with_string_inputs(
            GET_PROMPT_GENERATE_RULE,
            "Returns the rule text that defines the YAML structure for prompts.",
            &[],
            &[],
        ),
        ToolDefinition::with_string_inputs(
            GET_PROMPT_NAMES,
            "List all available prompt names",
            &[],
            &[],
        ),
    ]
}

fn string_arg<'a>(args: &'a HashMap<String, ArgValue>, key: &str) -> AppResult<&'a str> {
    match args.get(key) {
        Some(ArgValue::String(s)) => Ok(s.as_str()),
        _ => Err(AppError::InvalidArguments(
            "category, filename, and yaml_content are required and cannot be empty".to_string(),
        )),
    }
}

/// True when `path` is non-empty and made only of normal components.
fn is_plain_relative(path: &str) -> bool {
    let path = Path::new(path);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Put `path` back to `previous` contents, or remove it if it did not exist.
fn restore_file(path: &Path, previous: Option<&[u8]>) -> std::io::Result<()> {
    match previous {
        Some(bytes) => std::fs::write(path, bytes),
        None => match std::fs::remove_file(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptd_prompt::{load_templates, Template};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const GREET: &str = "name: greet\nmessages: []\n";

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn server_with(files: &[(&str, &str)]) -> (TempDir, PromptServer) {
        let temp_dir = TempDir::new().unwrap();
        for (relative, contents) in files {
            write(temp_dir.path(), relative, contents);
        }
        let rule = temp_dir.path().join("generate_rule.txt");
        let server = PromptServer::new(temp_dir.path().join("prompts"), rule).unwrap();
        (temp_dir, server)
    }

    /// Loads from disk on the first call and fails on every later one.
    #[derive(Debug)]
    struct FailAfterFirst {
        root: PathBuf,
        calls: AtomicUsize,
    }

    impl TemplateSource for FailAfterFirst {
        fn load(&self) -> AppResult<Vec<Template>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                load_templates(&self.root)
            } else {
                Err(AppError::Load("template root went away".to_string()))
            }
        }
    }

    /// Loads on the first call. Later calls turn the file at `blocker` into
    /// a non-empty directory, so it cannot be removed, and then fail.
    #[derive(Debug)]
    struct BlockCleanup {
        root: PathBuf,
        blocker: PathBuf,
        calls: AtomicUsize,
    }

    impl TemplateSource for BlockCleanup {
        fn load(&self) -> AppResult<Vec<Template>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return load_templates(&self.root);
            }
            fs::remove_file(&self.blocker)?;
            fs::create_dir(&self.blocker)?;
            fs::write(self.blocker.join("keep"), "x")?;
            Err(AppError::Load("template root went away".to_string()))
        }
    }

    #[test]
    fn test_new_fails_on_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = PromptServer::new(temp_dir.path().join("absent"), "rule.txt");
        assert!(matches!(result, Err(AppError::Load(_))));
    }

    #[test]
    fn test_add_prompt_then_listed() {
        let (temp_dir, server) = server_with(&[("prompts/x.yaml", "name: existing\n")]);

        let text = server.add_prompt("demo", "greet.yaml", GREET).unwrap();
        assert_eq!(text, "Prompt demo/greet.yaml added and reloaded successfully.");
        assert!(temp_dir.path().join("prompts/demo/greet.yaml").is_file());

        let names = server.call_tool(GET_PROMPT_NAMES, &HashMap::new()).unwrap();
        assert_eq!(names, "Available prompts (2):\n- existing\n- greet\n");
    }

    #[test]
    fn test_add_prompt_name_mismatch_writes_nothing() {
        let (temp_dir, server) = server_with(&[("prompts/x.yaml", "name: existing\n")]);

        let err = server
            .add_prompt("demo", "greet.yaml", "name: other\nmessages: []\n")
            .unwrap_err();
        assert!(err.to_string().contains("'other'"));
        assert!(err.to_string().contains("'greet'"));
        assert!(!temp_dir.path().join("prompts/demo").exists());
        assert_eq!(server.registry().names(), vec!["existing".to_string()]);
    }

    #[test]
    fn test_add_prompt_validation() {
        let (_temp_dir, server) = server_with(&[("prompts/x.yaml", "name: existing\n")]);

        assert!(matches!(
            server.add_prompt("", "greet.yaml", GREET),
            Err(AppError::InvalidArguments(_))
        ));
        assert!(matches!(
            server.add_prompt("demo", "greet.json", GREET),
            Err(AppError::InvalidArguments(_))
        ));
        assert!(matches!(
            server.add_prompt("demo", "greet.yaml", "name: [unclosed"),
            Err(AppError::Template(_))
        ));
        assert!(matches!(
            server.add_prompt("demo", "greet.yaml", "description: nameless\n"),
            Err(AppError::Template(_))
        ));
    }

    #[test]
    fn test_add_prompt_rolls_back_when_reload_fails() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "prompts/x.yaml", "name: existing\n");
        let root = temp_dir.path().join("prompts");
        let source = FailAfterFirst {
            root: root.clone(),
            calls: AtomicUsize::new(0),
        };
        let server = PromptServer::with_source(&root, "rule.txt", Box::new(source)).unwrap();

        let err = server.add_prompt("demo", "greet.yaml", GREET).unwrap_err();
        assert!(matches!(err, AppError::ReloadRolledBack { .. }));
        assert!(!root.join("demo/greet.yaml").exists());
        assert_eq!(server.registry().names(), vec!["existing".to_string()]);
    }

    #[test]
    fn test_add_prompt_reports_orphaned_file() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "prompts/x.yaml", "name: existing\n");
        let root = temp_dir.path().join("prompts");
        let target = root.join("demo/greet.yaml");
        let source = BlockCleanup {
            root: root.clone(),
            blocker: target.clone(),
            calls: AtomicUsize::new(0),
        };
        let server = PromptServer::with_source(&root, "rule.txt", Box::new(source)).unwrap();

        let err = server.add_prompt("demo", "greet.yaml", GREET).unwrap_err();
        match &err {
            AppError::ReloadOrphaned { path, .. } => assert_eq!(path, &target),
            other => panic!("expected ReloadOrphaned, got {:?}", other),
        }
        assert!(err.to_string().contains(&target.display().to_string()));
        assert!(target.exists());
        assert_eq!(server.registry().names(), vec!["existing".to_string()]);
    }

    #[test]
    fn test_add_prompt_rejects_paths_outside_root() {
        let (temp_dir, server) = server_with(&[("prompts/x.yaml", "name: existing\n")]);
        let escape = "name: escape\nmessages: []\n";

        for (category, filename) in [
            ("demo", "../../escape.yaml"),
            ("demo", "sub/escape.yaml"),
            ("../outside", "escape.yaml"),
            ("/tmp", "escape.yaml"),
            ("demo/../..", "escape.yaml"),
            (".", "escape.yaml"),
        ] {
            assert!(
                matches!(
                    server.add_prompt(category, filename, escape),
                    Err(AppError::InvalidArguments(_))
                ),
                "{}/{} was accepted",
                category,
                filename
            );
        }

        assert!(!temp_dir.path().join("escape.yaml").exists());
        assert!(!temp_dir.path().join("outside").exists());
        assert_eq!(server.registry().names(), vec!["existing".to_string()]);
    }

    #[test]
    fn test_add_prompt_requires_name_before_extension() {
        let (temp_dir, server) = server_with(&[("prompts/x.yaml", "name: existing\n")]);

        let result = server.add_prompt("demo", ".yaml", "name: .yaml\nmessages: []\n");
        assert!(matches!(result, Err(AppError::InvalidArguments(_))));
        assert!(!temp_dir.path().join("prompts/demo").exists());

        // Nested categories and .yml are fine
        server
            .add_prompt("code/rust", "lint.yml", "name: lint\nmessages: []\n")
            .unwrap();
        assert_eq!(
            server.registry().names(),
            vec!["existing".to_string(), "lint".to_string()]
        );
    }

    #[test]
    fn test_rollback_restores_overwritten_file() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "prompts/demo/greet.yaml", "name: greet\ndescription: v1\n");
        let root = temp_dir.path().join("prompts");
        let source = FailAfterFirst {
            root: root.clone(),
            calls: AtomicUsize::new(0),
        };
        let server = PromptServer::with_source(&root, "rule.txt", Box::new(source)).unwrap();

        assert!(server
            .add_prompt("demo", "greet.yaml", "name: greet\ndescription: v2\n")
            .is_err());
        assert_eq!(
            fs::read_to_string(root.join("demo/greet.yaml")).unwrap(),
            "name: greet\ndescription: v1\n"
        );
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let (temp_dir, server) = server_with(&[("prompts/a.yaml", "name: a\n")]);
        write(temp_dir.path(), "prompts/b.yaml", "name: b\n");
        fs::remove_file(temp_dir.path().join("prompts/a.yaml")).unwrap();

        let text = server.call_tool(RELOAD_PROMPTS, &HashMap::new()).unwrap();
        assert_eq!(text, "Successfully reloaded 1 prompts");
        assert_eq!(server.registry().names(), vec!["b".to_string()]);
    }

    #[test]
    fn test_removed_template_is_not_found() {
        let (temp_dir, server) = server_with(&[(
            "prompts/a.yaml",
            "name: a\nmessages:\n  - role: user\n    content:\n      type: text\n      text: hi\n",
        )]);
        assert_eq!(server.call_tool("a", &HashMap::new()).unwrap(), "hi");

        fs::remove_file(temp_dir.path().join("prompts/a.yaml")).unwrap();
        server.reload().unwrap();

        assert!(matches!(
            server.call_tool("a", &HashMap::new()),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            server.get_prompt("a", &HashMap::new()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_generate_rule() {
        let (temp_dir, server) = server_with(&[("prompts/a.yaml", "name: a\n")]);
        assert!(matches!(server.generate_rule(), Err(AppError::Io(_))));

        write(temp_dir.path(), "generate_rule.txt", "rule text\n");
        assert_eq!(
            server.call_tool(GET_PROMPT_GENERATE_RULE, &HashMap::new()).unwrap(),
            "rule text\n"
        );
    }

    #[test]
    fn test_management_tools_shadow_templates() {
        let (_temp_dir, server) = server_with(&[
            ("prompts/a.yaml", "name: a\n"),
            ("prompts/r.yaml", "name: reload_prompts\n"),
        ]);

        let tools = server.list_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![RELOAD_PROMPTS, ADD_PROMPT, GET_PROMPT_GENERATE_RULE, GET_PROMPT_NAMES, "a"]
        );
        assert_eq!(server.list_prompts().len(), 2);
    }

    #[test]
    fn test_add_prompt_tool_requires_string_args() {
        let (_temp_dir, server) = server_with(&[("prompts/a.yaml", "name: a\n")]);
        let mut args = HashMap::new();
        args.insert("category".to_string(), ArgValue::from("demo"));
        args.insert("filename".to_string(), ArgValue::from(serde_json::json!(7)));
        args.insert("yaml_content".to_string(), ArgValue::from(GREET));

        assert!(matches!(
            server.call_tool(ADD_PROMPT, &args),
            Err(AppError::InvalidArguments(_))
        ));
    }
}
