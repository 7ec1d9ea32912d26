//! Tier-keyed instruction templates.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::prompt::tier::ModelTier;

/// Environment variable naming a directory of template overrides.
pub const TEMPLATE_DIR_ENV_VAR: &str = "CMAI_TEMPLATE_DIR";

const BUILTIN_SMALL: &str = include_str!("../../templates/small.md");
const BUILTIN_MEDIUM: &str = include_str!("../../templates/medium.md");
const BUILTIN_LARGE: &str = include_str!("../../templates/large.md");

/// Used when a template file cannot be read.
pub const MINIMAL_TEMPLATE: &str = "Write a conventional commit message. \
Type must be one of: feat, fix, docs, style, refactor, perf, test, chore. \
Subject max 70 characters, no period. Reply with the commit message only.";

/// Instruction text for each model tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStore {
    small: String,
    medium: String,
    large: String,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateStore {
    /// Templates compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            small: BUILTIN_SMALL.trim().to_string(),
            medium: BUILTIN_MEDIUM.trim().to_string(),
            large: BUILTIN_LARGE.trim().to_string(),
        }
    }

    /// Read `small.md`, `medium.md` and `large.md` from `dir`.
    ///
    /// A missing or unreadable file falls back to [`MINIMAL_TEMPLATE`].
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            small: read_template(dir, ModelTier::Small),
            medium: read_template(dir, ModelTier::Medium),
            large: read_template(dir, ModelTier::Large),
        }
    }

    /// Pick the template source: an explicit directory, then
    /// `CMAI_TEMPLATE_DIR`, then the builtin templates.
    pub fn resolve(explicit_dir: Option<&Path>) -> Self {
        let dir = explicit_dir.map(Path::to_path_buf).or_else(|| {
            std::env::var(TEMPLATE_DIR_ENV_VAR)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        });

        match dir {
            Some(dir) => {
                debug!(dir = %dir.display(), "Loading prompt templates from directory");
                Self::from_dir(&dir)
            }
            None => Self::builtin(),
        }
    }

    pub fn get(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Small => &self.small,
            ModelTier::Medium => &self.medium,
            ModelTier::Large => &self.large,
        }
    }
}

fn read_template(dir: &Path, tier: ModelTier) -> String {
    let path = dir.join(format!("{tier}.md"));
    match std::fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(path = %path.display(), "Template file is empty, using minimal template");
            MINIMAL_TEMPLATE.to_string()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read template, using minimal template");
            MINIMAL_TEMPLATE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_builtin_templates_differ_by_tier() {
        let store = TemplateStore::builtin();
        let small = store.get(ModelTier::Small);
        let large = store.get(ModelTier::Large);

        assert!(small.contains("Example 1"));
        assert!(!large.contains("Example"));
        assert!(small.len() > store.get(ModelTier::Medium).len());
        assert!(store.get(ModelTier::Medium).len() > large.len());
    }

    #[test]
    fn test_from_dir_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.md"), "tiny rules\n").unwrap();
        std::fs::write(dir.path().join("medium.md"), "medium rules").unwrap();
        std::fs::write(dir.path().join("large.md"), "big rules").unwrap();

        let store = TemplateStore::from_dir(dir.path());
        assert_eq!(store.get(ModelTier::Small), "tiny rules");
        assert_eq!(store.get(ModelTier::Medium), "medium rules");
        assert_eq!(store.get(ModelTier::Large), "big rules");
    }

    #[test]
    fn test_missing_template_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("medium.md"), "medium rules").unwrap();
        std::fs::write(dir.path().join("large.md"), "   \n").unwrap();

        let store = TemplateStore::from_dir(dir.path());
        assert_eq!(store.get(ModelTier::Small), MINIMAL_TEMPLATE);
        assert_eq!(store.get(ModelTier::Medium), "medium rules");
        assert_eq!(store.get(ModelTier::Large), MINIMAL_TEMPLATE);
    }

    #[test]
    #[serial]
    fn test_resolve_uses_env_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("large.md"), "from env").unwrap();

        temp_env::with_var(TEMPLATE_DIR_ENV_VAR, Some(dir.path()), || {
            let store = TemplateStore::resolve(None);
            assert_eq!(store.get(ModelTier::Large), "from env");
        });
    }

    #[test]
    #[serial]
    fn test_resolve_prefers_explicit_dir() {
        let env_dir = tempfile::tempdir().unwrap();
        let cli_dir = tempfile::tempdir().unwrap();
        std::fs::write(env_dir.path().join("large.md"), "from env").unwrap();
        std::fs::write(cli_dir.path().join("large.md"), "from flag").unwrap();

        temp_env::with_var(TEMPLATE_DIR_ENV_VAR, Some(env_dir.path()), || {
            let store = TemplateStore::resolve(Some(cli_dir.path()));
            assert_eq!(store.get(ModelTier::Large), "from flag");
        });
    }

    #[test]
    #[serial]
    fn test_resolve_defaults_to_builtin() {
        temp_env::with_var_unset(TEMPLATE_DIR_ENV_VAR, || {
            assert_eq!(TemplateStore::resolve(None), TemplateStore::builtin());
        });
    }
}
