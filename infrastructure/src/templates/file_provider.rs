//! File-backed template provider with an in-memory cache.
//!
//! `<dir>/<name>.md` overrides the built-in body for `name` (`think`,
//! `debate`, `vote`). Each file is read at most once; the cached version is
//! `v` followed by the 16-hex-digit hash of the body, so an audit record can
//! tell which prompt produced a payload. Missing or empty files fall back to
//! the built-in template.

use council_application::ports::template_provider::{CachedTemplate, TemplateProvider};
use council_domain::TemplateName;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub struct FileTemplateProvider {
    dir: PathBuf,
    cache: Mutex<HashMap<TemplateName, CachedTemplate>>,
}

impl FileTemplateProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Forget cached bodies; the next `get` re-reads the files.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn path_for(&self, name: TemplateName) -> PathBuf {
        self.dir.join(format!("{}.md", name.as_str()))
    }

    fn load(&self, name: TemplateName) -> CachedTemplate {
        let path = self.path_for(name);
        match std::fs::read_to_string(&path) {
            Ok(body) if !body.trim().is_empty() => {
                let version = body_version(&body);
                debug!(template = %name, version = %version, path = %path.display(), "Loaded prompt template");
                CachedTemplate {
                    name: name.as_str().to_string(),
                    version,
                    body,
                }
            }
            Ok(_) => {
                warn!(template = %name, path = %path.display(), "Template file is empty, using built-in");
                CachedTemplate::builtin(name)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(template = %name, "No template file, using built-in");
                CachedTemplate::builtin(name)
            }
            Err(e) => {
                warn!(template = %name, path = %path.display(), error = %e, "Could not read template, using built-in");
                CachedTemplate::builtin(name)
            }
        }
    }
}

impl TemplateProvider for FileTemplateProvider {
    fn get(&self, name: TemplateName) -> Option<CachedTemplate> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let template = cache.entry(name).or_insert_with(|| self.load(name));
        Some(template.clone())
    }
}

/// `v<16 hex digits>` version tag for a template body
fn body_version(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("v{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{BUILTIN_TEMPLATE_VERSION, PromptTemplate};
    use std::fs;

    #[test]
    fn test_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vote.md"), "Vote on:\n{context}\n").unwrap();
        let provider = FileTemplateProvider::new(dir.path());

        let template = provider.get(TemplateName::Vote).unwrap();
        assert_eq!(template.name, "vote");
        assert_eq!(template.body, "Vote on:\n{context}\n");
        assert!(template.version.starts_with('v'));
        assert_eq!(template.version.len(), 17);
        assert!(template.version[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileTemplateProvider::new(dir.path());

        let template = provider.get(TemplateName::Think).unwrap();
        assert_eq!(template.version, BUILTIN_TEMPLATE_VERSION);
        assert_eq!(template.body, PromptTemplate::builtin(TemplateName::Think));
    }

    #[test]
    fn test_empty_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("debate.md"), "  \n").unwrap();
        let provider = FileTemplateProvider::new(dir.path());
        assert_eq!(
            provider.get(TemplateName::Debate).unwrap().version,
            BUILTIN_TEMPLATE_VERSION
        );
    }

    #[test]
    fn test_template_is_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vote.md");
        fs::write(&path, "first {context}").unwrap();
        let provider = FileTemplateProvider::new(dir.path());

        let first = provider.get(TemplateName::Vote).unwrap();
        fs::write(&path, "second {context}").unwrap();
        let cached = provider.get(TemplateName::Vote).unwrap();
        assert_eq!(first, cached);

        provider.clear();
        let reloaded = provider.get(TemplateName::Vote).unwrap();
        assert_eq!(reloaded.body, "second {context}");
        assert_ne!(reloaded.version, first.version);
    }

    #[test]
    fn test_version_is_stable_for_same_body() {
        assert_eq!(body_version("abc"), body_version("abc"));
        assert_ne!(body_version("abc"), body_version("abd"));
    }
}
