//! YAML-file-backed rule store with optional hot-reload.
//!
//! Scans a directory (recursively) for `*.yml` / `*.yaml` files, each
//! holding one [`DetectionRule`] document, and maintains an in-memory map
//! keyed by source path. Parse errors are reported per-file and never
//! abort a scan. [`FileRuleStore::watch`] installs a `notify` watcher that
//! upserts or removes rules as files change on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use watchtower_core::DetectionRule;

use super::{RuleStore, StoreError};

type RuleMap = Arc<RwLock<HashMap<PathBuf, DetectionRule>>>;

pub struct FileRuleStore {
    rules_dir: PathBuf,
    rules: RuleMap,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl FileRuleStore {
    /// Create a new store for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        let rules_dir = rules_dir.into();
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            rules: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    /// Rescan the rules directory, replacing the in-memory set.
    ///
    /// Returns the number of rules loaded. Unparseable files are skipped
    /// with a warning.
    pub fn load_all(&self) -> Result<usize, StoreError> {
        let mut loaded = HashMap::new();
        scan_dir_recursive(&self.rules_dir, &mut loaded)?;
        let count = loaded.len();
        let mut rules = self
            .rules
            .write()
            .map_err(|_| StoreError::Backend("rule map lock poisoned".to_string()))?;
        *rules = loaded;
        info!(rules = count, dir = %self.rules_dir.display(), "rules loaded");
        Ok(count)
    }

    /// Install a filesystem watcher that hot-reloads rules on change.
    pub fn watch(&mut self) -> Result<(), StoreError> {
        let rules = Arc::clone(&self.rules);
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => handle_fs_event(&event, &rules),
                Err(e) => warn!(error = %e, "rules watcher error"),
            },
            notify::Config::default(),
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        watcher
            .watch(&self.rules_dir, RecursiveMode::Recursive)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        info!(dir = %self.rules_dir.display(), "watching rules directory for changes");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn fetch_enabled(&self) -> Result<Vec<DetectionRule>, StoreError> {
        let rules = self
            .rules
            .read()
            .map_err(|_| StoreError::Backend("rule map lock poisoned".to_string()))?;
        Ok(rules.values().filter(|r| r.enabled).cloned().collect())
    }
}

/// Whether a path looks like a rule file: YAML extension, not a dotfile.
fn is_rule_file(path: &Path) -> bool {
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false);
    if !is_yaml {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| !n.starts_with('.'))
        .unwrap_or(false)
}

fn parse_rule_file(path: &Path) -> Result<DetectionRule, String> {
    let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_yaml::from_str(&contents).map_err(|e| e.to_string())
}

fn scan_dir_recursive(
    dir: &Path,
    loaded: &mut HashMap<PathBuf, DetectionRule>,
) -> Result<(), StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to read directory");
            return Ok(());
        }
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        // Skip dotfiles/dotdirs entirely.
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        if path.is_dir() {
            scan_dir_recursive(&path, loaded)?;
            continue;
        }

        if !is_rule_file(&path) {
            continue;
        }

        match parse_rule_file(&path) {
            Ok(rule) => {
                loaded.insert(path, rule);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse rule file, skipping");
            }
        }
    }
    Ok(())
}

/// Handle a single filesystem event from the notify watcher.
fn handle_fs_event(event: &Event, rules: &RuleMap) {
    for path in &event.paths {
        if !is_rule_file(path) {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_)) => match parse_rule_file(path) {
                Ok(rule) => {
                    info!(rule_id = %rule.id, path = %path.display(), "hot-reloaded rule");
                    if let Ok(mut map) = rules.write() {
                        map.insert(path.clone(), rule);
                    }
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse rule during hot-reload, keeping previous version"
                    );
                }
            },
            EventKind::Remove(RemoveKind::File) => {
                if let Ok(mut map) = rules.write() {
                    if map.remove(path).is_some() {
                        info!(path = %path.display(), "removed rule after file deletion");
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRUTE_FORCE: &str = r#"
id: brute-force-login
name: Brute force login
description: Excessive failed login attempts from one source
severity: high
conditions:
  - eventType: login
    field: metadata.attempts
    operator: gt
    value: 5
    threshold: 1
"#;

    const DISABLED: &str = r#"
id: noisy-rule
name: Noisy rule
enabled: false
severity: low
conditions:
  - field: severity
    operator: eq
    value: low
"#;

    #[tokio::test]
    async fn loads_rules_and_filters_disabled() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("brute-force.yml"), BRUTE_FORCE).unwrap();
        fs::write(dir.path().join("noisy.yaml"), DISABLED).unwrap();

        let store = FileRuleStore::new(dir.path());
        assert_eq!(store.load_all().unwrap(), 2);

        let enabled = store.fetch_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "brute-force-login");
        assert_eq!(enabled[0].threshold(), Some(1));
    }

    #[tokio::test]
    async fn malformed_file_skipped_without_aborting_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.yml"), BRUTE_FORCE).unwrap();
        fs::write(dir.path().join("bad.yml"), "name: [unclosed").unwrap();

        let store = FileRuleStore::new(dir.path());
        assert_eq!(store.load_all().unwrap(), 1);
    }

    #[tokio::test]
    async fn skips_dotfiles_and_non_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden.yml"), BRUTE_FORCE).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a rule").unwrap();

        let store = FileRuleStore::new(dir.path());
        assert_eq!(store.load_all().unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn scans_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("auth");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("brute-force.yml"), BRUTE_FORCE).unwrap();

        let store = FileRuleStore::new(dir.path());
        assert_eq!(store.load_all().unwrap(), 1);
    }
}
