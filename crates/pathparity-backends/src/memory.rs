//! In-memory hierarchical store
//!
//! A JSON tree behind a lock, addressed by slash-separated paths. The
//! [`PathStyle`] decides how ambiguous path strings map onto tree segments,
//! so two stores with different styles behave like two client
//! implementations that disagree on path resolution.
//!
//! Writing `null` or an empty container deletes the node, and emptied
//! parents are pruned.

use async_trait::async_trait;
use parking_lot::RwLock;
use pathparity_core::Updates;
use pathparity_probe::{AdapterError, BackendAdapter, ReadOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a store turns path strings into tree segments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// Empty segments dropped; update keys always relative to the base
    #[default]
    Normalizing,
    /// One leading slash anchors at the root, every other segment is kept
    /// verbatim; leading-slash update keys override the base, other keys are
    /// joined with a naive `base + "/" + key`
    Literal,
}

impl PathStyle {
    /// Tree segments addressed by `path`
    #[must_use]
    pub fn segments(self, path: &str) -> Vec<String> {
        match self {
            Self::Normalizing => path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::Literal => {
                let anchored = path.strip_prefix('/').unwrap_or(path);
                if anchored.is_empty() {
                    Vec::new()
                } else {
                    anchored.split('/').map(str::to_string).collect()
                }
            }
        }
    }

    /// Tree segments an update key lands on under `base`
    #[must_use]
    pub fn update_target(self, base: &str, key: &str) -> Vec<String> {
        match self {
            Self::Normalizing => {
                let mut segments = self.segments(base);
                segments.extend(self.segments(key));
                segments
            }
            Self::Literal if key.starts_with('/') => self.segments(key),
            Self::Literal => self.segments(&format!("{base}/{key}")),
        }
    }

    /// Adapter name for this style
    #[inline]
    #[must_use]
    pub fn adapter_name(self) -> &'static str {
        match self {
            Self::Normalizing => "memory-normalizing",
            Self::Literal => "memory-literal",
        }
    }
}

/// JSON-tree backend
#[derive(Debug)]
pub struct MemoryBackend {
    /// Store contents, always an object at the root
    root: RwLock<Value>,
    /// Path resolution style
    style: PathStyle,
    /// Substrings that make a path invalid
    reject_containing: Vec<String>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(PathStyle::default())
    }
}

impl MemoryBackend {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new(style: PathStyle) -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            style,
            reject_containing: Vec::new(),
        }
    }

    /// Reject any path or update key containing one of `patterns`
    #[must_use]
    pub fn with_reject_containing(mut self, patterns: Vec<String>) -> Self {
        self.reject_containing = patterns;
        self
    }

    /// Path style in use
    #[inline]
    #[must_use]
    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// Copy of the whole tree
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }

    fn check(&self, path: &str) -> Result<(), AdapterError> {
        match self.reject_containing.iter().find(|p| path.contains(p.as_str())) {
            Some(pattern) => Err(AdapterError::invalid_path(format!(
                "path '{path}' contains '{pattern}'"
            ))),
            None => Ok(()),
        }
    }

    fn apply(&self, base: &str, updates: &Updates) -> Result<(), AdapterError> {
        self.check(base)?;
        for key in updates.keys() {
            self.check(key)?;
        }

        // All targets are resolved before any is written
        let targets: Vec<_> = updates
            .iter()
            .map(|(key, value)| (self.style.update_target(base, key), value.clone()))
            .collect();

        let mut root = self.root.write();
        for (segments, value) in targets {
            tracing::debug!(style = ?self.style, target = %segments.join("/"), "memory update");
            set_at(&mut root, &segments, value);
        }
        ensure_root(&mut root);
        Ok(())
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if rest.is_empty() && is_empty(&value) {
            return;
        }
        *node = Value::Object(Map::new());
    }

    if let Some(map) = node.as_object_mut() {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
        if is_empty(child) {
            map.remove(head);
        }
    }
}

fn get_at<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(node, |current, segment| current.get(segment.as_str()))
}

fn ensure_root(root: &mut Value) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
}

#[async_trait]
impl BackendAdapter for MemoryBackend {
    fn name(&self) -> &'static str {
        self.style.adapter_name()
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), AdapterError> {
        self.check(path)?;
        let segments = self.style.segments(path);
        let mut root = self.root.write();
        set_at(&mut root, &segments, value.clone());
        ensure_root(&mut root);
        Ok(())
    }

    async fn partial_update(&self, base_path: &str, updates: &Updates) -> Result<(), AdapterError> {
        self.apply(base_path, updates)
    }

    async fn batch_update(&self, base_path: &str, updates: &Updates) -> Result<(), AdapterError> {
        self.apply(base_path, updates)
    }

    async fn read(&self, path: &str) -> Result<ReadOutcome, AdapterError> {
        let segments = self.style.segments(path);
        let root = self.root.read();
        Ok(match get_at(&root, &segments) {
            Some(value) if !is_empty(value) => ReadOutcome::found(value.clone()),
            _ => ReadOutcome::missing(),
        })
    }

    async fn delete(&self, path: &str) -> Result<(), AdapterError> {
        let segments = self.style.segments(path);
        let mut root = self.root.write();
        set_at(&mut root, &segments, Value::Null);
        ensure_root(&mut root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathparity_core::{updates, AdapterErrorKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn normalizing_drops_empty_segments() {
        let style = PathStyle::Normalizing;
        assert_eq!(style.segments("//a///b/"), vec!["a", "b"]);
        assert!(style.segments("/").is_empty());
        assert_eq!(style.update_target("/base", "/x/y"), vec!["base", "x", "y"]);
    }

    #[test]
    fn literal_keeps_segments_verbatim() {
        let style = PathStyle::Literal;
        assert_eq!(style.segments("/a//b/"), vec!["a", "", "b", ""]);
        assert!(style.segments("").is_empty());
        assert_eq!(style.update_target("/base", "/x"), vec!["x"]);
        assert_eq!(style.update_target("/", "users/u1"), vec!["", "users", "u1"]);
        assert_eq!(style.update_target("", "users/u1"), vec!["users", "u1"]);
    }

    #[tokio::test]
    async fn write_then_read() {
        let store = MemoryBackend::new(PathStyle::Normalizing);
        store.write("/a/b", &json!({"v": 1})).await.unwrap();

        assert_eq!(store.read("a/b").await.unwrap(), ReadOutcome::found(json!({"v": 1})));
        assert_eq!(store.read("/a/b/v").await.unwrap(), ReadOutcome::found(json!(1)));
        assert!(!store.read("/a/c").await.unwrap().found);
    }

    #[tokio::test]
    async fn null_write_deletes_and_prunes() {
        let store = MemoryBackend::default();
        store.write("/a/b/c", &json!(1)).await.unwrap();
        store.write("/a/b/c", &Value::Null).await.unwrap();

        assert_eq!(store.snapshot(), json!({}));
        assert!(!store.read("/a").await.unwrap().found);
    }

    #[tokio::test]
    async fn partial_update_merges_children() {
        let store = MemoryBackend::default();
        store.write("/p", &json!({"keep": true, "old": 1})).await.unwrap();
        store
            .partial_update("/p", &updates([("old", json!(2)), ("new/deep", json!("x"))]))
            .await
            .unwrap();

        assert_eq!(
            store.read("/p").await.unwrap().value,
            json!({"keep": true, "old": 2, "new": {"deep": "x"}})
        );
    }

    #[tokio::test]
    async fn styles_diverge_on_absolute_update_keys() {
        let literal = MemoryBackend::new(PathStyle::Literal);
        let normalizing = MemoryBackend::new(PathStyle::Normalizing);
        let batch = updates([("/abs", json!(1))]);
        literal.batch_update("/base", &batch).await.unwrap();
        normalizing.batch_update("/base", &batch).await.unwrap();

        assert!(literal.read("/abs").await.unwrap().found);
        assert!(!literal.read("/base/abs").await.unwrap().found);
        assert!(normalizing.read("/base/abs").await.unwrap().found);
        assert!(!normalizing.read("/abs").await.unwrap().found);
    }

    #[tokio::test]
    async fn rejected_patterns_fail_before_writing() {
        let store =
            MemoryBackend::default().with_reject_containing(vec!["//".to_string()]);
        let err = store
            .batch_update("/ok", &updates([("fine", json!(1)), ("bad//key", json!(2))]))
            .await
            .unwrap_err();

        assert_eq!(err.kind, AdapterErrorKind::InvalidPath);
        assert_eq!(store.snapshot(), json!({}));
    }

    #[tokio::test]
    async fn root_write_replaces_tree() {
        let store = MemoryBackend::new(PathStyle::Literal);
        store.write("/old", &json!(1)).await.unwrap();
        store.write("/", &json!({"fresh": true})).await.unwrap();
        assert_eq!(store.snapshot(), json!({"fresh": true}));

        store.delete("/").await.unwrap();
        assert_eq!(store.snapshot(), json!({}));
    }
}
