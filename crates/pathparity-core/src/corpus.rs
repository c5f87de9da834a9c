//! Scenario corpus
//!
//! The fixed catalog of path/operation/payload triples. Every entry is pure
//! data; names are unique and payloads carry no run-dependent values so that
//! both backends receive byte-identical input.

use crate::error::CorpusIntegrityError;
use crate::path::{top_level_segment, PathPattern};
use crate::scenario::{updates, Operation, Scenario, ScenarioKind};
use serde_json::json;
use std::collections::{BTreeSet, HashSet};

/// Validated, ordered set of scenarios with unique names
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    scenarios: Vec<Scenario>,
}

impl Corpus {
    /// Build a corpus, rejecting duplicate names
    ///
    /// # Errors
    /// - `CorpusIntegrityError::DuplicateScenario` if two scenarios share a name
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, CorpusIntegrityError> {
        let mut seen = HashSet::with_capacity(scenarios.len());
        for scenario in &scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(CorpusIntegrityError::DuplicateScenario(
                    scenario.name.clone(),
                ));
            }
        }
        Ok(Self { scenarios })
    }

    /// The version-controlled standard corpus
    ///
    /// # Errors
    /// Only if the built-in catalog itself contains a duplicate name.
    pub fn standard() -> Result<Self, CorpusIntegrityError> {
        Self::new(standard_scenarios())
    }

    /// Scenarios in declaration order
    #[inline]
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Look up a scenario by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Whether a scenario with this name exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of scenarios
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the corpus is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Keep only scenarios whose operation is listed
    #[must_use]
    pub fn retain_operations(mut self, operations: &[Operation]) -> Self {
        self.scenarios
            .retain(|s| operations.contains(&s.operation()));
        self
    }

    /// Distinct top-level segments any candidate location may touch
    ///
    /// Used by cleanup tooling; root-addressing candidates contribute nothing.
    #[must_use]
    pub fn touched_roots(&self) -> BTreeSet<String> {
        let mut roots = BTreeSet::new();
        for scenario in &self.scenarios {
            match top_level_segment(&scenario.base_path) {
                Some(root) => {
                    roots.insert(root.to_string());
                }
                // A root write lands its object keys at the top level
                None => {
                    if let ScenarioKind::Write {
                        value: serde_json::Value::Object(map),
                    } = &scenario.kind
                    {
                        roots.extend(map.keys().cloned());
                    }
                }
            }
            for probe in scenario.probe_targets() {
                for candidate in &probe.candidates {
                    if let Some(root) = top_level_segment(candidate) {
                        roots.insert(root.to_string());
                    }
                }
            }
        }
        roots
    }

    /// Base-path patterns covered per operation
    #[must_use]
    pub fn coverage(&self) -> BTreeSet<(Operation, PathPattern)> {
        self.scenarios
            .iter()
            .map(|s| (s.operation(), s.pattern()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Scenario;
    type IntoIter = std::slice::Iter<'a, Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.iter()
    }
}

/// Where `setup` writes the fixture tree
pub const FIXTURE_PATH: &str = "pathparity/verification";

/// Fixture tree written by `setup`: one project with one page view
#[must_use]
pub fn fixture_tree() -> serde_json::Value {
    json!({
        "projects": {
            "test-project-001": {
                "name": "Test Project",
                "pageViews": {
                    "test-page-uuid-001": {
                        "style": { "color": "initial", "fontSize": 14 },
                        "metadata": { "version": 1 }
                    }
                }
            }
        }
    })
}

fn simple(label: &str) -> serde_json::Value {
    json!({ "value": format!("test-{label}"), "type": "simple" })
}

/// Raw standard scenario list
#[must_use]
pub fn standard_scenarios() -> Vec<Scenario> {
    let mut scenarios = single_write_scenarios();
    scenarios.extend(partial_update_scenarios());
    scenarios.extend(batch_update_scenarios());
    scenarios
}

fn single_write_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::write(
            "Absolute path with leading slash",
            "/pathparity/single-path/with-slash",
            simple("with-slash"),
        ),
        Scenario::write(
            "Relative path without leading slash",
            "pathparity/single-path/without-slash",
            simple("without-slash"),
        ),
        Scenario::write(
            "Nested absolute path",
            "/projects/project1/pages/page1/style",
            json!({ "color": "red", "fontSize": 16 }),
        ),
        Scenario::write(
            "Nested relative path",
            "projects/project2/pages/page1/style",
            json!({ "color": "blue", "fontSize": 14 }),
        ),
        Scenario::write(
            "Path with trailing slash",
            "/pathparity/trailing-slash/",
            simple("trailing-slash"),
        ),
        Scenario::write(
            "Path with double slashes",
            "//pathparity//double//slashes",
            simple("double-slash"),
        ),
        Scenario::write(
            "Root path write",
            "/",
            json!({ "rootWrite": true, "marker": "root" }),
        ),
        Scenario::write(
            "Empty path write",
            "",
            json!({ "emptyPath": true, "marker": "empty" }),
        ),
    ]
}

fn patch_seed() -> serde_json::Value {
    json!({
        "existing": "data",
        "nested": { "value1": "initial", "value2": "initial" }
    })
}

fn partial_update_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::partial_update(
            "Partial update with absolute sub-paths",
            "pathparity/patch/absolute",
            updates([
                ("/nested/value1", json!("updated-absolute")),
                ("/newField", json!("added-via-absolute")),
            ]),
        )
        .with_seed(patch_seed()),
        Scenario::partial_update(
            "Partial update with relative sub-paths",
            "pathparity/patch/relative",
            updates([
                ("nested/value2", json!("updated-relative")),
                ("anotherField", json!("added-via-relative")),
            ]),
        )
        .with_seed(patch_seed()),
        Scenario::partial_update(
            "Partial update with mixed sub-paths",
            "pathparity/patch/mixed",
            updates([
                ("/absolute/path", json!("absolute-value")),
                ("relative/path", json!("relative-value")),
                ("/mixed", json!({ "absolute": true })),
                ("mixed2", json!({ "relative": true })),
            ]),
        )
        .with_seed(patch_seed()),
        Scenario::partial_update(
            "Partial update under absolute base",
            "/pathparity/patch/absolute-base",
            updates([
                ("/field", json!("absolute-key")),
                ("other", json!("relative-key")),
            ]),
        )
        .with_seed(patch_seed()),
        Scenario::partial_update(
            "Partial update at root",
            "/",
            updates([
                ("/pathparity-patch-root/a", json!("root-absolute")),
                ("pathparity-patch-root/b", json!("root-relative")),
            ]),
        ),
        Scenario::partial_update(
            "Partial update at empty base",
            "",
            updates([
                ("/pathparity-patch-empty/a", json!("empty-absolute")),
                ("pathparity-patch-empty/b", json!("empty-relative")),
            ]),
        ),
        Scenario::partial_update(
            "Partial update under double-slash base",
            "pathparity//patch//double",
            updates([
                ("/field", json!("double-absolute")),
                ("other", json!("double-relative")),
            ]),
        ),
    ]
}

fn batch_update_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::batch_update(
            "All paths with leading slash",
            "pathparity/multi-path/all-slash",
            updates([
                ("/path1/value", json!("value1")),
                ("/path2/value", json!("value2")),
                ("/path3/nested/value", json!("value3")),
            ]),
        ),
        Scenario::batch_update(
            "All paths without leading slash",
            "pathparity/multi-path/no-slash",
            updates([
                ("path1/value", json!("value1")),
                ("path2/value", json!("value2")),
                ("path3/nested/value", json!("value3")),
            ]),
        ),
        Scenario::batch_update(
            "Mixed slash patterns",
            "pathparity/multi-path/mixed",
            updates([
                ("/absolute/path1", json!("absolute1")),
                ("relative/path1", json!("relative1")),
                ("/absolute/nested/path2", json!("absolute2")),
                ("relative/nested/path2", json!("relative2")),
            ]),
        ),
        Scenario::batch_update(
            "Complex nested structure with leading slash",
            "/projects/projectId/pageViews",
            updates([
                ("/pageUuid1/style", json!({ "color": "red", "fontSize": 16 })),
                ("/pageUuid1/children", json!([])),
                ("/pageUuid2/style", json!({ "color": "blue", "fontSize": 14 })),
                ("/pageUuid2/children", json!([{ "id": 1 }])),
            ]),
        ),
        Scenario::batch_update(
            "Complex nested structure without leading slash",
            "projects/projectId/pageViews",
            updates([
                ("pageUuid3/style", json!({ "color": "green", "fontSize": 18 })),
                ("pageUuid3/children", json!([])),
                ("pageUuid4/style", json!({ "color": "yellow", "fontSize": 12 })),
                ("pageUuid4/children", json!([{ "id": 2 }])),
            ]),
        ),
        Scenario::batch_update(
            "Root-relative paths",
            "/",
            updates([
                ("/users/user1/name", json!("User One")),
                ("users/user2/name", json!("User Two")),
                ("/posts/post1/title", json!("Post One")),
                ("posts/post2/title", json!("Post Two")),
            ]),
        ),
        Scenario::batch_update(
            "Empty base path",
            "",
            updates([
                ("/test/path1", json!("value1")),
                ("test/path2", json!("value2")),
            ]),
        ),
        Scenario::batch_update(
            "Edge case - double slashes",
            "pathparity/multi-path//edge",
            updates([
                ("//double//slash", json!("value1")),
                ("normal/path", json!("value2")),
            ]),
        ),
        Scenario::batch_update(
            "Complex nested multi-path update",
            "projects/pathparity-project/pageViews",
            updates([
                ("/page1/style/color", json!("red")),
                ("/page1/style/fontSize", json!(16)),
                ("page2/style/color", json!("blue")),
                ("page2/style/fontSize", json!(14)),
                ("/page1/children/0", json!({ "type": "text", "content": "Hello" })),
                ("page2/children/0", json!({ "type": "image", "src": "test.jpg" })),
                ("/page1/metadata/version", json!(2)),
                ("page2/metadata/version", json!(2)),
            ]),
        )
        .with_seed(json!({ "initial": "structure", "metadata": { "created": "fixture" } })),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_corpus_has_unique_names() {
        let corpus = Corpus::standard().unwrap();
        assert_eq!(corpus.len(), standard_scenarios().len());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dup = vec![
            Scenario::write("same", "/a", json!(1)),
            Scenario::write("same", "/b", json!(2)),
        ];
        assert_eq!(
            Corpus::new(dup).unwrap_err(),
            CorpusIntegrityError::DuplicateScenario("same".to_string())
        );
    }

    #[test]
    fn single_writes_cover_every_pattern() {
        let corpus = Corpus::standard().unwrap();
        let coverage = corpus.coverage();
        for pattern in PathPattern::ALL {
            assert!(
                coverage.contains(&(Operation::Write, pattern)),
                "write missing {pattern}"
            );
            assert!(
                coverage.contains(&(Operation::BatchUpdate, pattern)),
                "batch missing {pattern}"
            );
            assert!(
                coverage.contains(&(Operation::PartialUpdate, pattern)),
                "partial update missing {pattern}"
            );
        }
    }

    #[test]
    fn trailing_slash_write_is_present() {
        let corpus = Corpus::standard().unwrap();
        assert!(corpus
            .scenarios()
            .iter()
            .any(|s| s.operation() == Operation::Write && s.base_path.ends_with('/') && s.base_path.len() > 1));
    }

    #[test]
    fn batch_key_shapes_are_covered() {
        let corpus = Corpus::standard().unwrap();
        let batch: Vec<_> = corpus
            .scenarios()
            .iter()
            .filter(|s| s.operation() == Operation::BatchUpdate)
            .collect();

        let all_absolute = batch
            .iter()
            .any(|s| s.updates().unwrap().keys().all(|k| k.starts_with('/')));
        let all_relative = batch
            .iter()
            .any(|s| s.updates().unwrap().keys().all(|k| !k.starts_with('/')));
        let mixed = batch.iter().any(|s| {
            let keys = s.updates().unwrap();
            keys.keys().any(|k| k.starts_with('/')) && keys.keys().any(|k| !k.starts_with('/'))
        });
        assert!(all_absolute && all_relative && mixed);
    }

    #[test]
    fn fixture_lives_under_a_touched_root() {
        let corpus = Corpus::standard().unwrap();
        let root = top_level_segment(FIXTURE_PATH).unwrap();
        assert!(corpus.touched_roots().contains(root));
        assert_eq!(
            fixture_tree()["projects"]["test-project-001"]["pageViews"]["test-page-uuid-001"]
                ["metadata"]["version"],
            json!(1)
        );
    }

    #[test]
    fn retain_operations_filters() {
        let corpus = Corpus::standard()
            .unwrap()
            .retain_operations(&[Operation::Write]);
        assert_eq!(corpus.len(), 8);
        assert!(corpus.contains("Root path write"));
        assert!(!corpus.contains("Root-relative paths"));
    }

    #[test]
    fn touched_roots_ignore_root_candidates() {
        let corpus = Corpus::standard().unwrap();
        let roots = corpus.touched_roots();
        assert!(roots.contains("pathparity"));
        assert!(roots.contains("projects"));
        assert!(roots.contains("users"));
        assert!(roots.contains("rootWrite"));
        assert!(!roots.contains(""));
    }
}
