use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::board::LessonBoard;
use crate::types::{
    ClassGroup, Document, Lesson, LessonPlan, Notebook, RawLesson, Resource, Source, Student,
};

/// Mock data shipped with the binary, used when no fixtures file is given
const DEFAULT_FIXTURES: &str = include_str!("../fixtures/dashboard.json");

/// All mock data served by the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    #[serde(default)]
    pub lessons: Vec<Value>,
    #[serde(default)]
    pub classes: Vec<ClassGroup>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub lesson_plans: Vec<LessonPlan>,
    #[serde(default)]
    pub notebooks: Vec<Notebook>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Fixtures {
    /// The embedded default data set
    pub fn builtin() -> Result<Self> {
        parse_fixtures(DEFAULT_FIXTURES).context("Failed to parse built-in fixtures")
    }

    /// Load fixtures from `path`, or the embedded set when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::builtin();
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file {}", path.display()))?;
        let fixtures = parse_fixtures(&content)
            .with_context(|| format!("Failed to parse fixtures file {}", path.display()))?;

        info!(
            path = %path.display(),
            classes = fixtures.classes.len(),
            notebooks = fixtures.notebooks.len(),
            "Fixtures loaded"
        );
        Ok(fixtures)
    }

    /// Build the lesson board from the flat list and every class's lessons
    pub fn lesson_board(&self) -> LessonBoard {
        let flat = ingest_lessons(&self.lessons);
        let by_class: Vec<Vec<Lesson>> = self
            .classes
            .iter()
            .map(|class| ingest_lessons(&class.lessons))
            .collect();
        LessonBoard::initialize(&flat, &by_class)
    }

    /// Initial source list of each notebook, keyed by notebook id
    pub fn notebook_sources(&self) -> HashMap<String, Vec<Source>> {
        self.notebooks
            .iter()
            .map(|nb| (nb.id.clone(), nb.sources.clone()))
            .collect()
    }
}

fn parse_fixtures(content: &str) -> Result<Fixtures> {
    let fixtures: Fixtures = serde_json::from_str(content)?;
    debug!(
        lessons = fixtures.lessons.len(),
        classes = fixtures.classes.len(),
        resources = fixtures.resources.len(),
        "Parsed fixtures"
    );
    Ok(fixtures)
}

/// Convert raw lesson records, skipping the ones that fail validation
pub fn ingest_lessons(raw: &[Value]) -> Vec<Lesson> {
    raw.iter()
        .map(|record| RawLesson::from_value(record).and_then(|r| Lesson::try_from(&r)))
        .filter_map(|result| match result {
            Ok(lesson) => Some(lesson),
            Err(e) => {
                warn!(error = %e, "Skipping invalid lesson record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LessonStatus;
    use serde_json::json;
    use tempfile::TempDir;

    fn raw(id: u64, title: &str) -> Value {
        json!({"id": id, "title": title, "date": "2025-03-10"})
    }

    #[test]
    fn test_builtin_fixtures_parse() {
        let fixtures = Fixtures::builtin().unwrap();
        assert_eq!(fixtures.lessons.len(), 3);
        assert_eq!(fixtures.classes.len(), 2);
        assert_eq!(fixtures.documents.len(), 3);
        assert!(!fixtures.resources.is_empty());
        assert_eq!(fixtures.lesson_plans.len(), 2);
    }

    #[test]
    fn test_builtin_board_collapses_overlapping_lessons() {
        let board = Fixtures::builtin().unwrap().lesson_board();

        // 3 flat + 2 (7A, id 3 repeated) + 3 (8B, id 1 repeated)
        assert_eq!(board.len(), 6);
        let ids: Vec<u64> = board.lessons().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(board.get(5).unwrap().status, LessonStatus::InProgress);
    }

    #[test]
    fn test_notebook_sources() {
        let sources = Fixtures::builtin().unwrap().notebook_sources();
        assert_eq!(sources["notebook-1"].len(), 3);
        assert_eq!(sources["notebook-2"].len(), 1);
    }

    #[test]
    fn test_load_without_path_uses_builtin() {
        let fixtures = Fixtures::load(None).unwrap();
        assert_eq!(fixtures.notebooks.len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"{"lessons":[{"id":1,"title":"Only lesson","date":"2025-01-01"}]}"#,
        )
        .unwrap();

        let fixtures = Fixtures::load(Some(&path)).unwrap();
        assert_eq!(fixtures.lessons.len(), 1);
        assert!(fixtures.classes.is_empty());
        assert_eq!(fixtures.lesson_board().len(), 1);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Fixtures::load(Some(Path::new("/nonexistent/fixtures.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixtures.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = Fixtures::load(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_ingest_skips_invalid_records() {
        let untitled = json!({"id": 2, "date": "2025-03-10"});
        let records = vec![raw(1, "Good"), untitled, raw(3, "Also good")];

        let lessons = ingest_lessons(&records);
        let ids: Vec<u64> = lessons.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_ingest_skips_badly_typed_records() {
        let records = vec![
            raw(1, "Good"),
            json!({"id": -2, "title": "Negative id"}),
            json!({"id": true, "title": "Boolean id"}),
            json!({"id": 3, "title": 42}),
            raw(4, "Also good"),
        ];

        let ids: Vec<u64> = ingest_lessons(&records).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_load_keeps_good_records_next_to_badly_typed_ones() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"{
                "lessons": [{"id": 1, "title": "Kept", "date": "2025-01-01"}, {"id": -2, "title": "Dropped"}],
                "classes": [{"id": "c", "name": "C", "lessons": [{"id": 3, "title": 42}, {"id": "5", "title": "Also kept"}]}]
            }"#,
        )
        .unwrap();

        let board = Fixtures::load(Some(&path)).unwrap().lesson_board();
        let ids: Vec<u64> = board.lessons().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }
}
