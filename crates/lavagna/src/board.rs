//! Lesson kanban board
//!
//! Holds a deduplicated collection of lessons partitioned by status and
//! applies the transitions produced by dragging cards between columns.
//! Any status can move to any other one; lessons get rescheduled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::types::{Lesson, LessonStatus};

/// Reasons a new lesson is refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("lesson title must not be empty")]
    EmptyTitle,

    #[error("lesson date is required")]
    MissingDate,

    #[error("lesson date `{0}` is not a valid YYYY-MM-DD date")]
    InvalidDate(String),

    #[error("no lesson id left above {0}")]
    IdsExhausted(u64),
}

/// Input for [`LessonBoard::create`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLesson {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub status: LessonStatus,
}

/// Which class the board is showing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassFilter {
    #[default]
    All,
    Class(String),
}

impl ClassFilter {
    /// `None`, empty and `all` select every class
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => ClassFilter::All,
            Some(v) if v.eq_ignore_ascii_case("all") => ClassFilter::All,
            Some(v) => ClassFilter::Class(v.to_string()),
        }
    }
}

/// Result of applying a drop onto a column
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Moved {
        from: LessonStatus,
        to: LessonStatus,
    },
    Unchanged,
    NotFound,
}

/// Decide what a card dropped onto `target` turns into.
///
/// Returns `None` when the drop does not change anything.
pub fn decide_transition(lesson: &Lesson, target: LessonStatus) -> Option<LessonStatus> {
    (lesson.status != target).then_some(target)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonBoard {
    lessons: Vec<Lesson>,
}

impl LessonBoard {
    /// Build the board from a flat lesson list plus the per-class lists.
    ///
    /// The flat list is walked first, then each class in order. The first
    /// lesson seen with a given id wins; later duplicates are dropped.
    pub fn initialize(flat: &[Lesson], by_class: &[Vec<Lesson>]) -> Self {
        let mut seen: HashSet<u64> = HashSet::new();
        let mut lessons = Vec::new();

        let candidates = flat.iter().chain(by_class.iter().flatten());
        let mut dropped = 0usize;
        for lesson in candidates {
            if seen.insert(lesson.id) {
                lessons.push(lesson.clone());
            } else {
                dropped += 1;
            }
        }

        debug!(kept = lessons.len(), dropped, "Board initialized");
        Self { lessons }
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Lessons in the given column, in board order
    pub fn view_by_status(&self, status: LessonStatus) -> Vec<Lesson> {
        let mut seen = HashSet::new();
        self.lessons
            .iter()
            .filter(|l| l.status == status)
            .filter(|l| seen.insert(l.id))
            .cloned()
            .collect()
    }

    /// Lessons in the given column for a class.
    ///
    /// Lessons carry no class association yet, so every filter yields the
    /// same cards as [`LessonBoard::view_by_status`].
    pub fn view_by_class(&self, filter: &ClassFilter, status: LessonStatus) -> Vec<Lesson> {
        if let ClassFilter::Class(class_id) = filter {
            debug!(class_id = %class_id, "Class filter has no effect on lessons");
        }
        self.view_by_status(status)
    }

    /// Number of lessons per column, in column order
    pub fn counts(&self) -> Vec<(LessonStatus, usize)> {
        LessonStatus::ALL
            .iter()
            .map(|s| (*s, self.lessons.iter().filter(|l| l.status == *s).count()))
            .collect()
    }

    fn next_id(&self) -> Result<u64, ValidationError> {
        match self.lessons.iter().map(|l| l.id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(ValidationError::IdsExhausted(max)),
        }
    }

    /// Validate and append a new lesson, returning it with its assigned id
    pub fn create(&mut self, new: NewLesson) -> Result<Lesson, ValidationError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let date = new
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(ValidationError::MissingDate)?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;

        let lesson = Lesson {
            id: self.next_id()?,
            title: title.to_string(),
            date: date.to_string(),
            time: new.time.filter(|t| !t.trim().is_empty()),
            duration: new.duration,
            status: new.status,
        };

        debug!(id = lesson.id, title = %lesson.title, "Lesson created");
        self.lessons.push(lesson.clone());
        Ok(lesson)
    }

    /// Move a lesson to another column.
    ///
    /// Unknown ids and drops onto the current column leave the board untouched.
    pub fn transition(&mut self, id: u64, target: LessonStatus) -> TransitionOutcome {
        let Some(lesson) = self.lessons.iter_mut().find(|l| l.id == id) else {
            debug!(id, "Transition for unknown lesson ignored");
            return TransitionOutcome::NotFound;
        };

        match decide_transition(lesson, target) {
            Some(next) => {
                let from = lesson.status;
                lesson.status = next;
                debug!(id, %from, to = %next, "Lesson moved");
                TransitionOutcome::Moved { from, to: next }
            }
            None => TransitionOutcome::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a Lesson
    fn make_lesson(id: u64, title: &str, status: LessonStatus) -> Lesson {
        Lesson {
            id,
            title: title.to_string(),
            date: "2025-03-10".to_string(),
            time: None,
            duration: "45 min".to_string(),
            status,
        }
    }

    fn new_lesson(title: &str, date: Option<&str>) -> NewLesson {
        NewLesson {
            title: title.to_string(),
            date: date.map(str::to_string),
            time: Some("10:00".to_string()),
            duration: "1 hour".to_string(),
            status: LessonStatus::Scheduled,
        }
    }

    fn sample_board() -> LessonBoard {
        let flat = vec![
            make_lesson(1, "Fractions", LessonStatus::Scheduled),
            make_lesson(2, "Decimals", LessonStatus::InProgress),
        ];
        let by_class = vec![
            vec![
                make_lesson(2, "Decimals (class copy)", LessonStatus::Completed),
                make_lesson(3, "Percentages", LessonStatus::Completed),
            ],
            vec![
                make_lesson(1, "Fractions (class copy)", LessonStatus::Completed),
                make_lesson(4, "Ratios", LessonStatus::Scheduled),
            ],
        ];
        LessonBoard::initialize(&flat, &by_class)
    }

    fn ids(lessons: &[Lesson]) -> Vec<u64> {
        lessons.iter().map(|l| l.id).collect()
    }

    // ========== initialize tests ==========

    #[test]
    fn test_initialize_empty() {
        let board = LessonBoard::initialize(&[], &[]);
        assert!(board.is_empty());
    }

    #[test]
    fn test_initialize_deduplicates_across_sources() {
        let board = sample_board();
        assert_eq!(board.len(), 4);
        assert_eq!(ids(board.lessons()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_initialize_first_seen_wins() {
        let board = sample_board();
        assert_eq!(board.get(1).unwrap().title, "Fractions");
        assert_eq!(board.get(2).unwrap().status, LessonStatus::InProgress);
    }

    #[test]
    fn test_initialize_dedups_within_single_list() {
        let flat = vec![
            make_lesson(5, "A", LessonStatus::Scheduled),
            make_lesson(5, "B", LessonStatus::Completed),
        ];
        let board = LessonBoard::initialize(&flat, &[]);
        assert_eq!(board.len(), 1);
        assert_eq!(board.lessons()[0].title, "A");
    }

    #[test]
    fn test_initialize_class_lists_only() {
        let by_class = vec![
            vec![make_lesson(9, "Rivers", LessonStatus::Scheduled)],
            vec![make_lesson(8, "Mountains", LessonStatus::Scheduled)],
        ];
        let board = LessonBoard::initialize(&[], &by_class);
        assert_eq!(ids(board.lessons()), vec![9, 8]);
    }

    #[test]
    fn test_initialize_size_matches_distinct_ids() {
        let flat: Vec<Lesson> = (1..=6)
            .map(|i| make_lesson(i % 4, "x", LessonStatus::Scheduled))
            .collect();
        let by_class = vec![(2..=7)
            .map(|i| make_lesson(i, "y", LessonStatus::Completed))
            .collect::<Vec<_>>()];
        let board = LessonBoard::initialize(&flat, &by_class);

        let distinct: HashSet<u64> = flat.iter().chain(by_class[0].iter()).map(|l| l.id).collect();
        assert_eq!(board.len(), distinct.len());
        let board_ids: HashSet<u64> = ids(board.lessons()).into_iter().collect();
        assert_eq!(board_ids, distinct);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let flat = vec![make_lesson(1, "A", LessonStatus::Scheduled)];
        let by_class = vec![vec![
            make_lesson(2, "B", LessonStatus::Completed),
            make_lesson(1, "C", LessonStatus::Completed),
        ]];
        let first = LessonBoard::initialize(&flat, &by_class);
        let second = LessonBoard::initialize(&flat, &by_class);
        assert_eq!(first, second);
    }

    // ========== view tests ==========

    #[test]
    fn test_view_by_status_filters_and_keeps_order() {
        let board = sample_board();
        assert_eq!(ids(&board.view_by_status(LessonStatus::Scheduled)), vec![1, 4]);
        assert_eq!(ids(&board.view_by_status(LessonStatus::InProgress)), vec![2]);
        assert_eq!(ids(&board.view_by_status(LessonStatus::Completed)), vec![3]);
    }

    #[test]
    fn test_views_partition_the_board() {
        let board = sample_board();
        let mut all: Vec<u64> = LessonStatus::ALL
            .iter()
            .flat_map(|s| {
                let view = board.view_by_status(*s);
                assert!(view.iter().all(|l| l.status == *s));
                ids(&view)
            })
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_view_by_class_matches_status_view() {
        let board = sample_board();
        let filter = ClassFilter::Class("class-7a".to_string());
        for status in LessonStatus::ALL {
            assert_eq!(
                board.view_by_class(&filter, status),
                board.view_by_status(status)
            );
            assert_eq!(
                board.view_by_class(&ClassFilter::All, status),
                board.view_by_status(status)
            );
        }
    }

    #[test]
    fn test_class_filter_from_query() {
        assert_eq!(ClassFilter::from_query(None), ClassFilter::All);
        assert_eq!(ClassFilter::from_query(Some("")), ClassFilter::All);
        assert_eq!(ClassFilter::from_query(Some("ALL")), ClassFilter::All);
        assert_eq!(
            ClassFilter::from_query(Some("class-7a")),
            ClassFilter::Class("class-7a".to_string())
        );
    }

    #[test]
    fn test_counts() {
        let board = sample_board();
        assert_eq!(
            board.counts(),
            vec![
                (LessonStatus::Scheduled, 2),
                (LessonStatus::InProgress, 1),
                (LessonStatus::Completed, 1),
            ]
        );
    }

    // ========== create tests ==========

    #[test]
    fn test_create_rejects_empty_title() {
        let mut board = sample_board();
        let before = board.clone();
        let result = board.create(new_lesson("   ", Some("2025-03-12")));
        assert_eq!(result, Err(ValidationError::EmptyTitle));
        assert_eq!(board, before);
    }

    #[test]
    fn test_create_rejects_missing_date() {
        let mut board = sample_board();
        assert_eq!(
            board.create(new_lesson("Algebra", None)),
            Err(ValidationError::MissingDate)
        );
        assert_eq!(
            board.create(new_lesson("Algebra", Some(" "))),
            Err(ValidationError::MissingDate)
        );
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn test_create_rejects_invalid_date() {
        let mut board = sample_board();
        assert_eq!(
            board.create(new_lesson("Algebra", Some("12/03/2025"))),
            Err(ValidationError::InvalidDate("12/03/2025".to_string()))
        );
    }

    #[test]
    fn test_create_assigns_id_above_max() {
        let flat = vec![
            make_lesson(10, "A", LessonStatus::Scheduled),
            make_lesson(3, "B", LessonStatus::Scheduled),
        ];
        let mut board = LessonBoard::initialize(&flat, &[]);

        let lesson = board.create(new_lesson("  Algebra  ", Some("2025-03-12"))).unwrap();
        assert_eq!(lesson.id, 11);
        assert_eq!(lesson.title, "Algebra");
        assert_eq!(board.len(), 3);
        assert_eq!(board.lessons().last(), Some(&lesson));
    }

    #[test]
    fn test_create_refuses_when_ids_are_exhausted() {
        let flat = vec![make_lesson(u64::MAX, "Last", LessonStatus::Scheduled)];
        let mut board = LessonBoard::initialize(&flat, &[]);

        let result = board.create(new_lesson("One more", Some("2025-03-12")));
        assert_eq!(result, Err(ValidationError::IdsExhausted(u64::MAX)));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_create_on_empty_board_starts_at_one() {
        let mut board = LessonBoard::default();
        let lesson = board.create(new_lesson("First", Some("2025-03-12"))).unwrap();
        assert_eq!(lesson.id, 1);
    }

    #[test]
    fn test_create_keeps_requested_status() {
        let mut board = LessonBoard::default();
        let mut input = new_lesson("Lab", Some("2025-03-12"));
        input.status = LessonStatus::InProgress;
        let lesson = board.create(input).unwrap();
        assert_eq!(board.view_by_status(LessonStatus::InProgress), vec![lesson]);
    }

    // ========== transition tests ==========

    #[test]
    fn test_transition_moves_lesson() {
        let mut board = LessonBoard::initialize(&[make_lesson(1, "A", LessonStatus::Scheduled)], &[]);

        let outcome = board.transition(1, LessonStatus::Completed);

        assert_eq!(
            outcome,
            TransitionOutcome::Moved {
                from: LessonStatus::Scheduled,
                to: LessonStatus::Completed
            }
        );
        assert_eq!(ids(&board.view_by_status(LessonStatus::Completed)), vec![1]);
        assert!(board.view_by_status(LessonStatus::Scheduled).is_empty());
    }

    #[test]
    fn test_transition_unknown_id_is_noop() {
        let mut board = sample_board();
        let before = board.clone();
        assert_eq!(
            board.transition(99, LessonStatus::Completed),
            TransitionOutcome::NotFound
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_transition_same_status_is_noop() {
        let mut board = sample_board();
        let before = board.clone();
        assert_eq!(
            board.transition(1, LessonStatus::Scheduled),
            TransitionOutcome::Unchanged
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_transition_allows_moving_backwards() {
        let mut board = sample_board();
        board.transition(3, LessonStatus::Scheduled);
        assert_eq!(board.get(3).unwrap().status, LessonStatus::Scheduled);
        board.transition(3, LessonStatus::InProgress);
        assert_eq!(board.get(3).unwrap().status, LessonStatus::InProgress);
    }

    #[test]
    fn test_transition_keeps_position() {
        let mut board = sample_board();
        board.transition(1, LessonStatus::Completed);
        assert_eq!(ids(board.lessons()), vec![1, 2, 3, 4]);
        assert_eq!(ids(&board.view_by_status(LessonStatus::Completed)), vec![1, 3]);
    }

    #[test]
    fn test_decide_transition() {
        let lesson = make_lesson(1, "A", LessonStatus::InProgress);
        assert_eq!(decide_transition(&lesson, LessonStatus::InProgress), None);
        assert_eq!(
            decide_transition(&lesson, LessonStatus::Completed),
            Some(LessonStatus::Completed)
        );
    }

    #[test]
    fn test_transition_outcome_serialization() {
        let json = serde_json::to_string(&TransitionOutcome::Moved {
            from: LessonStatus::Scheduled,
            to: LessonStatus::InProgress,
        })
        .unwrap();
        assert_eq!(json, r#"{"outcome":"moved","from":"scheduled","to":"in-progress"}"#);
        assert_eq!(
            serde_json::to_string(&TransitionOutcome::NotFound).unwrap(),
            r#"{"outcome":"not_found"}"#
        );
    }
}
