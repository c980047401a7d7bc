use anyhow::Result;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::board::LessonBoard;
use crate::types::{Lesson, LessonStatus};

/// Write the board page to `path` as a static HTML file
pub fn generate_html(board: &LessonBoard, path: &Path) -> Result<()> {
    let html = render_page(board);
    fs::write(path, html.into_string())?;
    Ok(())
}

pub fn render_page(board: &LessonBoard) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Lavagna" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    h1 { "Lesson Board" }
                    div.stats {
                        span #"total-count" { (board.len()) }
                        " lessons"
                    }
                    (render_create_form())
                    div.board #"board" {
                        @for (status, count) in board.counts() {
                            (render_column(status, count, &board.view_by_status(status)))
                        }
                    }
                }
                script { (PreEscaped(JAVASCRIPT)) }
            }
        }
    }
}

fn render_column(status: LessonStatus, count: usize, lessons: &[Lesson]) -> Markup {
    html! {
        section.column data-status=(status.as_str()) {
            div.column-header {
                (status.label())
                span.column-count { (count) }
            }
            @if lessons.is_empty() {
                div.empty-state { "No lessons" }
            }
            @for lesson in lessons {
                (render_card(lesson))
            }
        }
    }
}

fn render_card(lesson: &Lesson) -> Markup {
    html! {
        div.lesson-card draggable="true" data-lesson-id=(lesson.id) {
            div.lesson-title { (lesson.title) }
            div.lesson-meta {
                (lesson.date)
                @if let Some(time) = &lesson.time {
                    " · " (time)
                }
                @if !lesson.duration.is_empty() {
                    span.lesson-duration { (lesson.duration) }
                }
            }
        }
    }
}

fn render_create_form() -> Markup {
    html! {
        form.create-form #"create-form" {
            input type="text" name="title" placeholder="Lesson title";
            input type="date" name="date";
            input type="time" name="time";
            input type="text" name="duration" placeholder="Duration";
            button type="submit" { "Add lesson" }
            span.form-error #"form-error" {}
        }
    }
}

const CSS: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f4f5f7; color: #172b4d; }
.container { max-width: 1200px; margin: 0 auto; padding: 24px; }
h1 { font-size: 1.6rem; margin-bottom: 8px; }
.stats { color: #5e6c84; margin-bottom: 16px; }
.create-form { display: flex; gap: 8px; flex-wrap: wrap; margin-bottom: 24px; }
.create-form input { padding: 6px 8px; border: 1px solid #dfe1e6; border-radius: 4px; }
.create-form button { padding: 6px 12px; border: none; border-radius: 4px; background: #0052cc; color: #fff; cursor: pointer; }
.form-error { color: #de350b; align-self: center; }
.board { display: grid; grid-template-columns: repeat(3, 1fr); gap: 16px; }
.column { background: #ebecf0; border-radius: 6px; padding: 12px; min-height: 200px; }
.column.drag-over { outline: 2px dashed #0052cc; }
.column-header { font-weight: 600; margin-bottom: 12px; display: flex; justify-content: space-between; }
.column-count { color: #5e6c84; }
.lesson-card { background: #fff; border-radius: 4px; padding: 10px; margin-bottom: 8px; box-shadow: 0 1px 2px rgba(9,30,66,.25); cursor: grab; }
.lesson-title { font-weight: 500; margin-bottom: 4px; }
.lesson-meta { font-size: .85rem; color: #5e6c84; display: flex; gap: 6px; }
.lesson-duration { margin-left: auto; }
.empty-state { color: #8993a4; font-style: italic; }
"#;

const JAVASCRIPT: &str = r#"
document.querySelectorAll('.lesson-card').forEach(card => {
  card.addEventListener('dragstart', e => {
    e.dataTransfer.setData('text/plain', card.dataset.lessonId);
  });
});

document.querySelectorAll('.column').forEach(column => {
  column.addEventListener('dragover', e => { e.preventDefault(); column.classList.add('drag-over'); });
  column.addEventListener('dragleave', () => column.classList.remove('drag-over'));
  column.addEventListener('drop', async e => {
    e.preventDefault();
    column.classList.remove('drag-over');
    const id = e.dataTransfer.getData('text/plain');
    const res = await fetch(`/api/lessons/${id}/status`, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ status: column.dataset.status }),
    });
    if (res.ok) location.reload();
  });
});

document.getElementById('create-form').addEventListener('submit', async e => {
  e.preventDefault();
  const form = new FormData(e.target);
  const body = {
    title: form.get('title'),
    date: form.get('date') || null,
    time: form.get('time') || null,
    duration: form.get('duration') || '',
  };
  const res = await fetch('/api/lessons', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  if (res.ok) { location.reload(); return; }
  const err = await res.json().catch(() => ({ error: res.statusText }));
  document.getElementById('form-error').textContent = err.error;
});
"#;
