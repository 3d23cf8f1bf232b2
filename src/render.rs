use crate::tasks::{Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub task_id: TaskId,
    pub text: String,
    pub done: bool,
}

impl Row {
    fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            text: task.text.clone(),
            done: task.completed,
        }
    }

    pub fn element_id(&self) -> String {
        format!("task-{}", self.task_id)
    }

    pub fn to_html(&self) -> String {
        let done = if self.done { " done" } else { "" };
        format!(
            r#"<li id="{element_id}" class="task" data-id="{id}"><span class="task-text{done}" title="Click to toggle, double-click to edit">{text}</span><button class="task-delete" type="button" aria-label="Delete task">❌</button></li>"#,
            element_id = self.element_id(),
            id = self.task_id,
            text = escape_html(&self.text),
        )
    }
}

#[derive(Debug, Default)]
pub struct RowList {
    rows: Vec<Row>,
}

impl RowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every row and rebuilds one per task, in order.
    pub fn render_all(&mut self, tasks: &[Task]) {
        self.rows.clear();
        for task in tasks {
            self.render_row(task);
        }
    }

    pub fn render_row(&mut self, task: &Task) -> &Row {
        self.rows.push(Row::from_task(task));
        &self.rows[self.rows.len() - 1]
    }

    pub fn refresh_row(&mut self, task: &Task) -> Option<&Row> {
        let row = self.rows.iter_mut().find(|row| row.task_id == task.id)?;
        row.text = task.text.clone();
        row.done = task.completed;
        Some(row)
    }

    pub fn remove_row(&mut self, id: TaskId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.task_id != id);
        self.rows.len() != before
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn get(&self, id: TaskId) -> Option<&Row> {
        self.rows.iter().find(|row| row.task_id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.rows.iter().map(|row| row.task_id).collect()
    }

    pub fn to_html(&self) -> String {
        self.rows.iter().map(Row::to_html).collect::<Vec<_>>().join("\n")
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskRepository;

    #[test]
    fn render_all_follows_repository_order() {
        let mut repo = TaskRepository::new();
        repo.add("first").unwrap();
        repo.add("second").unwrap();
        let mut rows = RowList::new();
        rows.render_all(repo.tasks());
        rows.render_all(repo.tasks());

        let expected: Vec<_> = repo.tasks().iter().map(|t| t.id).collect();
        assert_eq!(rows.ids(), expected);
    }

    #[test]
    fn refresh_row_tracks_done_state() {
        let mut repo = TaskRepository::new();
        let id = repo.add("Buy milk").unwrap().id;
        let mut rows = RowList::new();
        rows.render_all(repo.tasks());

        let task = repo.toggle(id).unwrap();
        let row = rows.refresh_row(task).unwrap();
        assert!(row.done);
        assert!(row.to_html().contains(r#"class="task-text done""#));
    }

    #[test]
    fn remove_row_reports_whether_it_existed() {
        let mut repo = TaskRepository::new();
        let id = repo.add("a").unwrap().id;
        let mut rows = RowList::new();
        rows.render_row(&repo.tasks()[0]);

        assert!(rows.remove_row(id));
        assert!(!rows.remove_row(id));
        assert!(rows.is_empty());
    }

    #[test]
    fn row_html_escapes_text() {
        let mut repo = TaskRepository::new();
        repo.add("<b>\"milk\" & eggs</b>").unwrap();
        let mut rows = RowList::new();
        let html = rows.render_row(&repo.tasks()[0]).to_html();

        assert!(html.contains("&lt;b&gt;&quot;milk&quot; &amp; eggs&lt;/b&gt;"));
        let id = repo.tasks()[0].id;
        assert!(html.starts_with(&format!(r#"<li id="task-{id}""#)));
    }
}
