use crate::models::{ChangeResponse, TaskCounts, TaskView};
use crate::render::RowList;
use crate::stats::build_counts;
use crate::storage::{FileStore, StoreError, WEATHER_CITY_KEY};
use crate::tasks::{Confirm, EditOutcome, RemoveOutcome, TaskError, TaskId, TaskRepository};
use crate::weather::normalize_city;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Session {
    store: FileStore,
    tasks: TaskRepository,
    rows: RowList,
    default_city: String,
}

impl Session {
    /// Builds the session from whatever the store holds.
    pub fn load(store: FileStore, default_city: impl Into<String>) -> Self {
        let tasks = TaskRepository::restore(store.load_tasks());
        let mut rows = RowList::new();
        rows.render_all(tasks.tasks());
        debug!(count = tasks.len(), "restored tasks");

        Self {
            store,
            tasks,
            rows,
            default_city: default_city.into(),
        }
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.tasks
    }

    pub fn rows(&self) -> &RowList {
        &self.rows
    }

    pub fn counts(&self) -> TaskCounts {
        build_counts(self.tasks.tasks())
    }

    pub fn task_views(&self) -> Vec<TaskView> {
        self.tasks.tasks().iter().map(TaskView::from).collect()
    }

    pub async fn add_task(&mut self, text: &str) -> Result<ChangeResponse, TaskError> {
        let task = self.tasks.add(text)?.clone();
        debug!(id = %task.id, "task added");
        let warning = self.persist_tasks().await;
        let row_html = self.rows.render_row(&task).to_html();

        Ok(ChangeResponse {
            changed: true,
            task: Some(TaskView::from(&task)),
            row_html: Some(row_html),
            removed_id: None,
            counts: self.counts(),
            warning,
        })
    }

    pub async fn toggle_task(&mut self, id: TaskId) -> ChangeResponse {
        let Some(task) = self.tasks.toggle(id).cloned() else {
            return self.unchanged();
        };
        debug!(id = %id, completed = task.completed, "task toggled");
        let warning = self.persist_tasks().await;
        let row_html = self.rows.refresh_row(&task).map(|row| row.to_html());

        ChangeResponse {
            changed: true,
            task: Some(TaskView::from(&task)),
            row_html,
            removed_id: None,
            counts: self.counts(),
            warning,
        }
    }

    pub async fn edit_task(&mut self, id: TaskId, text: &str) -> ChangeResponse {
        match self.tasks.edit(id, text) {
            EditOutcome::Missing => self.unchanged(),
            EditOutcome::Discarded => {
                debug!(id = %id, "blank edit discarded");
                let mut response = self.unchanged();
                response.task = self.tasks.get(id).map(TaskView::from);
                response.row_html = self.rows.get(id).map(|row| row.to_html());
                response
            }
            EditOutcome::Updated => {
                let warning = self.persist_tasks().await;
                let Some(task) = self.tasks.get(id).cloned() else {
                    return self.unchanged();
                };
                debug!(id = %id, "task edited");
                let row_html = self.rows.refresh_row(&task).map(|row| row.to_html());

                ChangeResponse {
                    changed: true,
                    task: Some(TaskView::from(&task)),
                    row_html,
                    removed_id: None,
                    counts: self.counts(),
                    warning,
                }
            }
        }
    }

    pub async fn remove_task(&mut self, id: TaskId, confirm: &impl Confirm) -> ChangeResponse {
        match self.tasks.remove(id, confirm) {
            RemoveOutcome::Missing | RemoveOutcome::Declined => self.unchanged(),
            RemoveOutcome::Removed(task) => {
                debug!(id = %id, "task removed");
                let warning = self.persist_tasks().await;
                self.rows.remove_row(task.id);

                ChangeResponse {
                    changed: true,
                    task: None,
                    row_html: None,
                    removed_id: Some(task.id),
                    counts: self.counts(),
                    warning,
                }
            }
        }
    }

    pub async fn clear_tasks(&mut self, confirm: &impl Confirm) -> ChangeResponse {
        if !self.tasks.clear(confirm) {
            return self.unchanged();
        }
        debug!("all tasks cleared");
        let warning = self.persist_tasks().await;
        self.rows.clear();

        ChangeResponse {
            changed: true,
            counts: self.counts(),
            warning,
            ..ChangeResponse::default()
        }
    }

    pub fn weather_city(&self) -> &str {
        self.store
            .get(WEATHER_CITY_KEY)
            .unwrap_or(self.default_city.as_str())
    }

    /// Stores a new city name. Returns the normalized name and an optional
    /// storage warning, or `None` when the name is blank.
    pub async fn set_weather_city(&mut self, raw: &str) -> Option<(String, Option<String>)> {
        let city = normalize_city(raw)?;
        let warning = self
            .store
            .set(WEATHER_CITY_KEY, city.clone())
            .await
            .err()
            .map(storage_warning);
        Some((city, warning))
    }

    async fn persist_tasks(&mut self) -> Option<String> {
        let records = self.tasks.records();
        self.store.save_tasks(&records).await.err().map(storage_warning)
    }

    fn unchanged(&self) -> ChangeResponse {
        ChangeResponse {
            counts: self.counts(),
            ..ChangeResponse::default()
        }
    }
}

fn storage_warning(err: StoreError) -> String {
    warn!("store write failed, continuing in memory: {err}");
    "Changes could not be saved; they will be lost when the page is closed.".to_string()
}
