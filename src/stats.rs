use crate::models::TaskCounts;
use crate::tasks::Task;

pub fn build_counts(tasks: &[Task]) -> TaskCounts {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();

    TaskCounts {
        total,
        completed,
        pending: total - completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskRepository;

    #[test]
    fn counts_empty_repository() {
        let counts = build_counts(&[]);
        assert_eq!(counts, TaskCounts::default());
    }

    #[test]
    fn counts_split_completed_and_pending() {
        let mut repo = TaskRepository::new();
        let first = repo.add("one").unwrap().id;
        repo.add("two").unwrap();
        repo.add("three").unwrap();
        repo.toggle(first);

        let counts = build_counts(repo.tasks());
        assert_eq!(counts.total, 3);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.total, counts.completed + counts.pending);
    }
}
