//! Process roles.

use std::fmt;

/// The part a process (or local role thread) plays in the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    Master,
    Manager,
    /// Handles connections and requests.
    EventWorker { index: usize },
    /// Runs offloaded tasks.
    TaskWorker { index: usize },
}

impl ProcessRole {
    /// Classify a worker index: below `worker_num` is an event worker,
    /// everything else is a task worker.
    pub fn classify(worker_id: usize, worker_num: usize) -> Self {
        if worker_id < worker_num {
            ProcessRole::EventWorker { index: worker_id }
        } else {
            ProcessRole::TaskWorker { index: worker_id }
        }
    }

    /// Process title for this role.
    pub fn title(&self, process_name: &str) -> String {
        format!("{process_name}: {}", self.label())
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessRole::Master => "master",
            ProcessRole::Manager => "manager",
            ProcessRole::EventWorker { .. } => "worker_event",
            ProcessRole::TaskWorker { .. } => "worker_task",
        }
    }

    pub fn worker_index(&self) -> Option<usize> {
        match self {
            ProcessRole::EventWorker { index } | ProcessRole::TaskWorker { index } => Some(*index),
            _ => None,
        }
    }

    pub fn is_task_worker(&self) -> bool {
        matches!(self, ProcessRole::TaskWorker { .. })
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.worker_index() {
            Some(index) => write!(f, "{}#{index}", self.label()),
            None => f.write_str(self.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_splits_at_worker_num() {
        let roles: Vec<_> = (0..5).map(|id| ProcessRole::classify(id, 3)).collect();
        assert_eq!(
            roles,
            vec![
                ProcessRole::EventWorker { index: 0 },
                ProcessRole::EventWorker { index: 1 },
                ProcessRole::EventWorker { index: 2 },
                ProcessRole::TaskWorker { index: 3 },
                ProcessRole::TaskWorker { index: 4 },
            ]
        );
    }

    #[test]
    fn titles() {
        assert_eq!(ProcessRole::Master.title("app"), "app: master");
        assert_eq!(ProcessRole::Manager.title("app"), "app: manager");
        assert_eq!(ProcessRole::classify(0, 1).title("app"), "app: worker_event");
        assert_eq!(ProcessRole::classify(1, 1).title("app"), "app: worker_task");
        assert_eq!(ProcessRole::classify(4, 2).to_string(), "worker_task#4");
    }
}
