//! Local worker pool running a [`TaskGraph`].

use super::graph::TaskGraph;
use crate::error::{Result, SrmpError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, warn};

/// Body of one task.
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// What happened to every task of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport<K> {
    /// Completed tasks, in completion order.
    pub completed: Vec<K>,
    /// Failed tasks with their error message.
    pub failed: Vec<(K, String)>,
    /// Tasks that never started.
    pub never_run: Vec<K>,
}

impl<K> ExecutionReport<K> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.never_run.is_empty()
    }
}

/// Runs tasks on worker threads as soon as their prerequisites complete.
///
/// The calling thread coordinates: it owns the graph state and feeds a
/// bounded queue shared by the workers. A worker whose task fails or panics
/// reports the failure and exits; the failed task's dependents never run.
#[derive(Debug, Clone)]
pub struct Executor {
    workers: usize,
    queue_capacity: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(thread::available_parallelism().map_or(1, |n| n.get()))
    }
}

impl Executor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_capacity: 64,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every task of `graph`; `tasks` must hold one body per key.
    pub fn run<K>(&self, graph: &TaskGraph<K>, mut tasks: BTreeMap<K, Task>) -> Result<ExecutionReport<K>>
    where
        K: Ord + Clone + Debug + Send + 'static,
    {
        if let Some(key) = graph.keys().find(|k| !tasks.contains_key(*k)) {
            return Err(SrmpError::InvalidTaskGraph(format!("task {key:?} has no body")));
        }

        let (queue_tx, queue_rx) = mpsc::sync_channel::<(K, Task)>(self.queue_capacity);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (done_tx, done_rx) = mpsc::channel::<(K, Result<()>)>();

        let handles: Vec<_> = (0..self.workers)
            .map(|id| {
                let queue = Arc::clone(&queue_rx);
                let done = done_tx.clone();
                thread::spawn(move || worker_loop(id, &queue, done))
            })
            .collect();
        // only workers hold completion senders now
        drop(done_tx);
        drop(queue_rx);

        let mut remaining: BTreeMap<K, usize> = graph
            .keys()
            .map(|k| (k.clone(), graph.prerequisites(k).len()))
            .collect();
        let mut enqueued: BTreeSet<K> = BTreeSet::new();
        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut in_flight = 0usize;
        let mut workers_alive = true;

        let dispatch = |key: K,
                            enqueued: &mut BTreeSet<K>,
                            in_flight: &mut usize,
                            tasks: &mut BTreeMap<K, Task>|
         -> bool {
            if !enqueued.insert(key.clone()) {
                return true;
            }
            let Some(task) = tasks.remove(&key) else {
                return true;
            };
            if queue_tx.send((key, task)).is_err() {
                return false;
            }
            *in_flight += 1;
            true
        };

        for key in graph.roots() {
            if !dispatch(key, &mut enqueued, &mut in_flight, &mut tasks) {
                workers_alive = false;
                break;
            }
        }

        while workers_alive && in_flight > 0 {
            let Ok((key, outcome)) = done_rx.recv() else {
                // every worker has exited
                break;
            };
            in_flight -= 1;
            match outcome {
                Ok(()) => {
                    debug!(task = ?key, "task completed");
                    for dependent in graph.dependents(&key) {
                        let Some(n) = remaining.get_mut(dependent) else {
                            continue;
                        };
                        *n -= 1;
                        if *n == 0
                            && !dispatch(dependent.clone(), &mut enqueued, &mut in_flight, &mut tasks)
                        {
                            workers_alive = false;
                            break;
                        }
                    }
                    completed.push(key);
                }
                Err(err) => {
                    warn!(task = ?key, error = %err, "task failed");
                    failed.push((key, err.to_string()));
                }
            }
        }

        drop(queue_tx);
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker panicked");
            }
        }

        let settled: BTreeSet<&K> = completed
            .iter()
            .chain(failed.iter().map(|(k, _)| k))
            .collect();
        let never_run = graph
            .topological_order()
            .into_iter()
            .filter(|k| !settled.contains(k))
            .collect();
        Ok(ExecutionReport {
            completed,
            failed,
            never_run,
        })
    }
}

fn worker_loop<K: Debug>(
    id: usize,
    queue: &Mutex<Receiver<(K, Task)>>,
    done: mpsc::Sender<(K, Result<()>)>,
) {
    loop {
        let next = match queue.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => return,
        };
        let Ok((key, task)) = next else {
            return;
        };
        debug!(worker = id, task = ?key, "task started");
        let outcome = catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
            Err(SrmpError::TaskPanicked(panic_message(payload.as_ref())))
        });
        let failed = outcome.is_err();
        if done.send((key, outcome)).is_err() || failed {
            debug!(worker = id, "worker exiting");
            return;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_task(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Task {
        let log = Arc::clone(log);
        Box::new(move || {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_runs_in_dependency_order() {
        let graph = TaskGraph::from_edges(
            ["a", "b", "c", "d"],
            [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let tasks: BTreeMap<_, Task> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| (name, ok_task(&log, name)))
            .collect();
        let report = Executor::new(3).run(&graph, tasks).unwrap();
        assert!(report.is_success());
        assert_eq!(report.completed.len(), 4);
        let log = log.lock().unwrap();
        let pos = |n| log.iter().position(|x| *x == n).unwrap();
        assert!(pos("a") < pos("b") && pos("a") < pos("c"));
        assert!(pos("b") < pos("d") && pos("c") < pos("d"));
    }

    #[test]
    fn test_failure_blocks_dependents() {
        let graph = TaskGraph::from_edges(
            ["gen", "fit", "test", "other"],
            [("gen", "fit"), ("fit", "test")],
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tasks: BTreeMap<_, Task> = BTreeMap::new();
        tasks.insert("gen", ok_task(&log, "gen"));
        tasks.insert(
            "fit",
            Box::new(|| Err(SrmpError::InvalidModel("no model".into()))),
        );
        tasks.insert("test", ok_task(&log, "test"));
        tasks.insert("other", ok_task(&log, "other"));
        let report = Executor::new(2).run(&graph, tasks).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "fit");
        assert_eq!(report.never_run, vec!["test"]);
        assert!(!log.lock().unwrap().contains(&"test"));
    }

    #[test]
    fn test_all_workers_failing_stops_run() {
        let graph = TaskGraph::from_edges(["a", "b", "c"], []).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let tasks: BTreeMap<_, Task> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let runs = Arc::clone(&runs);
                let task: Task = Box::new(move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Err(SrmpError::InvalidModel("boom".into()))
                });
                (name, task)
            })
            .collect();
        let report = Executor::new(1).run(&graph, tasks).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.never_run.len(), 2);
    }

    #[test]
    fn test_panicking_task_reported_as_failure() {
        let graph = TaskGraph::from_edges(["a", "b"], []).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tasks: BTreeMap<_, Task> = BTreeMap::new();
        tasks.insert("a", Box::new(|| -> Result<()> { panic!("solver blew up") }));
        tasks.insert("b", ok_task(&log, "b"));
        let report = Executor::new(2).run(&graph, tasks).unwrap();
        assert_eq!(report.completed, vec!["b"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "a");
        assert!(report.failed[0].1.contains("solver blew up"));
        assert!(report.never_run.is_empty());
    }

    #[test]
    fn test_missing_body_rejected() {
        let graph = TaskGraph::from_edges(["a"], []).unwrap();
        assert!(Executor::new(1).run(&graph, BTreeMap::new()).is_err());
    }
}
