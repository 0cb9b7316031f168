//! Dependency graph between experiment tasks.

use crate::error::{Result, SrmpError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// Directed acyclic graph of task keys.
///
/// An edge `prerequisite -> task` means `task` may only start once
/// `prerequisite` has completed.
#[derive(Debug, Clone)]
pub struct TaskGraph<K> {
    prerequisites: BTreeMap<K, Vec<K>>,
    dependents: BTreeMap<K, Vec<K>>,
}

impl<K: Ord + Clone + Debug> Default for TaskGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + Debug> TaskGraph<K> {
    pub fn new() -> Self {
        Self {
            prerequisites: BTreeMap::new(),
            dependents: BTreeMap::new(),
        }
    }

    /// Builds a graph from task keys and `(prerequisite, task)` edges.
    pub fn from_edges<T, E>(tasks: T, edges: E) -> Result<Self>
    where
        T: IntoIterator<Item = K>,
        E: IntoIterator<Item = (K, K)>,
    {
        let mut graph = Self::new();
        for task in tasks {
            graph.add_task(task);
        }
        for (prerequisite, task) in edges {
            graph.add_dependency(&task, &prerequisite)?;
        }
        Ok(graph)
    }

    /// Registers a task; returns `false` if it was already known.
    pub fn add_task(&mut self, key: K) -> bool {
        if self.prerequisites.contains_key(&key) {
            return false;
        }
        self.prerequisites.insert(key.clone(), Vec::new());
        self.dependents.insert(key, Vec::new());
        true
    }

    /// Declares that `task` needs `prerequisite`.
    ///
    /// Both must be registered, and the edge must not close a cycle.
    pub fn add_dependency(&mut self, task: &K, prerequisite: &K) -> Result<()> {
        for key in [task, prerequisite] {
            if !self.contains(key) {
                return Err(SrmpError::InvalidTaskGraph(format!("unknown task {key:?}")));
            }
        }
        if task == prerequisite || self.reaches(task, prerequisite) {
            return Err(SrmpError::InvalidTaskGraph(format!(
                "{prerequisite:?} -> {task:?} closes a cycle"
            )));
        }
        if let Some(list) = self.prerequisites.get_mut(task) {
            if list.contains(prerequisite) {
                return Ok(());
            }
            list.push(prerequisite.clone());
        }
        if let Some(list) = self.dependents.get_mut(prerequisite) {
            list.push(task.clone());
        }
        Ok(())
    }

    /// Whether `to` is reachable from `from` along dependent edges.
    fn reaches(&self, from: &K, to: &K) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();
        while let Some(key) = stack.pop() {
            if key == to {
                return true;
            }
            if seen.insert(key) {
                stack.extend(self.dependents(key));
            }
        }
        false
    }

    pub fn contains(&self, key: &K) -> bool {
        self.prerequisites.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.prerequisites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.prerequisites.keys()
    }

    pub fn prerequisites(&self, key: &K) -> &[K] {
        self.prerequisites.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents(&self, key: &K) -> &[K] {
        self.dependents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tasks without prerequisites.
    pub fn roots(&self) -> Vec<K> {
        self.prerequisites
            .iter()
            .filter(|(_, pre)| pre.is_empty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Kahn order; ties resolved by key order.
    pub fn topological_order(&self) -> Vec<K> {
        let mut remaining: BTreeMap<&K, usize> =
            self.prerequisites.iter().map(|(k, p)| (k, p.len())).collect();
        let mut ready: BTreeSet<&K> = remaining
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(k, _)| *k)
            .collect();
        let mut order = Vec::with_capacity(self.len());
        while let Some(key) = ready.pop_first() {
            order.push(key.clone());
            for dependent in self.dependents(key) {
                if let Some(n) = remaining.get_mut(dependent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }
        order
    }
}
