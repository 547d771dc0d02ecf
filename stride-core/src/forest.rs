//! TaskForest: identity-indexed storage for a task hierarchy.
//!
//! Design:
//! - Canonical task copies live in a map (id -> node). A stored task never
//!   carries its `subtasks`; children are tracked as ordered id lists.
//! - `parent_id` on the stored task always mirrors the node's parent link.
//! - Root order and sibling order are preserved exactly.
//! - The nested tree the presentation layer wants is derived on demand.
//!
//! Structural edits are map lookups instead of recursive tree walks.

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Remove the whole subtree.
    Cascade,
    /// Promote direct children to roots, keeping their order.
    Orphan,
}

#[derive(Debug, Clone)]
struct Node {
    task: Task,
    children: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

#[derive(Debug, Default, Clone)]
pub struct TaskForest {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
}

impl TaskForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from flat persistence records keyed by `parent_id`.
    ///
    /// Records may also carry nested `subtasks`; those are absorbed too.
    /// A record whose parent is unknown, or that sits on a parent cycle,
    /// becomes a root. For duplicate ids the first record wins. Linear in the
    /// number of records, whatever the depth.
    pub fn from_records(records: Vec<Task>) -> Self {
        let mut flat: Vec<Task> = Vec::with_capacity(records.len());
        let mut stack: Vec<Task> = records.into_iter().rev().collect();
        while let Some(mut task) = stack.pop() {
            let children = std::mem::take(&mut task.subtasks);
            for mut child in children.into_iter().rev() {
                child.parent_id = Some(task.id.clone());
                stack.push(child);
            }
            flat.push(task);
        }

        let mut forest = Self::new();
        let mut order: Vec<String> = Vec::with_capacity(flat.len());
        for task in flat {
            if forest.nodes.contains_key(&task.id) {
                continue;
            }
            order.push(task.id.clone());
            forest.nodes.insert(
                task.id.clone(),
                Node {
                    task,
                    children: Vec::new(),
                },
            );
        }

        // Unknown or self parents make a root.
        for id in &order {
            let known = forest.nodes[id]
                .task
                .parent_id
                .as_ref()
                .is_some_and(|p| p != id && forest.nodes.contains_key(p));
            if !known {
                if let Some(node) = forest.nodes.get_mut(id) {
                    node.task.parent_id = None;
                }
            }
        }

        // Every record on a parent cycle becomes a root; records hanging off
        // a cycle keep their parent.
        for id in forest.cycle_members(&order) {
            if let Some(node) = forest.nodes.get_mut(&id) {
                node.task.parent_id = None;
            }
        }

        for id in order {
            match forest.nodes[&id].task.parent_id.clone() {
                Some(p) => {
                    if let Some(node) = forest.nodes.get_mut(&p) {
                        node.children.push(id);
                    }
                }
                None => forest.roots.push(id),
            }
        }

        forest
    }

    pub fn from_tree(roots: Vec<Task>) -> Self {
        Self::from_records(roots)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The stored task (its `subtasks` field is always empty).
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.nodes.get(id).map(|n| &n.task)
    }

    pub fn root_ids(&self) -> &[String] {
        &self.roots
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Edit fields of a stored task. Identity and hierarchy links are
    /// restored after `f` runs; use [`TaskForest::move_task`] to re-parent.
    pub fn update<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        let Some(node) = self.nodes.get_mut(id) else {
            bail!("unknown task id: {id}");
        };
        let parent = node.task.parent_id.clone();
        f(&mut node.task);
        node.task.id = id.to_string();
        node.task.parent_id = parent;
        node.task.subtasks.clear();
        Ok(())
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<()> {
        self.update(id, |t| t.completed = completed)
    }

    pub fn insert_root(&mut self, task: Task) -> Result<()> {
        self.insert_under(None, task)
    }

    pub fn add_subtask(&mut self, parent_id: &str, task: Task) -> Result<()> {
        if !self.contains(parent_id) {
            bail!("unknown parent id: {parent_id}");
        }
        self.insert_under(Some(parent_id), task)
    }

    /// Insert `task` (and any nested subtasks) as the last child of `parent`,
    /// or as the last root.
    fn insert_under(&mut self, parent: Option<&str>, task: Task) -> Result<()> {
        let incoming = Self::from_records(vec![task]);
        if let Some(dup) = incoming.nodes.keys().find(|id| self.nodes.contains_key(*id)) {
            bail!("duplicate task id: {dup}");
        }
        let Some(top) = incoming.roots.first().cloned() else {
            return Ok(());
        };

        for (id, mut node) in incoming.nodes {
            if id == top {
                node.task.parent_id = parent.map(str::to_string);
            }
            self.nodes.insert(id, node);
        }
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    node.children.push(top);
                }
            }
            None => self.roots.push(top),
        }
        Ok(())
    }

    /// Re-parent a task (with its subtree). `None` makes it a root.
    pub fn move_task(&mut self, id: &str, new_parent: Option<&str>) -> Result<()> {
        if !self.contains(id) {
            bail!("unknown task id: {id}");
        }
        if let Some(p) = new_parent {
            if !self.contains(p) {
                bail!("unknown parent id: {p}");
            }
            if self.would_cycle(id, p) {
                bail!("cannot move {id} under its own subtree ({p})");
            }
        }

        self.detach(id);
        match new_parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    node.children.push(id.to_string());
                }
            }
            None => self.roots.push(id.to_string()),
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.task.parent_id = new_parent.map(str::to_string);
        }
        Ok(())
    }

    /// Remove a task, detaching it from its parent. Returns the removed tasks
    /// in pre-order.
    pub fn remove(&mut self, id: &str, policy: DeletePolicy) -> Result<Vec<Task>> {
        if !self.contains(id) {
            bail!("unknown task id: {id}");
        }
        self.detach(id);

        let doomed = match policy {
            DeletePolicy::Cascade => self.walk(&[id.to_string()]),
            DeletePolicy::Orphan => {
                let children = self.children(id).to_vec();
                for c in &children {
                    if let Some(node) = self.nodes.get_mut(c) {
                        node.task.parent_id = None;
                    }
                }
                self.roots.extend(children);
                vec![id.to_string()]
            }
        };

        Ok(doomed
            .into_iter()
            .filter_map(|d| self.nodes.remove(&d))
            .map(|n| n.task)
            .collect())
    }

    /// Parent chain, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cur = self.get(id).and_then(|t| t.parent_id.as_deref());
        while let Some(pid) = cur {
            if !seen.insert(pid) {
                break;
            }
            out.push(pid.to_string());
            cur = self.get(pid).and_then(|t| t.parent_id.as_deref());
        }
        out
    }

    /// All descendants in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut all = self.walk(&[id.to_string()]);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Derive the nested view: each task carries its subtasks again.
    pub fn to_tree(&self) -> Vec<Task> {
        // Post-order assembly keeps this iterative.
        let order = self.walk(&self.roots);
        let mut built: HashMap<&str, Task> = HashMap::with_capacity(order.len());
        for id in order.iter().rev() {
            let node = &self.nodes[id];
            let mut task = node.task.clone();
            task.subtasks = node
                .children
                .iter()
                .filter_map(|c| built.remove(c.as_str()))
                .collect();
            built.insert(id.as_str(), task);
        }
        self.roots
            .iter()
            .filter_map(|r| built.remove(r.as_str()))
            .collect()
    }

    /// Flat records in pre-order, each with `parent_id` set and no subtasks.
    pub fn to_records(&self) -> Vec<Task> {
        self.walk(&self.roots)
            .iter()
            .map(|id| self.nodes[id].task.clone())
            .collect()
    }

    /// Pre-order ids below and including `start`.
    fn walk(&self, start: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&String> = start.iter().rev().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            out.push(id.clone());
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Remove `id` from its parent's child list or from the roots.
    fn detach(&mut self, id: &str) {
        let parent = self.get(id).and_then(|t| t.parent_id.clone());
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(node) => node.children.retain(|c| c != id),
            None => self.roots.retain(|r| r != id),
        }
    }

    /// Ids that lie on a `parent_id` cycle, found with one colouring pass over
    /// the parent links. Each id is visited once.
    fn cycle_members(&self, order: &[String]) -> Vec<String> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(order.len());
        let mut on_cycle = Vec::new();
        for start in order {
            let mut path: Vec<&str> = Vec::new();
            let mut cur = Some(start.as_str());
            while let Some(id) = cur {
                match marks.get(id) {
                    Some(Mark::Done) => break,
                    Some(Mark::OnPath) => {
                        // Back on the current path: the tail from `id` loops.
                        if let Some(pos) = path.iter().position(|p| *p == id) {
                            on_cycle.extend(path[pos..].iter().map(|p| p.to_string()));
                        }
                        break;
                    }
                    None => {
                        marks.insert(id, Mark::OnPath);
                        path.push(id);
                        cur = self.get(id).and_then(|t| t.parent_id.as_deref());
                    }
                }
            }
            for id in path {
                marks.insert(id, Mark::Done);
            }
        }
        on_cycle
    }

    /// True when `candidate_parent` is `id` or sits below it.
    fn would_cycle(&self, id: &str, candidate_parent: &str) -> bool {
        candidate_parent == id || self.ancestors(candidate_parent).iter().any(|a| a == id)
    }
}
