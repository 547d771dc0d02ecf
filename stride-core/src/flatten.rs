//! Hierarchy flattener: task forest -> flat pre-order sequence.
//!
//! Uses an explicit stack so arbitrarily deep subtask chains cannot overflow
//! the call stack.

use std::collections::HashMap;

use crate::task::Task;

/// Every task in the forest exactly once, depth-first pre-order.
///
/// A parent precedes its descendants and siblings keep their stored order.
pub fn flatten(roots: &[Task]) -> Vec<&Task> {
    let mut out = Vec::with_capacity(roots.len());
    // Pushed in reverse so the first sibling is popped first.
    let mut stack: Vec<&Task> = roots.iter().rev().collect();

    while let Some(task) = stack.pop() {
        out.push(task);
        stack.extend(task.subtasks.iter().rev());
    }

    out
}

pub fn count_nodes(roots: &[Task]) -> usize {
    let mut n = 0;
    let mut stack: Vec<&Task> = roots.iter().collect();
    while let Some(task) = stack.pop() {
        n += 1;
        stack.extend(task.subtasks.iter());
    }
    n
}

/// Nesting depth per task id (roots are 0). Used for tree-indented output.
pub fn depth_map(roots: &[Task]) -> HashMap<&str, usize> {
    let mut depths = HashMap::new();
    let mut stack: Vec<(&Task, usize)> = roots.iter().map(|t| (t, 0)).collect();
    while let Some((task, depth)) = stack.pop() {
        depths.insert(task.id.as_str(), depth);
        stack.extend(task.subtasks.iter().map(|c| (c, depth + 1)));
    }
    depths
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::task::fixtures::task;
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// Forest built from a shape: each entry is (parent slot or None, ...).
    fn build(parents: &[Option<usize>]) -> Vec<Task> {
        // Node i may only attach to an earlier node, so the shape is acyclic.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); parents.len()];
        let mut roots = Vec::new();
        for (i, p) in parents.iter().enumerate() {
            match p {
                Some(p) if *p < i => children[*p].push(i),
                _ => roots.push(i),
            }
        }
        fn make(i: usize, children: &[Vec<usize>]) -> Task {
            task(&format!("t{i}"))
                .with_subtasks(children[i].iter().map(|&c| make(c, children)).collect())
        }
        roots.into_iter().map(|r| make(r, &children)).collect()
    }

    proptest! {
        #[test]
        fn every_node_exactly_once(parents in prop::collection::vec(prop::option::of(0usize..40), 0..40)) {
            let forest = build(&parents);
            let flat = flatten(&forest);
            prop_assert_eq!(flat.len(), parents.len());
            let unique: HashSet<&str> = flat.iter().map(|t| t.id.as_str()).collect();
            prop_assert_eq!(unique.len(), parents.len());
        }

        #[test]
        fn parents_precede_children(parents in prop::collection::vec(prop::option::of(0usize..40), 0..40)) {
            let forest = build(&parents);
            let flat = flatten(&forest);
            let pos: std::collections::HashMap<&str, usize> =
                flat.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
            for t in &flat {
                for c in &t.subtasks {
                    prop_assert!(pos[t.id.as_str()] < pos[c.id.as_str()]);
                }
            }
        }
    }
}
