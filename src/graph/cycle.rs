//! Cycle detection for the target graph.

use indexmap::IndexMap;

use super::Target;

/// Tracks the visitation state of a node during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Search the dependency relation for a cycle.
///
/// Returns the first cycle found, canonicalised so the smallest target name
/// leads and the first name is repeated at the end. Link edges that point at
/// undeclared targets are skipped; callers reject those before cycle
/// detection runs.
pub(crate) fn find_cycle(targets: &IndexMap<String, Target>) -> Option<Vec<String>> {
    let mut detector = CycleDetector::new(targets);
    for node in targets.keys() {
        if detector.is_visited(node) {
            continue;
        }
        if let Some(found) = detector.visit(node.clone()) {
            return Some(found);
        }
    }
    None
}

struct CycleDetector<'a> {
    targets: &'a IndexMap<String, Target>,
    stack: Vec<String>,
    states: IndexMap<String, VisitState>,
}

impl<'a> CycleDetector<'a> {
    fn new(targets: &'a IndexMap<String, Target>) -> Self {
        Self {
            targets,
            stack: Vec::new(),
            states: IndexMap::new(),
        }
    }

    fn is_visited(&self, node: &str) -> bool {
        matches!(self.states.get(node), Some(VisitState::Visited))
    }

    fn visit(&mut self, node: String) -> Option<Vec<String>> {
        match self.states.get(&node) {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let idx = self.stack.iter().position(|n| n == &node).unwrap_or_else(|| {
                    debug_assert!(false, "visiting node must be on the stack");
                    0
                });
                let mut cycle: Vec<String> = self.stack.iter().skip(idx).cloned().collect();
                cycle.push(node);
                return Some(canonicalize_cycle(cycle));
            }
            None => {
                self.states.insert(node.clone(), VisitState::Visiting);
            }
        }

        self.stack.push(node.clone());

        if let Some(target) = self.targets.get(&node) {
            for edge in &target.links {
                if !self.targets.contains_key(&edge.target) {
                    tracing::debug!(
                        missing = %edge.target,
                        dependent = %node,
                        "skipping link to undeclared target during cycle detection",
                    );
                    continue;
                }

                if let Some(cycle) = self.visit(edge.target.clone()) {
                    return Some(cycle);
                }
            }
        }

        self.stack.pop();
        self.states.insert(node, VisitState::Visited);
        None
    }
}

/// Rotate a cycle so the smallest name leads, keeping the closing repeat.
fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;
    use crate::ast::TargetKind;
    use crate::graph::LinkEdge;

    fn lib(name: &str, links: &[&str]) -> Target {
        Target {
            name: name.to_owned(),
            kind: TargetKind::SharedLibrary,
            sources: Vec::new(),
            links: links
                .iter()
                .map(|dep| LinkEdge {
                    target: (*dep).to_owned(),
                    runtime: true,
                })
                .collect(),
            out_dir: Utf8PathBuf::from("build").join(name),
        }
    }

    fn graph_of(targets: Vec<Target>) -> IndexMap<String, Target> {
        targets.into_iter().map(|t| (t.name.clone(), t)).collect()
    }

    #[test]
    fn find_cycle_detects_self_edge() {
        let targets = graph_of(vec![lib("a", &["a"])]);
        let cycle = find_cycle(&targets).expect("cycle");
        assert_eq!(cycle, vec!["a".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn find_cycle_identifies_two_node_cycle() {
        let targets = graph_of(vec![lib("a", &["b"]), lib("b", &["a"])]);
        let cycle = find_cycle(&targets).expect("cycle");
        assert_eq!(
            cycle,
            vec!["a".to_owned(), "b".to_owned(), "a".to_owned()]
        );
    }

    #[test]
    fn find_cycle_accepts_diamond() {
        let targets = graph_of(vec![
            lib("top", &["left", "right"]),
            lib("left", &["base"]),
            lib("right", &["base"]),
            lib("base", &[]),
        ]);
        assert!(find_cycle(&targets).is_none());
    }

    #[test]
    fn visit_marks_nodes_visited_after_traversal() {
        let targets = graph_of(vec![lib("a", &["b"]), lib("b", &[])]);
        let mut detector = CycleDetector::new(&targets);
        assert!(detector.visit("a".to_owned()).is_none());
        assert!(detector.is_visited("a"));
        assert!(detector.is_visited("b"));
        assert!(
            detector.stack.is_empty(),
            "stack should be empty after complete traversal",
        );
    }

    #[test]
    fn canonicalize_cycle_rotates_smallest_node() {
        let cycle = vec!["c".to_owned(), "a".to_owned(), "b".to_owned(), "c".to_owned()];
        let canonical = canonicalize_cycle(cycle);
        let expected = vec!["a".to_owned(), "b".to_owned(), "c".to_owned(), "a".to_owned()];
        assert_eq!(canonical, expected);
    }

    #[test]
    fn canonicalize_cycle_handles_reverse_direction() {
        let cycle = vec!["c".to_owned(), "b".to_owned(), "a".to_owned(), "c".to_owned()];
        let canonical = canonicalize_cycle(cycle);
        let expected = vec!["a".to_owned(), "c".to_owned(), "b".to_owned(), "a".to_owned()];
        assert_eq!(canonical, expected);
    }
}
