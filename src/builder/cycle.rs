//! Cycle detection over unresolved target dependencies.
//!
//! When input ends with items defined but unresolved, and none of their
//! outstanding references are missing, the remaining items wait on each
//! other: a cycle. A depth-first walk over the dep edges of defined,
//! unresolved targets recovers the participating labels.

use std::collections::HashMap;

use crate::errors::GenError;
use crate::item::Item;
use crate::label::Label;

use super::Builder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

pub(super) fn find_cycles(builder: &Builder) -> Vec<GenError> {
    let mut detector = CycleDetector::new(builder);
    let nodes: Vec<Label> = builder
        .records
        .iter()
        .filter(|(_, record)| !record.resolved && record.item.is_some())
        .map(|(label, _)| label.clone())
        .collect();

    for node in nodes {
        if detector.is_visited(&node) {
            continue;
        }
        if let Some(found) = detector.visit(node) {
            let location = found
                .first()
                .and_then(|label| builder.item(label))
                .map(|item| item.defined_from().clone())
                .unwrap_or_default();
            return vec![GenError::DependencyCycle {
                members: canonicalize_cycle(found),
                location,
            }];
        }
    }
    Vec::new()
}

struct CycleDetector<'a> {
    builder: &'a Builder,
    stack: Vec<Label>,
    states: HashMap<Label, VisitState>,
}

impl<'a> CycleDetector<'a> {
    fn new(builder: &'a Builder) -> Self {
        Self {
            builder,
            stack: Vec::new(),
            states: HashMap::new(),
        }
    }

    fn is_visited(&self, node: &Label) -> bool {
        matches!(self.states.get(node), Some(VisitState::Visited))
    }

    /// Edges only lead to other defined, unresolved targets: a resolved
    /// target cannot participate in a cycle, and missing referents are
    /// reported separately.
    fn edges(&self, node: &Label) -> Vec<Label> {
        let Some(record) = self.builder.records.get(node) else {
            return Vec::new();
        };
        let Some(Item::Target(target)) = &record.item else {
            return Vec::new();
        };
        target
            .deps
            .iter()
            .chain(target.datadeps.iter())
            .filter(|dep| {
                self.builder
                    .records
                    .get(*dep)
                    .is_some_and(|r| !r.resolved && r.item.is_some())
            })
            .cloned()
            .collect()
    }

    fn visit(&mut self, node: Label) -> Option<Vec<Label>> {
        match self.states.get(&node) {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let idx = self.stack.iter().position(|n| n == &node).unwrap_or_else(|| {
                    debug_assert!(false, "visiting node must be on the stack");
                    0
                });
                let mut cycle: Vec<Label> = self.stack.iter().skip(idx).cloned().collect();
                cycle.push(node);
                return Some(cycle);
            }
            None => {
                self.states.insert(node.clone(), VisitState::Visiting);
            }
        }

        self.stack.push(node.clone());
        for dep in self.edges(&node) {
            if let Some(cycle) = self.visit(dep) {
                return Some(cycle);
            }
        }
        self.stack.pop();
        self.states.insert(node, VisitState::Visited);
        None
    }
}

/// Rotate the cycle so the smallest label leads; keeps diagnostics stable
/// regardless of which member the walk entered through.
fn canonicalize_cycle(mut cycle: Vec<Label>) -> Vec<Label> {
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
    use super::*;
    use crate::paths::SourceDir;

    fn label(name: &str) -> Label {
        Label::without_toolchain(SourceDir::new("//foo/"), name)
    }

    #[test]
    fn canonicalize_rotates_smallest_first() {
        let cycle = vec![label("c"), label("a"), label("b"), label("c")];
        let canonical = canonicalize_cycle(cycle);
        assert_eq!(canonical, vec![label("a"), label("b"), label("c"), label("a")]);
    }

    #[test]
    fn short_cycles_pass_through() {
        let cycle = vec![label("a"), label("a")];
        assert_eq!(canonicalize_cycle(cycle.clone()), cycle);
    }
}
