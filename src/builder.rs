//! The builder: owns every declared item and drives deferred resolution.
//!
//! Producers deliver fully-formed items in whatever order their build
//! files load. Each item's label references (deps, datadeps, configs,
//! forwarded deps, toolchain) may point at items that have not arrived
//! yet; the builder records the outstanding references and resolves each
//! item once the last one lands, propagating to a fixpoint. Anything
//! still outstanding when input ends is reported by
//! [`Builder::check_for_bad_items`].

mod cycle;

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use crate::config::Config;
use crate::errors::{GenError, Location};
use crate::item::{GraphView, Item};
use crate::label::Label;
use crate::target::Target;
use crate::toolchain::Toolchain;

#[derive(Debug, Default)]
struct ItemRecord {
    /// The defined item; `None` while this record is only a placeholder
    /// created by a forward reference.
    item: Option<Item>,
    resolved: bool,
    /// Labels this item still waits on.
    waiting_on: IndexSet<Label>,
    /// Labels waiting on this item.
    waiters: Vec<Label>,
    /// Who referenced this label first, for unresolved diagnostics.
    first_referenced_by: Option<(Label, Location)>,
}

/// Owner of all items, keyed by label.
#[derive(Debug, Default)]
pub struct Builder {
    records: IndexMap<Label, ItemRecord>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a defined item, resolving it (and anything it unblocks)
    /// when all its references are already resolved.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::DuplicateDefinition`] when an item with this
    /// label was already defined.
    pub fn item_defined(&mut self, item: Item) -> Result<(), GenError> {
        let label = item.label().clone();
        let location = item.defined_from().clone();

        if let Some(existing) = self.records.get(&label).and_then(|r| r.item.as_ref()) {
            return Err(GenError::DuplicateDefinition {
                label,
                location,
                previous: existing.defined_from().clone(),
            });
        }

        let refs = referenced_labels(&item);
        self.records.entry(label.clone()).or_default().item = Some(item);

        let mut waiting = IndexSet::new();
        for reference in refs {
            let record = self.get_or_create_placeholder(&reference);
            if record.first_referenced_by.is_none() {
                record.first_referenced_by = Some((label.clone(), location.clone()));
            }
            if !record.resolved {
                record.waiters.push(label.clone());
                waiting.insert(reference);
            }
        }

        let ready = waiting.is_empty();
        if let Some(record) = self.records.get_mut(&label) {
            record.waiting_on = waiting;
        }
        if ready {
            self.resolve_from(label)?;
        }
        Ok(())
    }

    /// Ensure a record exists for `label`. The label itself is the stable
    /// handle a referring item retains; the referent may arrive later.
    fn get_or_create_placeholder(&mut self, label: &Label) -> &mut ItemRecord {
        self.records.entry(label.clone()).or_default()
    }

    /// Resolve `start`, then walk the wake-up graph to a fixpoint.
    fn resolve_from(&mut self, start: Label) -> Result<(), GenError> {
        let mut queue = VecDeque::from([start]);
        while let Some(label) = queue.pop_front() {
            let ready = self.records.get(&label).is_some_and(|record| {
                !record.resolved && record.item.is_some() && record.waiting_on.is_empty()
            });
            if !ready {
                continue;
            }

            // Take the item out so propagation can read the rest of the
            // store immutably while mutating this one.
            let Some(mut item) = self.records.get_mut(&label).and_then(|r| r.item.take()) else {
                continue;
            };
            let result = match &mut item {
                Item::Target(target) => target.on_resolved(self),
                Item::Config(_) | Item::Toolchain(_) => Ok(()),
            };
            if let Some(record) = self.records.get_mut(&label) {
                record.item = Some(item);
                record.resolved = result.is_ok();
            }
            result?;
            tracing::debug!(label = %label, "resolved item");

            let waiters = self
                .records
                .get_mut(&label)
                .map(|record| std::mem::take(&mut record.waiters))
                .unwrap_or_default();
            for waiter in waiters {
                if let Some(record) = self.records.get_mut(&waiter) {
                    record.waiting_on.swap_remove(&label);
                    if record.waiting_on.is_empty() && record.item.is_some() && !record.resolved {
                        queue.push_back(waiter);
                    }
                }
            }
        }
        Ok(())
    }

    /// Report everything that could not resolve: placeholders never
    /// filled, and dependency cycles among defined targets. Call after
    /// all producers have finished.
    #[must_use]
    pub fn check_for_bad_items(&self) -> Vec<GenError> {
        let mut errors = Vec::new();
        for (label, record) in &self.records {
            if record.item.is_none() {
                let (referenced_by, location) = record
                    .first_referenced_by
                    .clone()
                    .unwrap_or_else(|| (label.clone(), Location::default()));
                errors.push(GenError::UnresolvedLabel {
                    label: label.clone(),
                    referenced_by,
                    location,
                });
            }
        }
        errors.extend(cycle::find_cycles(self));
        errors
    }

    #[must_use]
    pub fn item(&self, label: &Label) -> Option<&Item> {
        self.records.get(label).and_then(|record| record.item.as_ref())
    }

    #[must_use]
    pub fn is_resolved(&self, label: &Label) -> bool {
        self.records.get(label).is_some_and(|record| record.resolved)
    }

    /// All resolved targets, in definition order.
    pub fn resolved_targets(&self) -> impl Iterator<Item = &Target> {
        self.records
            .values()
            .filter(|record| record.resolved)
            .filter_map(|record| record.item.as_ref().and_then(Item::as_target))
    }

    /// All resolved toolchains, in definition order.
    pub fn resolved_toolchains(&self) -> impl Iterator<Item = &Toolchain> {
        self.records
            .values()
            .filter(|record| record.resolved)
            .filter_map(|record| record.item.as_ref().and_then(Item::as_toolchain))
    }
}

impl GraphView for Builder {
    fn target(&self, label: &Label) -> Option<&Target> {
        let record = self.records.get(label)?;
        if !record.resolved {
            return None;
        }
        record.item.as_ref().and_then(Item::as_target)
    }

    fn config(&self, label: &Label) -> Option<&Config> {
        let record = self.records.get(label)?;
        if !record.resolved {
            return None;
        }
        record.item.as_ref().and_then(Item::as_config)
    }

    fn toolchain(&self, label: &Label) -> Option<&Toolchain> {
        let record = self.records.get(label)?;
        if !record.resolved {
            return None;
        }
        record.item.as_ref().and_then(Item::as_toolchain)
    }
}

/// Every label an item waits on before it can resolve.
fn referenced_labels(item: &Item) -> Vec<Label> {
    let mut refs = Vec::new();
    if let Item::Target(target) = item {
        refs.extend(target.deps.iter().cloned());
        refs.extend(target.datadeps.iter().cloned());
        refs.extend(target.configs.iter().cloned());
        refs.extend(target.all_dependent_configs.iter().cloned());
        refs.extend(target.direct_dependent_configs.iter().cloned());
        refs.extend(target.forward_dependent_configs.iter().cloned());
        refs.extend(target.label().toolchain_label());
    }
    refs
}
