//! Required-action derivation.
//!
//! Walks the source model, consults the action table, and produces the
//! deduplicated set of actions the configuration needs to be applied.

use std::collections::BTreeSet;

use super::table::ActionTable;
use crate::terraform::SourceModel;

/// Derives the set of IAM actions required to apply the modeled
/// configuration.
///
/// Resource types contribute their read and write actions; data-source
/// types contribute read actions only. Types without a table entry
/// contribute nothing (they are reported separately as unmapped). The
/// result is a set: an action contributed by several blocks or types
/// appears once, and the derivation is independent of iteration order.
pub fn derive_required_actions(model: &SourceModel, table: &ActionTable) -> BTreeSet<String> {
    let mut actions = BTreeSet::new();

    for type_name in model.resources.keys() {
        let Some(mapping) = table.get(type_name) else {
            log::debug!("No mapping entry for resource type {}", type_name);
            continue;
        };

        for action in mapping.read.iter().chain(mapping.write.iter()) {
            actions.insert(action.clone());
        }
    }

    // Data sources are only ever read; their write actions, if the table
    // defines any, are not required.
    for type_name in model.data_sources.keys() {
        let Some(mapping) = table.get(type_name) else {
            log::debug!("No mapping entry for data-source type {}", type_name);
            continue;
        };

        for action in &mapping.read {
            actions.insert(action.clone());
        }
    }

    log::debug!(
        "Derived {} required actions from {} blocks",
        actions.len(),
        model.block_count()
    );

    actions
}
