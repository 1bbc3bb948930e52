use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The union of per-hand mappings discovered for one table, plus a record
/// of conflicts. An identifier with two disagreeing contributing names is
/// omitted from `accepted` and recorded in `conflicts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableMapping {
    pub table_id: String,
    pub accepted: HashMap<String, String>,
    pub conflicts: HashMap<String, HashSet<String>>,
}

impl TableMapping {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            accepted: HashMap::new(),
            conflicts: HashMap::new(),
        }
    }

    /// Folds one per-hand mapping into the running union. Idempotent and
    /// order-independent: commutative and associative over per-hand
    /// mappings within a table.
    pub fn merge(&mut self, contribution: &HashMap<String, String>) {
        for (identifier, name) in contribution {
            if self.conflicts.contains_key(identifier) {
                self.conflicts
                    .get_mut(identifier)
                    .unwrap()
                    .insert(name.clone());
                continue;
            }
            match self.accepted.get(identifier) {
                None => {
                    self.accepted.insert(identifier.clone(), name.clone());
                }
                Some(existing) if existing == name => {}
                Some(existing) => {
                    let mut names = HashSet::new();
                    names.insert(existing.clone());
                    names.insert(name.clone());
                    self.conflicts.insert(identifier.clone(), names);
                    self.accepted.remove(identifier);
                }
            }
        }
    }
}
