use crate::error::{ConvertError, Result};
use crate::project::Record;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Identifier index over a fully-constructed parent table.
///
/// Children are resolved against the complete table, never a partial one,
/// so the index is built exactly once per stage and probed in O(1). If two
/// rows share a key (the exports guarantee they do not), the first row in
/// load order wins.
pub struct TableIndex {
    table: String,
    key_column: String,
    rows: Vec<Record>,
    by_key: HashMap<String, usize>,
}

impl TableIndex {
    pub fn build(table: impl Into<String>, key_column: &str, rows: Vec<Record>) -> Result<Self> {
        let table = table.into();
        let mut by_key = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let key = row.require(&table, key_column)?;
            if let Entry::Vacant(slot) = by_key.entry(key.to_string()) {
                slot.insert(idx);
            }
        }
        debug!("Indexed {} rows of {} by {}", rows.len(), table, key_column);
        Ok(Self {
            table,
            key_column: key_column.to_string(),
            rows,
            by_key,
        })
    }

    /// Find the unique parent row for a foreign-key value. A miss is fatal:
    /// every downstream record inherits attributes from exactly one parent,
    /// so continuing would emit a half-linked table.
    pub fn resolve(&self, key: &str) -> Result<&Record> {
        self.by_key
            .get(key)
            .map(|idx| &self.rows[*idx])
            .ok_or_else(|| ConvertError::UnresolvedReference {
                table: self.table.clone(),
                column: self.key_column.clone(),
                key: key.to_string(),
            })
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.set(*k, *v);
        }
        r
    }

    #[test]
    fn resolves_by_identifier() {
        let rows = vec![
            record(&[("ID", "C1"), ("Language_ID", "L1")]),
            record(&[("ID", "C2"), ("Language_ID", "L2")]),
        ];
        let index = TableIndex::build("ContributionTable", "ID", rows).unwrap();
        let parent = index.resolve("C2").unwrap();
        assert_eq!(parent.get("Language_ID"), Some("L2"));
    }

    #[test]
    fn unresolved_reference_is_a_hard_error() {
        let rows = vec![record(&[("ID", "C1")])];
        let index = TableIndex::build("ContributionTable", "ID", rows).unwrap();
        let err = index.resolve("C9").unwrap_err();
        match err {
            ConvertError::UnresolvedReference { table, column, key } => {
                assert_eq!(table, "ContributionTable");
                assert_eq!(column, "ID");
                assert_eq!(key, "C9");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn duplicate_keys_resolve_to_first_in_load_order() {
        let rows = vec![
            record(&[("ID", "C1"), ("Name", "first")]),
            record(&[("ID", "C1"), ("Name", "second")]),
        ];
        let index = TableIndex::build("ContributionTable", "ID", rows).unwrap();
        assert_eq!(index.resolve("C1").unwrap().get("Name"), Some("first"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn rows_missing_the_key_column_are_rejected() {
        let rows = vec![record(&[("Name", "nameless")])];
        assert!(TableIndex::build("ContributionTable", "ID", rows).is_err());
    }
}
