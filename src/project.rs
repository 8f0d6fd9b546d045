use crate::error::{ConvertError, Result};
use crate::loader::Row;
use std::collections::HashMap;

/// One fully-resolved output record. Only carries the keys set during
/// projection; the writer serializes it against the declared column order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    /// Fetch an inherited attribute from a resolved parent record. Parents
    /// are fully constructed before any child probes them, so absence means
    /// the projection for the parent table is wrong.
    pub fn require(&self, table: &str, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| ConvertError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

/// Build the output record for `table`: identifier and reference fields are
/// set explicitly from source/ancestor data, declared pass-through columns
/// are copied verbatim from the source row. A pass-through column absent
/// from the source row means the export and the declared schema have
/// drifted apart, which is fatal.
pub fn project_record(
    table: &str,
    explicit: Vec<(&str, String)>,
    source: &Row,
    passthrough: &[&str],
) -> Result<Record> {
    let mut record = Record::new();
    for (name, value) in explicit {
        record.set(name, value);
    }
    for column in passthrough {
        let value = source.get(column).ok_or_else(|| ConvertError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })?;
        record.set(*column, value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_rows;
    use std::io::Write;

    fn source_row(header: &str, data: &str) -> Row {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{}", header).unwrap();
        writeln!(f, "{}", data).unwrap();
        drop(f);
        read_rows(&path).unwrap().remove(0)
    }

    #[test]
    fn explicit_and_passthrough_fields_are_combined() {
        let row = source_row("id,text,footnote", "V1,hello,fn1");
        let record = project_record(
            "ValueTable",
            vec![("ID", "V1".into()), ("Corpus_ID", "C1".into())],
            &row,
            &["text", "footnote"],
        )
        .unwrap();
        assert_eq!(record.get("ID"), Some("V1"));
        assert_eq!(record.get("Corpus_ID"), Some("C1"));
        assert_eq!(record.get("text"), Some("hello"));
        assert_eq!(record.get("footnote"), Some("fn1"));
        assert_eq!(record.keys().count(), 4);
    }

    #[test]
    fn missing_passthrough_column_fails_loudly() {
        let row = source_row("id,text", "V1,hello");
        let err = project_record("ValueTable", vec![("ID", "V1".into())], &row, &["glossing"])
            .unwrap_err();
        match err {
            ConvertError::MissingColumn { table, column } => {
                assert_eq!(table, "ValueTable");
                assert_eq!(column, "glossing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
