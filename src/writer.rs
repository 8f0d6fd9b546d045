use crate::error::{ConvertError, Result};
use crate::project::Record;
use crate::schema::Schema;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const METADATA_FILE: &str = "StructureDataset-metadata.json";

static GLOTTOCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]{4}[0-9]{4}$").unwrap());
static ISO639P3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]{3}$").unwrap());

/// Summary of one written table.
#[derive(Debug, Clone)]
pub struct TableArtifact {
    pub component: String,
    pub path: PathBuf,
    pub rows: u64,
    pub sha256: String,
}

struct TableWriter {
    columns: Vec<String>,
    writer: csv::Writer<File>,
    validator: JSONSchema,
    path: PathBuf,
    rows: u64,
}

/// Writes validated records to per-table CSV files as they arrive, so even
/// the streamed line table never accumulates in memory. `finish` seals the
/// run: flushes every table, emits the dataset description document, and
/// reports per-table digests. Nothing is finalized on the error path.
pub struct DatasetWriter {
    schema: Schema,
    out_dir: PathBuf,
    tables: HashMap<String, TableWriter>,
}

fn record_validator(columns: &[String], required: &[String]) -> Result<JSONSchema> {
    let properties: serde_json::Map<String, serde_json::Value> = columns
        .iter()
        .map(|name| {
            let spec = if required.contains(name) {
                json!({"type": "string", "minLength": 1})
            } else {
                json!({"type": "string"})
            };
            (name.clone(), spec)
        })
        .collect();
    let schema_json = json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    });
    // The compiled validator borrows the schema document for the lifetime
    // of the run.
    let schema_static: &'static serde_json::Value = Box::leak(Box::new(schema_json));
    JSONSchema::options()
        .compile(schema_static)
        .map_err(|e| ConvertError::Schema(format!("invalid record schema: {}", e)))
}

impl DatasetWriter {
    pub fn create(schema: Schema, out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        let mut tables = HashMap::new();
        for table in schema.tables() {
            let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
            let required: Vec<String> = table
                .columns
                .iter()
                .filter(|c| c.required)
                .map(|c| c.name.clone())
                .collect();
            let path = out_dir.join(&table.url);
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(&columns)?;
            let validator = record_validator(&columns, &required)?;
            tables.insert(
                table.component.clone(),
                TableWriter {
                    columns,
                    writer,
                    validator,
                    path,
                    rows: 0,
                },
            );
        }
        debug!("Opened {} table writers in {}", tables.len(), out_dir.display());
        Ok(Self {
            schema,
            out_dir: out_dir.to_path_buf(),
            tables,
        })
    }

    /// Validate a record against the declared table shape and append it.
    /// Undeclared keys and missing or empty required columns are fatal.
    pub fn append(&mut self, component: &str, record: &Record) -> Result<()> {
        let table = self.tables.get_mut(component).ok_or_else(|| {
            ConvertError::Schema(format!("table '{}' is not declared", component))
        })?;

        let instance: serde_json::Map<String, serde_json::Value> = table
            .columns
            .iter()
            .filter_map(|c| {
                record
                    .get(c)
                    .map(|v| (c.clone(), serde_json::Value::String(v.to_string())))
            })
            .collect();
        let instance = serde_json::Value::Object(instance);
        // Keys outside the declared column set never reach the instance
        // above, so check them separately.
        for key in record.keys() {
            if !table.columns.iter().any(|c| c.as_str() == key) {
                return Err(ConvertError::Schema(format!(
                    "record for {} carries undeclared column '{}'",
                    component, key
                )));
            }
        }
        if let Err(errors) = table.validator.validate(&instance) {
            let detail: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(ConvertError::Schema(format!(
                "record {} for {} violates the declared schema: {}",
                record.get("ID").unwrap_or("<no ID>"),
                component,
                detail.join("; ")
            )));
        }

        if component == "LanguageTable" {
            warn_on_malformed_codes(record);
        }

        let fields: Vec<&str> = table
            .columns
            .iter()
            .map(|c| record.get(c).unwrap_or(""))
            .collect();
        table.writer.write_record(&fields)?;
        table.rows += 1;
        Ok(())
    }

    /// Flush all tables, write the dataset description, and report what was
    /// written. Consumes the writer: a run either reaches this point with
    /// every table complete or leaves nothing finalized.
    pub fn finish(mut self) -> Result<Vec<TableArtifact>> {
        let mut artifacts = Vec::new();
        for table in self.schema.tables() {
            let mut tw = self
                .tables
                .remove(&table.component)
                .expect("writer opened for every declared table");
            tw.writer.flush()?;
            drop(tw.writer);
            let sha256 = file_sha256(&tw.path)?;
            info!(
                "Wrote {} rows to {} (sha256 {})",
                tw.rows,
                tw.path.display(),
                &sha256[..12]
            );
            artifacts.push(TableArtifact {
                component: table.component.clone(),
                path: tw.path,
                rows: tw.rows,
                sha256,
            });
        }

        // The description document is written last; its presence marks a
        // completed run.
        let metadata_path = self.out_dir.join(METADATA_FILE);
        let metadata = serde_json::to_string_pretty(&self.schema.to_metadata())?;
        fs::write(&metadata_path, format!("{}\n", metadata))?;
        Ok(artifacts)
    }
}

/// Malformed external identifiers are reported but passed through; the
/// pipeline never repairs source values.
fn warn_on_malformed_codes(record: &Record) {
    if let Some(code) = record.get("Glottocode") {
        if !code.is_empty() && !GLOTTOCODE_RE.is_match(code) {
            warn!("Glottocode '{}' does not look like a glottocode", code);
        }
    }
    if let Some(code) = record.get("ISO639P3code") {
        if !code.is_empty() && !ISO639P3_RE.is_match(code) {
            warn!("ISO639P3code '{}' does not look like an ISO 639-3 code", code);
        }
    }
}

fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
