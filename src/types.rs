use crate::error::Result;
use crate::schema::Schema;
use crate::writer::DatasetWriter;
use serde::Serialize;
use std::path::Path;

/// Row counts per output table for one conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvertStats {
    pub languages: usize,
    pub contributions: usize,
    pub parameters: usize,
    pub values: usize,
    pub examples: usize,
}

impl ConvertStats {
    pub fn total(&self) -> usize {
        self.languages + self.contributions + self.parameters + self.values + self.examples
    }
}

/// Core trait that all corpus dataset sources must implement
#[async_trait::async_trait]
pub trait CorpusDataset: Send + Sync {
    /// Unique identifier for this dataset
    fn dataset_id(&self) -> &'static str;

    /// Directory under the raw data root holding this dataset's checkout
    fn raw_dir_name(&self) -> &'static str {
        self.dataset_id()
    }

    /// Declare this dataset's output tables, columns, and foreign keys
    fn build_schema(&self, schema: &mut Schema) -> Result<()>;

    /// Refresh the raw checkout and materialize the CSV exports
    async fn download(&self, raw_root: &Path) -> Result<()>;

    /// Convert the CSV exports into fully-linked output records. Stages run
    /// strictly in load order; each stage sees only completed parent tables.
    fn convert(&self, database_dir: &Path, writer: &mut DatasetWriter) -> Result<ConvertStats>;
}
