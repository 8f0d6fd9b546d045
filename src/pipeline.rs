use crate::constants::DATABASE_DIR;
use crate::error::Result;
use crate::schema::Schema;
use crate::types::{ConvertStats, CorpusDataset};
use crate::writer::{DatasetWriter, TableArtifact};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use uuid::Uuid;

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub dataset_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub stats: ConvertStats,
    #[serde(skip)]
    pub artifacts: Vec<TableArtifact>,
    pub output_dir: PathBuf,
}

pub struct Pipeline;

impl Pipeline {
    /// Run the complete conversion pipeline for one dataset.
    ///
    /// Strictly sequential: the schema is declared in full before the first
    /// row, and each table stage completes before the next starts, since
    /// children resolve against fully-populated parent tables. Any error
    /// aborts the run before the output is finalized.
    #[instrument(skip(dataset), fields(dataset_id = %dataset.dataset_id()))]
    pub fn run_for_dataset(
        dataset: &dyn CorpusDataset,
        raw_root: &Path,
        output_root: &Path,
    ) -> Result<PipelineResult> {
        let dataset_id = dataset.dataset_id().to_string();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("🚀 Starting conversion run {} for {}", run_id, dataset_id);
        println!("🚀 Converting {}...", dataset_id);
        counter!("cldf_pipeline_runs_total", "dataset" => dataset_id.clone()).increment(1);
        let t_pipeline = std::time::Instant::now();

        // Step 1: declare the schema before any row is emitted
        let mut schema = Schema::structure_dataset();
        dataset.build_schema(&mut schema)?;
        info!(
            "📐 Declared {} tables and {} foreign keys",
            schema.tables().len(),
            schema.foreign_keys().len()
        );

        // Step 2: open the output writer
        let output_dir = output_root.join(&dataset_id).join("cldf");
        let mut writer = DatasetWriter::create(schema, &output_dir)?;

        // Step 3: run the table stages in load order
        let database_dir = raw_root.join(dataset.raw_dir_name()).join(DATABASE_DIR);
        println!("🔧 Reading exports from {}...", database_dir.display());
        let t_convert = std::time::Instant::now();
        let stats = dataset.convert(&database_dir, &mut writer)?;
        histogram!("cldf_convert_duration_seconds", "dataset" => dataset_id.clone())
            .record(t_convert.elapsed().as_secs_f64());
        counter!("cldf_rows_written_total", "dataset" => dataset_id.clone())
            .increment(stats.total() as u64);

        // Step 4: finalize tables and metadata
        let artifacts = writer.finish()?;
        let duration_secs = t_pipeline.elapsed().as_secs_f64();
        histogram!("cldf_pipeline_duration_seconds", "dataset" => dataset_id.clone())
            .record(duration_secs);
        info!(
            "✅ Converted {} rows across {} tables in {:.2}s",
            stats.total(),
            artifacts.len(),
            duration_secs
        );
        println!("✅ Converted {} rows across {} tables", stats.total(), artifacts.len());

        Ok(PipelineResult {
            run_id,
            dataset_id,
            started_at,
            duration_secs,
            stats,
            artifacts,
            output_dir,
        })
    }
}
