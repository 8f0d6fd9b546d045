use crate::constants::{CORPUS_CSV, LANGUAGE_CSV};
use crate::error::{ConvertError, Result};
use crate::loader::{read_rows, Row};
use crate::project::project_record;
use crate::resolver::TableIndex;
use crate::writer::DatasetWriter;
use std::path::Path;
use tracing::{debug, info};

pub mod hundred_lc;
pub mod teddi_sample;

pub use hundred_lc::HundredLc;
pub use teddi_sample::TeddiSample;

/// Database columns carried through to the language table by both datasets.
pub(crate) const LANGUAGE_TABLE_PROPERTIES: [&str; 13] = [
    "wals_code",
    "name_glotto",
    "name_wals",
    "level",
    "status",
    "family_id",
    "top_level_family",
    "genus_wals",
    "family_wals",
    "macroarea_wals",
    "latitude_wals",
    "longitude_wals",
    "folder_language_name",
];

/// Database columns carried through to the contribution table.
pub(crate) const CONTRIBUTION_TABLE_PROPERTIES: [&str; 2] = ["genre_broad", "mode"];

/// Fetch a column the projection depends on; absence is source/schema drift.
pub(crate) fn source_field(table: &str, row: &Row, column: &str) -> Result<String> {
    row.get(column)
        .map(|v| v.to_string())
        .ok_or_else(|| ConvertError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

/// Stage 1: languages. The root of the reference chain; loaded first so
/// every later stage can validate its language references.
pub(crate) fn load_languages(
    database_dir: &Path,
    writer: &mut DatasetWriter,
) -> Result<TableIndex> {
    let mut records = Vec::new();
    for row in read_rows(&database_dir.join(LANGUAGE_CSV))? {
        let record = project_record(
            "LanguageTable",
            vec![
                ("ID", source_field("LanguageTable", &row, "id")?),
                ("Name", source_field("LanguageTable", &row, "name")?),
                ("Glottocode", source_field("LanguageTable", &row, "glottocode")?),
                ("ISO639P3code", source_field("LanguageTable", &row, "iso639_3")?),
                ("Macroarea", source_field("LanguageTable", &row, "macroarea_glotto")?),
                ("Latitude", source_field("LanguageTable", &row, "latitude_glotto")?),
                ("Longitude", source_field("LanguageTable", &row, "longitude_glotto")?),
            ],
            &row,
            &LANGUAGE_TABLE_PROPERTIES,
        )?;
        writer.append("LanguageTable", &record)?;
        records.push(record);
    }
    info!("Loaded {} languages", records.len());
    TableIndex::build("LanguageTable", "ID", records)
}

/// Stage 2: contributions. `language_id` is validated against the language
/// index so a dangling reference aborts here instead of surfacing later.
pub(crate) fn load_contributions(
    database_dir: &Path,
    writer: &mut DatasetWriter,
    languages: &TableIndex,
) -> Result<TableIndex> {
    let mut records = Vec::new();
    for row in read_rows(&database_dir.join(CORPUS_CSV))? {
        let language_id = source_field("ContributionTable", &row, "language_id")?;
        languages.resolve(&language_id)?;
        let record = project_record(
            "ContributionTable",
            vec![
                ("ID", source_field("ContributionTable", &row, "id")?),
                ("Name", source_field("ContributionTable", &row, "name")?),
                ("Language_ID", language_id),
            ],
            &row,
            &CONTRIBUTION_TABLE_PROPERTIES,
        )?;
        writer.append("ContributionTable", &record)?;
        records.push(record);
    }
    info!("Loaded {} contributions", records.len());
    TableIndex::build("ContributionTable", "ID", records)
}

/// Run one bootstrap command, failing on a non-zero exit status.
pub(crate) async fn run_command(dir: &Path, program: &str, args: &[&str]) -> Result<()> {
    debug!("Running {} {} in {}", program, args.join(" "), dir.display());
    let status = tokio::process::Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .await
        .map_err(|e| ConvertError::Download(format!("failed to spawn {}: {}", program, e)))?;
    if !status.success() {
        return Err(ConvertError::Download(format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            status
        )));
    }
    Ok(())
}
