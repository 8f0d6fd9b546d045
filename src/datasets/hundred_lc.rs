use crate::constants::{DATABASE_DIR, FILE_CSV, HUNDRED_LC_DATASET, LINE_CSV};
use crate::datasets::{
    load_contributions, load_languages, run_command, source_field,
    CONTRIBUTION_TABLE_PROPERTIES, LANGUAGE_TABLE_PROPERTIES,
};
use crate::error::Result;
use crate::loader::{read_rows, stream_rows};
use crate::project::project_record;
use crate::resolver::TableIndex;
use crate::schema::{terms, ColumnSpec, Schema};
use crate::types::{ConvertStats, CorpusDataset};
use crate::writer::DatasetWriter;
use std::path::Path;
use tracing::{info, instrument};

/// Database columns carried through to the value (line) table.
const VALUE_TABLE_PROPERTIES: [&str; 9] = [
    "text_raw",
    "label",
    "text",
    "translation",
    "glossing",
    "segmentation",
    "phonological",
    "morphomic",
    "footnote",
];

/// Database columns carried through to the parameter (file) table.
const PARAMETER_TABLE_PROPERTIES: [&str; 16] = [
    "language_name_wals",
    "language_name_glotto",
    "iso639_3",
    "year_composed",
    "year_published",
    "mode",
    "genre_broad",
    "genre_narrow",
    "writing_system",
    "special_characters",
    "short_description",
    "source",
    "copyright_short",
    "copyright_long",
    "sample_type",
    "comments",
];

fn corpus_reference() -> ColumnSpec {
    ColumnSpec::string("Corpus_ID")
        .required()
        .with_property(terms::CONTRIBUTION_REFERENCE)
}

/// The 100 Language Corpora collection: languages, corpora, files, and
/// transcribed lines, one value row per line.
pub struct HundredLc;

impl Default for HundredLc {
    fn default() -> Self {
        Self::new()
    }
}

impl HundredLc {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CorpusDataset for HundredLc {
    fn dataset_id(&self) -> &'static str {
        HUNDRED_LC_DATASET
    }

    fn build_schema(&self, schema: &mut Schema) -> Result<()> {
        // values.csv
        schema.remove_columns("ValueTable", &["Code_ID", "Source"])?;
        let mut value_columns = vec![corpus_reference()];
        value_columns.extend(VALUE_TABLE_PROPERTIES.iter().copied().map(ColumnSpec::string));
        schema.add_columns("ValueTable", value_columns)?;

        // parameters.csv
        schema.add_component("ParameterTable")?;
        schema.remove_columns("ParameterTable", &["Description"])?;
        let mut parameter_columns = vec![
            corpus_reference(),
            ColumnSpec::string("Language_ID")
                .required()
                .with_property(terms::LANGUAGE_REFERENCE),
        ];
        parameter_columns.extend(PARAMETER_TABLE_PROPERTIES.iter().copied().map(ColumnSpec::string));
        schema.add_columns("ParameterTable", parameter_columns)?;

        // contributions.csv
        schema.add_component("ContributionTable")?;
        schema.remove_columns("ContributionTable", &["Description", "Contributor", "Citation"])?;
        let mut contribution_columns = vec![ColumnSpec::string("Language_ID")
            .with_property(terms::LANGUAGE_REFERENCE)];
        contribution_columns.extend(CONTRIBUTION_TABLE_PROPERTIES.iter().copied().map(ColumnSpec::string));
        schema.add_columns("ContributionTable", contribution_columns)?;

        // languages.csv
        schema.add_component("LanguageTable")?;
        schema.add_columns(
            "LanguageTable",
            LANGUAGE_TABLE_PROPERTIES.iter().copied().map(ColumnSpec::string).collect(),
        )?;

        schema.add_foreign_key("ValueTable", "Corpus_ID", "ContributionTable", "ID")?;
        schema.add_foreign_key("ParameterTable", "Corpus_ID", "ContributionTable", "ID")?;
        schema.add_foreign_key("ContributionTable", "Language_ID", "LanguageTable", "ID")?;
        Ok(())
    }

    async fn download(&self, raw_root: &Path) -> Result<()> {
        run_command(raw_root, "git", &["submodule", "update", "--remote"]).await?;
        let database_dir = raw_root.join(self.raw_dir_name()).join(DATABASE_DIR);
        run_command(&database_dir, "python", &["load-database.py", "-f"]).await?;
        run_command(&database_dir, "Rscript", &["sqlite_to_RData.R"]).await?;
        run_command(&database_dir, "Rscript", &["to_csv.R"]).await?;
        Ok(())
    }

    #[instrument(skip(self, writer))]
    fn convert(&self, database_dir: &Path, writer: &mut DatasetWriter) -> Result<ConvertStats> {
        let mut stats = ConvertStats::default();

        let languages = load_languages(database_dir, writer)?;
        stats.languages = languages.len();

        let contributions = load_contributions(database_dir, writer, &languages)?;
        stats.contributions = contributions.len();

        // Stage 3: files. Each file inherits its language through the corpus
        // it belongs to.
        let mut parameters = Vec::new();
        for row in read_rows(&database_dir.join(FILE_CSV))? {
            let corpus_id = source_field("ParameterTable", &row, "corpus_id")?;
            let corpus = contributions.resolve(&corpus_id)?;
            let language_id = corpus.require("ContributionTable", "Language_ID")?.to_string();
            let record = project_record(
                "ParameterTable",
                vec![
                    ("ID", source_field("ParameterTable", &row, "id")?),
                    ("Name", source_field("ParameterTable", &row, "filename")?),
                    ("Corpus_ID", corpus_id),
                    ("Language_ID", language_id),
                ],
                &row,
                &PARAMETER_TABLE_PROPERTIES,
            )?;
            writer.append("ParameterTable", &record)?;
            parameters.push(record);
        }
        info!("Loaded {} files", parameters.len());
        let parameters = TableIndex::build("ParameterTable", "ID", parameters)?;
        stats.parameters = parameters.len();

        // Stage 4: lines. The line table is too large to materialize, so it
        // is streamed one row at a time against the file index.
        for row in stream_rows(&database_dir.join(LINE_CSV))? {
            let row = row?;
            let file_id = source_field("ValueTable", &row, "file_id")?;
            let file = parameters.resolve(&file_id)?;
            let corpus_id = file.require("ParameterTable", "Corpus_ID")?.to_string();
            let language_id = file.require("ParameterTable", "Language_ID")?.to_string();
            let record = project_record(
                "ValueTable",
                vec![
                    ("ID", source_field("ValueTable", &row, "id")?),
                    ("Value", source_field("ValueTable", &row, "text")?),
                    ("Parameter_ID", file_id),
                    ("Corpus_ID", corpus_id),
                    ("Language_ID", language_id),
                    ("Comment", source_field("ValueTable", &row, "comment")?),
                ],
                &row,
                &VALUE_TABLE_PROPERTIES,
            )?;
            writer.append("ValueTable", &record)?;
            stats.values += 1;
        }
        info!("Streamed {} lines", stats.values);

        Ok(stats)
    }
}
