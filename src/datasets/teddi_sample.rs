use crate::constants::{DATABASE_DIR, FILE_CSV, LINE_CSV, TEDDI_SAMPLE_DATASET};
use crate::datasets::{
    load_contributions, load_languages, run_command, source_field,
    CONTRIBUTION_TABLE_PROPERTIES, LANGUAGE_TABLE_PROPERTIES,
};
use crate::error::Result;
use crate::loader::{read_rows, stream_rows};
use crate::project::{project_record, Record};
use crate::resolver::TableIndex;
use crate::schema::{terms, ColumnSpec, Schema};
use crate::types::{ConvertStats, CorpusDataset};
use crate::writer::DatasetWriter;
use std::path::Path;
use tracing::{info, instrument};

/// Database columns carried through to the example (line) table.
const EXAMPLE_TABLE_PROPERTIES: [&str; 7] = [
    "text_raw",
    "label",
    "translation",
    "segmentation",
    "phonological",
    "morphomic",
    "footnote",
];

/// Database columns carried through to the value (file) table.
const VALUE_TABLE_PROPERTIES: [&str; 16] = [
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

/// The TeDDi sample: one value row per file, with every transcribed line
/// emitted as an annotated example referencing its file.
pub struct TeddiSample;

impl Default for TeddiSample {
    fn default() -> Self {
        Self::new()
    }
}

impl TeddiSample {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CorpusDataset for TeddiSample {
    fn dataset_id(&self) -> &'static str {
        TEDDI_SAMPLE_DATASET
    }

    fn build_schema(&self, schema: &mut Schema) -> Result<()> {
        // examples.csv
        schema.add_component("ExampleTable")?;
        schema.remove_columns("ExampleTable", &["Analyzed_Word", "Meta_Language_ID"])?;
        let mut example_columns = vec![
            ColumnSpec::string("File_ID").required(),
            corpus_reference(),
        ];
        example_columns.extend(EXAMPLE_TABLE_PROPERTIES.iter().copied().map(ColumnSpec::string));
        schema.add_columns("ExampleTable", example_columns)?;

        // values.csv
        schema.remove_columns("ValueTable", &["Code_ID", "Source"])?;
        let mut value_columns = vec![corpus_reference()];
        value_columns.extend(VALUE_TABLE_PROPERTIES.iter().copied().map(ColumnSpec::string));
        schema.add_columns("ValueTable", value_columns)?;

        schema.add_component("ParameterTable")?;

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

        schema.add_foreign_key("ExampleTable", "File_ID", "ValueTable", "ID")?;
        schema.add_foreign_key("ExampleTable", "Corpus_ID", "ContributionTable", "ID")?;
        schema.add_foreign_key("ExampleTable", "Language_ID", "LanguageTable", "ID")?;
        schema.add_foreign_key("ValueTable", "Corpus_ID", "ContributionTable", "ID")?;
        schema.add_foreign_key("ContributionTable", "Language_ID", "LanguageTable", "ID")?;
        Ok(())
    }

    async fn download(&self, raw_root: &Path) -> Result<()> {
        run_command(raw_root, "git", &["submodule", "update", "--remote"]).await?;
        let database_dir = raw_root.join(self.raw_dir_name()).join(DATABASE_DIR);
        run_command(&database_dir, "python", &["load-database.py"]).await?;
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

        // Stage 3: files. Each file becomes one value row plus a bare
        // parameter row sharing its identifier.
        let mut values = Vec::new();
        for row in read_rows(&database_dir.join(FILE_CSV))? {
            let file_id = source_field("ValueTable", &row, "id")?;
            let corpus_id = source_field("ValueTable", &row, "corpus_id")?;
            let corpus = contributions.resolve(&corpus_id)?;
            let language_id = corpus.require("ContributionTable", "Language_ID")?.to_string();
            let record = project_record(
                "ValueTable",
                vec![
                    ("ID", file_id.clone()),
                    ("Value", source_field("ValueTable", &row, "filename")?),
                    ("Corpus_ID", corpus_id),
                    ("Language_ID", language_id),
                    ("Parameter_ID", file_id.clone()),
                ],
                &row,
                &VALUE_TABLE_PROPERTIES,
            )?;
            writer.append("ValueTable", &record)?;
            values.push(record);

            let mut parameter = Record::new();
            parameter.set("ID", file_id);
            writer.append("ParameterTable", &parameter)?;
            stats.parameters += 1;
        }
        info!("Loaded {} files", values.len());
        let values = TableIndex::build("ValueTable", "ID", values)?;
        stats.values = values.len();

        // Stage 4: lines. The line table is too large to materialize, so it
        // is streamed one row at a time against the value index.
        for row in stream_rows(&database_dir.join(LINE_CSV))? {
            let row = row?;
            let file_id = source_field("ExampleTable", &row, "file_id")?;
            let file = values.resolve(&file_id)?;
            let corpus_id = file.require("ValueTable", "Corpus_ID")?.to_string();
            let language_id = file.require("ValueTable", "Language_ID")?.to_string();
            let record = project_record(
                "ExampleTable",
                vec![
                    ("ID", source_field("ExampleTable", &row, "id")?),
                    ("Primary_Text", source_field("ExampleTable", &row, "text")?),
                    ("Gloss", source_field("ExampleTable", &row, "glossing")?),
                    ("File_ID", file_id),
                    ("Corpus_ID", corpus_id),
                    ("Language_ID", language_id),
                    ("Comment", source_field("ExampleTable", &row, "comment")?),
                ],
                &row,
                &EXAMPLE_TABLE_PROPERTIES,
            )?;
            writer.append("ExampleTable", &record)?;
            stats.examples += 1;
        }
        info!("Streamed {} lines", stats.examples);

        Ok(stats)
    }
}
