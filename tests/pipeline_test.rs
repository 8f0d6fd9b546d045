use anyhow::Result;
use corpus_cldf::constants::DATABASE_DIR;
use corpus_cldf::datasets::{HundredLc, TeddiSample};
use corpus_cldf::error::ConvertError;
use corpus_cldf::pipeline::Pipeline;
use corpus_cldf::writer::METADATA_FILE;
use std::collections::HashMap;
use std::path::Path;
use tempfile::tempdir;

fn write_csv(path: &Path, headers: &[&str], rows: &[Vec<&str>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn language_headers() -> Vec<&'static str> {
    vec![
        "id",
        "name",
        "glottocode",
        "iso639_3",
        "macroarea_glotto",
        "latitude_glotto",
        "longitude_glotto",
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
    ]
}

fn language_row() -> Vec<&'static str> {
    vec![
        "L1",
        "Test Lang",
        "test1234",
        "tst",
        "Eurasia",
        "47.0",
        "8.0",
        "tl",
        "Test Glotto",
        "Test WALS",
        "language",
        "living",
        "fam1",
        "Testic",
        "Test Genus",
        "Test Family",
        "Eurasia",
        "47.1",
        "8.1",
        "test_lang",
    ]
}

fn file_properties() -> Vec<&'static str> {
    vec![
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
    ]
}

fn file_property_values() -> Vec<&'static str> {
    vec![
        "Test WALS",
        "Test Glotto",
        "tst",
        "1900",
        "1901",
        "written",
        "fiction",
        "novel",
        "Latin",
        "",
        "a test file",
        "test source",
        "CC",
        "Creative Commons",
        "full",
        "",
    ]
}

/// Miniature 100LC export: one language, one corpus, one file, one line.
fn write_hundred_lc_fixture(raw_root: &Path, include_corpus: bool) -> Result<()> {
    let database_dir = raw_root.join("100LC").join(DATABASE_DIR);
    std::fs::create_dir_all(&database_dir)?;

    write_csv(
        &database_dir.join("language.csv"),
        &language_headers(),
        &[language_row()],
    )?;

    let corpus_rows: Vec<Vec<&str>> = if include_corpus {
        vec![vec!["C1", "Test Corpus", "L1", "fiction", "written"]]
    } else {
        Vec::new()
    };
    write_csv(
        &database_dir.join("corpus.csv"),
        &["id", "name", "language_id", "genre_broad", "mode"],
        &corpus_rows,
    )?;

    let mut file_headers = vec!["id", "filename", "corpus_id"];
    file_headers.extend(file_properties());
    let mut file_row = vec!["P1", "test.txt", "C1"];
    file_row.extend(file_property_values());
    write_csv(&database_dir.join("file.csv"), &file_headers, &[file_row])?;

    write_csv(
        &database_dir.join("line.csv"),
        &[
            "id",
            "file_id",
            "text",
            "comment",
            "text_raw",
            "label",
            "translation",
            "glossing",
            "segmentation",
            "phonological",
            "morphomic",
            "footnote",
        ],
        &[vec![
            "V1", "P1", "hello", "a comment", "hello raw", "l1", "hallo", "", "", "", "", "",
        ]],
    )?;
    Ok(())
}

/// Miniature TeDDi export with the same entity chain.
fn write_teddi_fixture(raw_root: &Path) -> Result<()> {
    let database_dir = raw_root.join("TeDDi_sample").join(DATABASE_DIR);
    std::fs::create_dir_all(&database_dir)?;

    write_csv(
        &database_dir.join("language.csv"),
        &language_headers(),
        &[language_row()],
    )?;

    write_csv(
        &database_dir.join("corpus.csv"),
        &["id", "name", "language_id", "genre_broad", "mode"],
        &[vec!["C1", "Test Corpus", "L1", "fiction", "written"]],
    )?;

    let mut file_headers = vec!["id", "filename", "corpus_id"];
    file_headers.extend(file_properties());
    let mut file_row = vec!["F1", "test.txt", "C1"];
    file_row.extend(file_property_values());
    write_csv(&database_dir.join("file.csv"), &file_headers, &[file_row])?;

    write_csv(
        &database_dir.join("line.csv"),
        &[
            "id",
            "file_id",
            "text",
            "glossing",
            "comment",
            "text_raw",
            "label",
            "translation",
            "segmentation",
            "phonological",
            "morphomic",
            "footnote",
        ],
        &[vec![
            "E1", "F1", "hello", "INTJ", "a comment", "hello raw", "l1", "hallo", "", "", "", "",
        ]],
    )?;
    Ok(())
}

fn read_table(path: &Path) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

#[test]
fn hundred_lc_conversion_links_all_tables() -> Result<()> {
    let temp = tempdir()?;
    let raw_root = temp.path().join("raw");
    let output_root = temp.path().join("out");
    write_hundred_lc_fixture(&raw_root, true)?;

    let result = Pipeline::run_for_dataset(&HundredLc::new(), &raw_root, &output_root)?;

    assert_eq!(result.stats.languages, 1);
    assert_eq!(result.stats.contributions, 1);
    assert_eq!(result.stats.parameters, 1);
    assert_eq!(result.stats.values, 1);
    assert_eq!(result.stats.examples, 0);

    let cldf_dir = output_root.join("100LC").join("cldf");
    assert!(cldf_dir.join(METADATA_FILE).exists());

    // The emitted value row inherits its corpus and language through the
    // file it belongs to.
    let values = read_table(&cldf_dir.join("values.csv"))?;
    assert_eq!(values.len(), 1);
    assert_eq!(values[0]["ID"], "V1");
    assert_eq!(values[0]["Parameter_ID"], "P1");
    assert_eq!(values[0]["Corpus_ID"], "C1");
    assert_eq!(values[0]["Language_ID"], "L1");
    assert_eq!(values[0]["Value"], "hello");
    assert_eq!(values[0]["text"], "hello");
    assert_eq!(values[0]["Comment"], "a comment");

    // Referential closure across the whole chain.
    let parameters = read_table(&cldf_dir.join("parameters.csv"))?;
    let contributions = read_table(&cldf_dir.join("contributions.csv"))?;
    let languages = read_table(&cldf_dir.join("languages.csv"))?;
    assert_eq!(parameters[0]["Corpus_ID"], contributions[0]["ID"]);
    assert_eq!(parameters[0]["Language_ID"], languages[0]["ID"]);
    assert_eq!(contributions[0]["Language_ID"], languages[0]["ID"]);
    assert_eq!(languages[0]["Name"], "Test Lang");
    Ok(())
}

#[test]
fn dangling_corpus_reference_aborts_the_run() -> Result<()> {
    let temp = tempdir()?;
    let raw_root = temp.path().join("raw");
    let output_root = temp.path().join("out");
    write_hundred_lc_fixture(&raw_root, false)?;

    let err = Pipeline::run_for_dataset(&HundredLc::new(), &raw_root, &output_root)
        .expect_err("run must abort on a dangling reference");
    match err {
        ConvertError::UnresolvedReference { table, key, .. } => {
            assert_eq!(table, "ContributionTable");
            assert_eq!(key, "C1");
        }
        other => panic!("unexpected error: {}", other),
    }

    // Nothing is finalized on the error path.
    let cldf_dir = output_root.join("100LC").join("cldf");
    assert!(!cldf_dir.join(METADATA_FILE).exists());
    Ok(())
}

#[test]
fn rerunning_unchanged_inputs_is_byte_identical() -> Result<()> {
    let temp = tempdir()?;
    let raw_root = temp.path().join("raw");
    write_hundred_lc_fixture(&raw_root, true)?;

    let digests = |output_root: &Path| -> Result<Vec<(String, String)>> {
        let result = Pipeline::run_for_dataset(&HundredLc::new(), &raw_root, output_root)?;
        Ok(result
            .artifacts
            .into_iter()
            .map(|a| (a.component, a.sha256))
            .collect())
    };

    let first = digests(&temp.path().join("out1"))?;
    let second = digests(&temp.path().join("out2"))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn teddi_examples_inherit_corpus_and_language() -> Result<()> {
    let temp = tempdir()?;
    let raw_root = temp.path().join("raw");
    let output_root = temp.path().join("out");
    write_teddi_fixture(&raw_root)?;

    let result = Pipeline::run_for_dataset(&TeddiSample::new(), &raw_root, &output_root)?;

    assert_eq!(result.stats.values, 1);
    assert_eq!(result.stats.parameters, 1);
    assert_eq!(result.stats.examples, 1);

    let cldf_dir = output_root.join("TeDDi_sample").join("cldf");
    let values = read_table(&cldf_dir.join("values.csv"))?;
    assert_eq!(values[0]["ID"], "F1");
    assert_eq!(values[0]["Value"], "test.txt");
    assert_eq!(values[0]["Parameter_ID"], "F1");

    // Each file also registers a bare parameter row under its own ID.
    let parameters = read_table(&cldf_dir.join("parameters.csv"))?;
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["ID"], "F1");

    let examples = read_table(&cldf_dir.join("examples.csv"))?;
    assert_eq!(examples[0]["ID"], "E1");
    assert_eq!(examples[0]["File_ID"], "F1");
    assert_eq!(examples[0]["Corpus_ID"], "C1");
    assert_eq!(examples[0]["Language_ID"], "L1");
    assert_eq!(examples[0]["Primary_Text"], "hello");
    assert_eq!(examples[0]["Gloss"], "INTJ");
    assert_eq!(examples[0]["translation"], "hallo");
    Ok(())
}
