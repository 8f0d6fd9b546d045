use crate::error::{ConvertError, Result};
use serde::Serialize;
use serde_json::json;

/// CLDF ontology terms used as semantic column roles. A column carrying a
/// reference term is a foreign-key column; everything else is descriptive.
pub mod terms {
    pub const STRUCTURE_DATASET: &str = "http://cldf.clld.org/v1.0/terms.rdf#StructureDataset";

    pub const ID: &str = "http://cldf.clld.org/v1.0/terms.rdf#id";
    pub const NAME: &str = "http://cldf.clld.org/v1.0/terms.rdf#name";
    pub const DESCRIPTION: &str = "http://cldf.clld.org/v1.0/terms.rdf#description";
    pub const COMMENT: &str = "http://cldf.clld.org/v1.0/terms.rdf#comment";
    pub const SOURCE: &str = "http://cldf.clld.org/v1.0/terms.rdf#source";
    pub const VALUE: &str = "http://cldf.clld.org/v1.0/terms.rdf#value";

    pub const LANGUAGE_REFERENCE: &str = "http://cldf.clld.org/v1.0/terms.rdf#languageReference";
    pub const PARAMETER_REFERENCE: &str = "http://cldf.clld.org/v1.0/terms.rdf#parameterReference";
    pub const CODE_REFERENCE: &str = "http://cldf.clld.org/v1.0/terms.rdf#codeReference";
    pub const CONTRIBUTION_REFERENCE: &str =
        "http://cldf.clld.org/v1.0/terms.rdf#contributionReference";
    pub const META_LANGUAGE_REFERENCE: &str =
        "http://cldf.clld.org/v1.0/terms.rdf#metaLanguageReference";

    pub const GLOTTOCODE: &str = "http://cldf.clld.org/v1.0/terms.rdf#glottocode";
    pub const ISO639P3: &str = "http://cldf.clld.org/v1.0/terms.rdf#iso639P3code";
    pub const MACROAREA: &str = "http://cldf.clld.org/v1.0/terms.rdf#macroarea";
    pub const LATITUDE: &str = "http://cldf.clld.org/v1.0/terms.rdf#latitude";
    pub const LONGITUDE: &str = "http://cldf.clld.org/v1.0/terms.rdf#longitude";

    pub const CONTRIBUTOR: &str = "http://cldf.clld.org/v1.0/terms.rdf#contributor";
    pub const CITATION: &str = "http://cldf.clld.org/v1.0/terms.rdf#citation";

    pub const PRIMARY_TEXT: &str = "http://cldf.clld.org/v1.0/terms.rdf#primaryText";
    pub const ANALYZED_WORD: &str = "http://cldf.clld.org/v1.0/terms.rdf#analyzedWord";
    pub const GLOSS: &str = "http://cldf.clld.org/v1.0/terms.rdf#gloss";
    pub const TRANSLATED_TEXT: &str = "http://cldf.clld.org/v1.0/terms.rdf#translatedText";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    String,
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Extent {
    Singlevalued,
    Multivalued,
}

/// Declared shape of one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub datatype: Datatype,
    #[serde(rename = "dc:extent")]
    pub extent: Extent,
    pub required: bool,
    #[serde(rename = "propertyUrl", skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
}

impl ColumnSpec {
    /// A bare column name defaults to a generic optional string column.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: Datatype::String,
            extent: Extent::Singlevalued,
            required: false,
            property_url: None,
        }
    }

    pub fn with_datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = datatype;
        self
    }

    pub fn multivalued(mut self) -> Self {
        self.extent = Extent::Multivalued;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_property(mut self, url: &str) -> Self {
        self.property_url = Some(url.to_string());
        self
    }

    /// Whether this column carries a reference role, i.e. is a foreign key.
    pub fn is_reference(&self) -> bool {
        self.property_url
            .as_deref()
            .map(|url| url.ends_with("Reference"))
            .unwrap_or(false)
    }
}

/// Declared shape of one output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Component name, e.g. "ValueTable"
    pub component: String,
    /// Output file name, e.g. "values.csv"
    pub url: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A declared foreign-key edge: (child table, child column) references
/// (parent table, parent column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
}

/// Declarative dataset schema, built incrementally and validated at each
/// mutation. Tables keep declaration order so output is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    module: &'static str,
    tables: Vec<TableSpec>,
    foreign_keys: Vec<ForeignKey>,
}

fn default_component(component: &str) -> Option<TableSpec> {
    use terms::*;
    let (url, columns) = match component {
        "ValueTable" => (
            "values.csv",
            vec![
                ColumnSpec::string("ID").required().with_property(ID),
                ColumnSpec::string("Language_ID")
                    .required()
                    .with_property(LANGUAGE_REFERENCE),
                ColumnSpec::string("Parameter_ID")
                    .required()
                    .with_property(PARAMETER_REFERENCE),
                ColumnSpec::string("Value").with_property(VALUE),
                ColumnSpec::string("Code_ID").with_property(CODE_REFERENCE),
                ColumnSpec::string("Comment").with_property(COMMENT),
                ColumnSpec::string("Source").with_property(SOURCE),
            ],
        ),
        "LanguageTable" => (
            "languages.csv",
            vec![
                ColumnSpec::string("ID").required().with_property(ID),
                ColumnSpec::string("Name").with_property(NAME),
                ColumnSpec::string("Macroarea").with_property(MACROAREA),
                ColumnSpec::string("Latitude")
                    .with_datatype(Datatype::Decimal)
                    .with_property(LATITUDE),
                ColumnSpec::string("Longitude")
                    .with_datatype(Datatype::Decimal)
                    .with_property(LONGITUDE),
                ColumnSpec::string("Glottocode").with_property(GLOTTOCODE),
                ColumnSpec::string("ISO639P3code").with_property(ISO639P3),
            ],
        ),
        "ContributionTable" => (
            "contributions.csv",
            vec![
                ColumnSpec::string("ID").required().with_property(ID),
                ColumnSpec::string("Name").with_property(NAME),
                ColumnSpec::string("Description").with_property(DESCRIPTION),
                ColumnSpec::string("Contributor").with_property(CONTRIBUTOR),
                ColumnSpec::string("Citation").with_property(CITATION),
            ],
        ),
        "ParameterTable" => (
            "parameters.csv",
            vec![
                ColumnSpec::string("ID").required().with_property(ID),
                ColumnSpec::string("Name").with_property(NAME),
                ColumnSpec::string("Description").with_property(DESCRIPTION),
            ],
        ),
        "ExampleTable" => (
            "examples.csv",
            vec![
                ColumnSpec::string("ID").required().with_property(ID),
                ColumnSpec::string("Language_ID")
                    .required()
                    .with_property(LANGUAGE_REFERENCE),
                ColumnSpec::string("Primary_Text").with_property(PRIMARY_TEXT),
                ColumnSpec::string("Analyzed_Word")
                    .multivalued()
                    .with_property(ANALYZED_WORD),
                ColumnSpec::string("Gloss").multivalued().with_property(GLOSS),
                ColumnSpec::string("Translated_Text").with_property(TRANSLATED_TEXT),
                ColumnSpec::string("Meta_Language_ID").with_property(META_LANGUAGE_REFERENCE),
                ColumnSpec::string("Comment").with_property(COMMENT),
            ],
        ),
        _ => return None,
    };
    Some(TableSpec {
        component: component.to_string(),
        url: url.to_string(),
        columns,
    })
}

impl Schema {
    /// A StructureDataset starts out with only the value table; every other
    /// table is an explicitly registered component.
    pub fn structure_dataset() -> Self {
        Self {
            module: "StructureDataset",
            tables: vec![default_component("ValueTable").unwrap()],
            foreign_keys: Vec::new(),
        }
    }

    pub fn module(&self) -> &str {
        self.module
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn table(&self, component: &str) -> Result<&TableSpec> {
        self.tables
            .iter()
            .find(|t| t.component == component)
            .ok_or_else(|| {
                ConvertError::Schema(format!("table '{}' is not declared", component))
            })
    }

    fn table_mut(&mut self, component: &str) -> Result<&mut TableSpec> {
        self.tables
            .iter_mut()
            .find(|t| t.component == component)
            .ok_or_else(|| {
                ConvertError::Schema(format!("table '{}' is not declared", component))
            })
    }

    /// Register a component table with its default column set.
    pub fn add_component(&mut self, component: &str) -> Result<()> {
        if self.tables.iter().any(|t| t.component == component) {
            return Err(ConvertError::Schema(format!(
                "component '{}' is already registered",
                component
            )));
        }
        let table = default_component(component).ok_or_else(|| {
            ConvertError::Schema(format!("unknown component '{}'", component))
        })?;
        self.tables.push(table);
        Ok(())
    }

    /// Remove declared columns from a table. Removing a column the table does
    /// not declare means the schema and the row-building code have drifted
    /// apart, so it is an error rather than a no-op.
    pub fn remove_columns(&mut self, component: &str, names: &[&str]) -> Result<()> {
        let table = self.table_mut(component)?;
        for name in names {
            let idx = table
                .columns
                .iter()
                .position(|c| c.name == *name)
                .ok_or_else(|| {
                    ConvertError::Schema(format!(
                        "cannot remove column '{}' from {}: not declared",
                        name, component
                    ))
                })?;
            table.columns.remove(idx);
        }
        Ok(())
    }

    /// Add columns to a table. Duplicate names are rejected.
    pub fn add_columns(&mut self, component: &str, columns: Vec<ColumnSpec>) -> Result<()> {
        let table = self.table_mut(component)?;
        for column in columns {
            if table.columns.iter().any(|c| c.name == column.name) {
                return Err(ConvertError::Schema(format!(
                    "column '{}' is already declared on {}",
                    column.name, component
                )));
            }
            table.columns.push(column);
        }
        Ok(())
    }

    /// Declare a foreign-key edge. Both endpoints must already exist.
    pub fn add_foreign_key(
        &mut self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> Result<()> {
        for (table, column) in [(child_table, child_column), (parent_table, parent_column)] {
            let spec = self.table(table)?;
            if spec.column(column).is_none() {
                return Err(ConvertError::Schema(format!(
                    "foreign key references undeclared column {}.{}",
                    table, column
                )));
            }
        }
        self.foreign_keys.push(ForeignKey {
            child_table: child_table.to_string(),
            child_column: child_column.to_string(),
            parent_table: parent_table.to_string(),
            parent_column: parent_column.to_string(),
        });
        Ok(())
    }

    /// Render the dataset description document. Key order comes from the
    /// JSON object model, so the output is stable across runs.
    pub fn to_metadata(&self) -> serde_json::Value {
        let tables: Vec<serde_json::Value> = self
            .tables
            .iter()
            .map(|table| {
                let fks: Vec<serde_json::Value> = self
                    .foreign_keys
                    .iter()
                    .filter(|fk| fk.child_table == table.component)
                    .map(|fk| {
                        let parent_url = self
                            .table(&fk.parent_table)
                            .map(|t| t.url.clone())
                            .unwrap_or_default();
                        json!({
                            "columnReference": [fk.child_column],
                            "reference": {
                                "resource": parent_url,
                                "columnReference": [fk.parent_column],
                            },
                        })
                    })
                    .collect();
                json!({
                    "url": table.url,
                    "dc:conformsTo": format!("http://cldf.clld.org/v1.0/terms.rdf#{}", table.component),
                    "tableSchema": {
                        "columns": table.columns,
                        "primaryKey": ["ID"],
                        "foreignKeys": fks,
                    },
                })
            })
            .collect();
        json!({
            "dc:conformsTo": terms::STRUCTURE_DATASET,
            "tables": tables,
        })
    }
}
