use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use serde::Serialize;
use serde_json::Value;

use legacom::node::TYPE_KEY;
use legacom::{IndexSettings, MappingParser, RootMapping, SchemaNode, TypeRegistry};

use crate::context::ToolContext;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Validate a Mapping",
        commands: &[
            "legacom mapping check mapping.json                   # List fields and their declared types",
            "legacom --config index.toml mapping check mapping.json",
        ],
    },
    ExampleGroup {
        title: "Round-trip a Mapping",
        commands: &[
            "legacom mapping roundtrip mapping.json               # Show the mapping as it would be saved",
            "legacom --output json mapping roundtrip mapping.json > saved.json",
        ],
    },
];

#[derive(Subcommand)]
pub enum MappingCommands {
    /// Parse a mapping file and list its fields
    #[command(name = "check")]
    Check {
        /// JSON file holding `{"properties": {...}}`
        file: PathBuf,
    },

    /// Parse a mapping file and print it as it would be persisted
    #[command(name = "roundtrip")]
    Roundtrip {
        /// JSON file holding `{"properties": {...}}`
        file: PathBuf,
    },
}

pub fn handle_mapping_commands(command: MappingCommands, ctx: &ToolContext, output: &OutputManager) -> Result<()> {
    output.verbose(&format!("Using settings from {}", ctx.source()));

    match command {
        MappingCommands::Check { file } => handle_check(ctx, &file, output),
        MappingCommands::Roundtrip { file } => handle_roundtrip(ctx, &file, output),
    }
}

fn handle_check(ctx: &ToolContext, file: &Path, output: &OutputManager) -> Result<()> {
    let mapping = load_mapping(&ctx.settings, file)?;
    let report = CheckReport::new(ctx, &mapping);

    output.heading("Mapping Check");
    output.key_value("File", &file.display().to_string());
    output.key_value("Index created", &report.version_created);
    output.display(&report)?;

    for entry in &report.unconsumed {
        output.warning(&format!(
            "[{}] parameter [{}] is not supported and was ignored",
            entry.field, entry.key
        ));
    }
    if report.fields.is_empty() {
        output.info("Mapping declares no fields");
    } else {
        output.success(&format!("{} field(s) parsed", report.fields.len()));
    }
    Ok(())
}

fn handle_roundtrip(ctx: &ToolContext, file: &Path, output: &OutputManager) -> Result<()> {
    let mapping = load_mapping(&ctx.settings, file)?;
    let report = RoundtripReport {
        mapping: mapping.to_schema().context("Failed to serialize mapping")?,
    };

    output.heading("Persisted Mapping");
    output.display(&report)?;
    Ok(())
}

/// Read and parse a JSON mapping file against `settings`
pub fn load_mapping(settings: &IndexSettings, file: &Path) -> Result<RootMapping> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    parse_mapping(settings, &content).with_context(|| format!("Invalid mapping in {}", file.display()))
}

fn parse_mapping(settings: &IndexSettings, content: &str) -> Result<RootMapping> {
    let parser = MappingParser::new(TypeRegistry::global(), settings)?;
    Ok(parser.parse_str(content)?)
}

#[derive(Debug, Serialize)]
struct FieldSummary {
    name: String,
    full_name: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Serialize)]
struct UnconsumedSummary {
    field: String,
    key: String,
    value: Value,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    settings: String,
    version_created: String,
    fields: Vec<FieldSummary>,
    unconsumed: Vec<UnconsumedSummary>,
}

impl CheckReport {
    fn new(ctx: &ToolContext, mapping: &RootMapping) -> Self {
        Self {
            settings: ctx.source(),
            version_created: ctx.settings.version_created.to_string(),
            fields: mapping
                .fields()
                .map(|field| FieldSummary {
                    name: field.simple_name().to_string(),
                    full_name: field.full_name().to_string(),
                    type_name: field.content_type().to_string(),
                })
                .collect(),
            unconsumed: mapping
                .unconsumed()
                .iter()
                .map(|entry| UnconsumedSummary {
                    field: entry.field.clone(),
                    key: entry.key.clone(),
                    value: entry.value.clone(),
                })
                .collect(),
        }
    }
}

impl TableDisplay for CheckReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Field", "Type", "Unconsumed"]);
        for field in &self.fields {
            let unconsumed: Vec<&str> = self
                .unconsumed
                .iter()
                .filter(|entry| entry.field == field.name)
                .map(|entry| entry.key.as_str())
                .collect();
            table.add_row(vec![
                Cell::new(&field.full_name),
                Cell::new(&field.type_name),
                Cell::new(unconsumed.join(", ")),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{}:{}", field.name, field.type_name))
            .collect();
        format!("{} unconsumed={}", fields.join(" "), self.unconsumed.len())
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct RoundtripReport {
    mapping: SchemaNode,
}

impl RoundtripReport {
    fn properties(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.mapping
            .get(legacom::mapping::PROPERTIES_KEY)
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
    }
}

impl TableDisplay for RoundtripReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Field", "Type", "Definition"]);
        for (name, body) in self.properties() {
            let type_name = body.get(TYPE_KEY).and_then(Value::as_str).unwrap_or_default();
            table.add_row(vec![
                Cell::new(name),
                Cell::new(type_name),
                Cell::new(serde_json::to_string_pretty(body).unwrap_or_default()),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        serde_json::to_string(&self.mapping).unwrap_or_default()
    }
}
