use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use legacom::TypeRegistry;

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Registered Types",
    commands: &[
        "legacom types                      # Table of field types",
        "legacom --output compact types     # Space separated type names",
    ],
}];

#[derive(Debug, Serialize)]
struct TypeList {
    types: Vec<String>,
}

impl TypeList {
    fn from_registry(registry: &TypeRegistry) -> Self {
        Self {
            types: registry.names().map(str::to_string).collect(),
        }
    }
}

impl TableDisplay for TypeList {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Type"]);
        for name in &self.types {
            table.add_row(vec![Cell::new(name)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.types.join(" ")
    }
}

pub fn handle_types(output: &OutputManager) -> Result<()> {
    let types = TypeList::from_registry(TypeRegistry::global());
    output.heading("Field Types");
    output.display(&types)?;
    Ok(())
}
