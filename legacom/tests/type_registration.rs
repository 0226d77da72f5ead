use std::any::Any;

use legacom::{
    BuilderContext, FieldMapper, IndexSettings, MapperBuilder, MapperResult, MappingParser, Parsed, ParserContext,
    RenamedFieldMapper, SchemaNode, SchemaSink, TypeParser, TypeRegistration, TypeRegistry,
};
use serde_json::{Value, json};

const LABEL: &str = "label";

#[derive(Debug)]
struct LabelBuilder {
    name: String,
}

impl MapperBuilder for LabelBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(self: Box<Self>, context: &BuilderContext<'_>) -> MapperResult<Box<dyn FieldMapper>> {
        let full_name = context.full_name(&self.name);
        Ok(Box::new(LabelMapper {
            name: self.name,
            full_name,
        }))
    }
}

#[derive(Debug)]
struct LabelMapper {
    name: String,
    full_name: String,
}

impl FieldMapper for LabelMapper {
    fn simple_name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn content_type(&self) -> &str {
        LABEL
    }

    fn to_schema(&self, out: &mut dyn SchemaSink) -> MapperResult<()> {
        out.field(&self.name, json!({"type": LABEL, "searchable": false}))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct LabelTypeParser;

impl TypeParser for LabelTypeParser {
    fn parse(&self, name: &str, mut node: SchemaNode, _context: &ParserContext<'_>) -> MapperResult<Parsed> {
        node.remove("searchable");
        Ok(Parsed {
            builder: Box::new(LabelBuilder { name: name.to_string() }),
            residual: node,
        })
    }
}

fn label_parser() -> Box<dyn TypeParser> {
    Box::new(LabelTypeParser)
}

inventory::submit! {
    TypeRegistration { name: LABEL, parser: label_parser }
}

#[test]
fn submitted_types_join_the_global_registry() {
    let registry = TypeRegistry::global();
    assert!(registry.contains(LABEL));
    assert!(registry.contains("legacy_completion"));
    assert!(legacom::registry::registered_types().any(|registration| registration.name == LABEL));
    assert!(!TypeRegistry::with_builtin_types().contains(LABEL));
}

#[test]
fn submitted_types_parse_inside_mappings() {
    let settings = IndexSettings::default();
    let parser = MappingParser::new(TypeRegistry::global(), &settings).unwrap();
    let mapping = parser
        .parse_str(r#"{"properties": {"title": {"type": "label", "searchable": false}, "suggest": {"type": "legacy_completion"}}}"#)
        .unwrap();
    assert_eq!(mapping.field("title").unwrap().content_type(), LABEL);

    let saved = Value::Object(mapping.to_schema().unwrap());
    assert_eq!(saved["properties"]["title"], json!({"type": "label", "searchable": false}));
    assert_eq!(saved["properties"]["suggest"]["type"], "legacy_completion");
}

#[test]
fn any_mapper_can_be_renamed() {
    let mapper = LabelMapper {
        name: "title".into(),
        full_name: "doc.title".into(),
    };
    let renamed = RenamedFieldMapper::new(mapper, "legacy_label");
    let mut out = SchemaNode::new();
    renamed.to_schema(&mut out).unwrap();
    assert_eq!(Value::Object(out), json!({"title": {"type": "legacy_label", "searchable": false}}));
    assert_eq!(renamed.base_content_type(), LABEL);
}
