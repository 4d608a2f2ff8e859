//! Output formatters for command results.

use clap::ValueEnum;
use collegedb_core::{
    CascadeResult, ConstraintDef, EntityDef, SchemaBundle, SeedSummary, StoredRow, Timestamps,
    Value,
};
use comfy_table::{Cell, Table};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format rows of one table.
    fn format_rows(&self, entity: &EntityDef, rows: &[StoredRow]) -> String;

    /// Format the registered schema.
    fn format_schema(&self, schema: &SchemaBundle) -> String;

    /// Format the outcome of a fixture load.
    fn format_seed(&self, summary: &SeedSummary) -> String;

    /// Format the outcome of a delete.
    fn format_delete(&self, entity: &str, id: u64, result: &CascadeResult) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Column names shown for a table: identity, declared fields, timestamps.
fn columns(entity: &EntityDef) -> Vec<&str> {
    let mut columns = Vec::with_capacity(entity.fields.len() + 3);
    if entity.is_auto_increment() {
        columns.push(entity.identity_field.as_str());
    }
    columns.extend(entity.fields.iter().map(|f| f.name.as_str()));
    columns.push("created_at");
    columns.push("updated_at");
    columns
}

/// Value of one column of a stored row.
fn cell(entity: &EntityDef, stored: &StoredRow, column: &str) -> Value {
    let timestamps = Timestamps::from_micros(stored.created_at, stored.updated_at);
    match column {
        "created_at" => Value::Text(timestamps.created_at.to_string()),
        "updated_at" => Value::Text(timestamps.updated_at.to_string()),
        c if c == entity.identity_field && entity.is_auto_increment() => Value::from(stored.id),
        c => stored.row.get(c).cloned().unwrap_or(Value::Null),
    }
}

fn constraint_rule(constraint: &ConstraintDef) -> String {
    match constraint {
        ConstraintDef::Unique { fields, .. } => format!("UNIQUE ({})", fields.join(", ")),
        ConstraintDef::Check { check, .. } => format!("CHECK ({})", check.describe()),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_rows(&self, entity: &EntityDef, rows: &[StoredRow]) -> String {
        let columns = columns(entity);
        let mut table = Table::new();
        table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());

        for stored in rows {
            table.add_row(
                columns
                    .iter()
                    .map(|c| Cell::new(cell(entity, stored, c)))
                    .collect::<Vec<_>>(),
            );
        }

        format!("{}\n{} row(s)", table, rows.len())
    }

    fn format_schema(&self, schema: &SchemaBundle) -> String {
        let mut tables = Table::new();
        tables.set_header(vec!["Table", "Column", "Type", "Null", "Default"]);
        for entity in schema.entities.values() {
            if entity.is_auto_increment() {
                tables.add_row(vec![
                    entity.name.clone(),
                    entity.identity_field.clone(),
                    "BIGINT".to_string(),
                    "PK".to_string(),
                    "auto".to_string(),
                ]);
            }
            for field in &entity.fields {
                let null = if field.name == entity.identity_field {
                    "PK"
                } else if field.nullable {
                    "yes"
                } else {
                    "no"
                };
                tables.add_row(vec![
                    entity.name.clone(),
                    field.name.clone(),
                    field.scalar.sql_name(),
                    null.to_string(),
                    field
                        .default
                        .as_ref()
                        .map(|d| d.to_value().to_string())
                        .unwrap_or_default(),
                ]);
            }
        }

        let mut relations = Table::new();
        relations.set_header(vec!["Relation", "From", "To", "On delete"]);
        for relation in schema.relations.values() {
            relations.add_row(vec![
                relation.name.clone(),
                format!("{}.{}", relation.from_entity, relation.from_field),
                relation.to_entity.clone(),
                relation.on_delete.sql_name().to_string(),
            ]);
        }

        let mut constraints = Table::new();
        constraints.set_header(vec!["Constraint", "Table", "Rule"]);
        for constraint in &schema.constraints {
            constraints.add_row(vec![
                constraint.name().to_string(),
                constraint.entity().to_string(),
                constraint_rule(constraint),
            ]);
        }

        format!(
            "Schema version {}\n\n{}\n\n{}\n\n{}",
            schema.version, tables, relations, constraints
        )
    }

    fn format_seed(&self, summary: &SeedSummary) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Table", "Rows"]);
        for (name, count) in seed_counts(summary) {
            table.add_row(vec![name.to_string(), count.to_string()]);
        }
        format!("{}\n{} row(s) loaded", table, summary.total())
    }

    fn format_delete(&self, entity: &str, id: u64, result: &CascadeResult) -> String {
        let mut output = format!("Deleted {entity} row {id}");
        for (dependent, dependent_id) in &result.deleted_entities {
            output.push_str(&format!("\n  cascaded: {dependent} row {dependent_id}"));
        }
        for (dependent, dependent_id, field) in &result.nullified_fields {
            output.push_str(&format!(
                "\n  cleared: {dependent} row {dependent_id} ({field})"
            ));
        }
        output
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_rows(&self, entity: &EntityDef, rows: &[StoredRow]) -> String {
        let columns = columns(entity);
        let rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|stored| {
                let mut obj = serde_json::Map::new();
                for column in &columns {
                    obj.insert(column.to_string(), value_to_json(&cell(entity, stored, column)));
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_schema(&self, schema: &SchemaBundle) -> String {
        let tables: Vec<serde_json::Value> = schema
            .entities
            .values()
            .map(|entity| {
                serde_json::json!({
                    "name": entity.name,
                    "identity": entity.identity_field,
                    "auto_increment": entity.is_auto_increment(),
                    "columns": entity.fields.iter().map(|f| serde_json::json!({
                        "name": f.name,
                        "type": f.scalar.sql_name(),
                        "nullable": f.nullable,
                        "default": f.default.as_ref().map(|d| value_to_json(&d.to_value())),
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        let relations: Vec<serde_json::Value> = schema
            .relations
            .values()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "from": format!("{}.{}", r.from_entity, r.from_field),
                    "to": r.to_entity,
                    "on_delete": r.on_delete.sql_name(),
                })
            })
            .collect();
        let constraints: Vec<serde_json::Value> = schema
            .constraints
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name(),
                    "table": c.entity(),
                    "rule": constraint_rule(c),
                })
            })
            .collect();

        serde_json::to_string_pretty(&serde_json::json!({
            "version": schema.version,
            "tables": tables,
            "relations": relations,
            "constraints": constraints,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_seed(&self, summary: &SeedSummary) -> String {
        serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_delete(&self, entity: &str, id: u64, result: &CascadeResult) -> String {
        serde_json::json!({
            "deleted": { "table": entity, "id": id },
            "cascaded": result
                .deleted_entities
                .iter()
                .map(|(e, i)| serde_json::json!({ "table": e, "id": i }))
                .collect::<Vec<_>>(),
            "cleared": result
                .nullified_fields
                .iter()
                .map(|(e, i, f)| serde_json::json!({ "table": e, "id": i, "field": f }))
                .collect::<Vec<_>>(),
        })
        .to_string()
    }
}

fn seed_counts(summary: &SeedSummary) -> [(&'static str, usize); 6] {
    [
        ("departments", summary.departments),
        ("instructors", summary.instructors),
        ("department_heads", summary.department_heads),
        ("courses", summary.courses),
        ("students", summary.students),
        ("enrollments", summary.enrollments),
    ]
}

/// Convert a Value to JSON. Decimals are rendered as strings to keep their scale.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Decimal(d) => serde_json::Value::String(d.to_string()),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(d.to_string()),
    }
}
