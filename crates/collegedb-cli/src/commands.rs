//! Subcommand execution.

use collegedb_core::{load_fixtures, Store};
use tracing::info;

use crate::config::Command;
use crate::error::CliError;
use crate::formatter::Formatter;

/// Run a subcommand against an open store and render its output.
pub fn execute(
    store: &Store,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match command {
        Command::Schema => Ok(formatter.format_schema(store.schema())),

        Command::Seed => {
            let summary = load_fixtures(store)?;
            store.flush()?;
            Ok(formatter.format_seed(&summary))
        }

        Command::List { table } => {
            let entity = store.schema().entity(table)?;
            let rows = store.scan(table)?;
            Ok(formatter.format_rows(entity, &rows))
        }

        Command::Get { table, id } => {
            let entity = store.schema().entity(table)?;
            let row = store.get(table, *id)?.ok_or_else(|| CliError::RowNotFound {
                table: table.clone(),
                id: *id,
            })?;
            Ok(formatter.format_rows(entity, std::slice::from_ref(&row)))
        }

        Command::Delete { table, id } => {
            let result = store.delete(table, *id)?;
            store.flush()?;
            info!(
                table = table.as_str(),
                id = *id,
                affected = result.affected_count(),
                "row deleted"
            );
            Ok(formatter.format_delete(table, *id, &result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{JsonFormatter, TableFormatter};
    use collegedb_core::{Error, StoreConfig};

    fn seeded() -> Store {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        execute(&store, &Command::Seed, &TableFormatter).unwrap();
        store
    }

    #[test]
    fn test_seed_and_list() {
        let store = seeded();
        let output = execute(
            &store,
            &Command::List {
                table: "courses".into(),
            },
            &JsonFormatter,
        )
        .unwrap();

        let rows: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 4);
        assert_eq!(rows[0]["course_code"], "CS101");
        assert_eq!(rows[0]["credits"], 3);
    }

    #[test]
    fn test_get_missing_row() {
        let store = seeded();
        let err = execute(
            &store,
            &Command::Get {
                table: "students".into(),
                id: 99,
            },
            &TableFormatter,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::RowNotFound { id: 99, .. }));
    }

    #[test]
    fn test_unknown_table() {
        let store = seeded();
        let err = execute(
            &store,
            &Command::List {
                table: "faculties".into(),
            },
            &TableFormatter,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Store(Error::UnknownEntity(_))));
    }

    #[test]
    fn test_delete_reports_rules() {
        let store = seeded();

        let err = execute(
            &store,
            &Command::Delete {
                table: "departments".into(),
                id: 1,
            },
            &TableFormatter,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Store(ref e) if e.is_restricted_delete()));

        let output = execute(
            &store,
            &Command::Delete {
                table: "students".into(),
                id: 1,
            },
            &TableFormatter,
        )
        .unwrap();
        assert!(output.starts_with("Deleted students row 1"));
        assert_eq!(output.matches("cascaded: enrollments").count(), 2);
    }
}
