//! Subcommands and their dispatch onto the store.

use anyhow::{Context, Result};
use clap::Subcommand;
use ouroboros_sheet_store::{
    CellValue, Envelope, Filter, InsertRequest, Operator, ReadQuery, Record, SheetStore,
    UpdateRequest,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Read records, optionally filtered by one column
    Read {
        /// Column to filter on
        #[arg(long, requires = "value")]
        column: Option<String>,

        /// Comparison: =, !=, >, <, >=, <=, contains, startsWith, endsWith
        #[arg(long, default_value = "=")]
        op: String,

        /// Value to compare against
        #[arg(long, requires = "column")]
        value: Option<String>,

        /// Return only the first match
        #[arg(long)]
        single: bool,

        /// Keep records marked inactive
        #[arg(long)]
        include_inactive: bool,
    },
    /// Print the lower-cased header row
    Headers,
    /// Append a record given as a JSON object
    Insert {
        /// Record fields, e.g. '{"name":"Ana"}'
        #[arg(long)]
        data: String,

        /// Alias stamped into the submitter field
        #[arg(long)]
        user: Option<String>,

        /// Assign the next numeric id
        #[arg(long)]
        include_id: bool,
    },
    /// Update fields of the record where COL = ID
    Update {
        #[arg(long, default_value = "id")]
        col: String,

        #[arg(long)]
        id: String,

        /// Fields to write as a JSON object
        #[arg(long)]
        values: String,
    },
    /// Mark the record where COL = ID as inactive
    Deactivate {
        #[arg(long, default_value = "id")]
        col: String,

        #[arg(long)]
        id: String,
    },
    /// Clear the row of the record where COL = ID
    Delete {
        #[arg(long, default_value = "id")]
        col: String,

        #[arg(long)]
        id: String,
    },
    /// Print the highest numeric id
    LastId,
    /// Find records where KEY = VALUE
    Find {
        #[arg(long)]
        key: String,

        #[arg(long)]
        value: String,

        /// Return only the first match
        #[arg(long)]
        one: bool,
    },
}

/// Serialized envelope plus its success flag.
#[derive(Debug)]
pub struct Output {
    pub success: bool,
    pub body: Value,
}

impl<T: Serialize> TryFrom<Envelope<T>> for Output {
    type Error = anyhow::Error;

    fn try_from(envelope: Envelope<T>) -> Result<Self> {
        Ok(Self {
            success: envelope.success,
            body: serde_json::to_value(&envelope).context("serializing envelope")?,
        })
    }
}

fn parse_record(json: &str, what: &str) -> Result<Record> {
    serde_json::from_str(json).with_context(|| format!("--{} must be a JSON object", what))
}

/// Command-line values are typed the way the sheet would type them.
fn cell(text: &str) -> CellValue {
    CellValue::parse_user_entered(text)
}

pub async fn run(store: &SheetStore, command: Command) -> Result<Output> {
    match command {
        Command::Read {
            column,
            op,
            value,
            single,
            include_inactive,
        } => {
            let mut query = ReadQuery::new();
            if let (Some(column), Some(value)) = (column, value) {
                let mut filter = Filter::new(column, cell(&value)).operator(Operator::parse(&op));
                if single {
                    filter = filter.single();
                }
                query = query.filter(filter);
            }
            if include_inactive {
                query = query.include_inactive();
            }
            store.read(query).await.try_into()
        }
        Command::Headers => store.headers().await.try_into(),
        Command::Insert {
            data,
            user,
            include_id,
        } => {
            let mut request = InsertRequest::new(parse_record(&data, "data")?);
            if let Some(alias) = user {
                request = request.user(alias);
            }
            if include_id {
                request = request.include_id();
            }
            store.insert(request).await.try_into()
        }
        Command::Update { col, id, values } => {
            let values = parse_record(&values, "values")?;
            store
                .update(UpdateRequest::new(col, cell(&id), values))
                .await
                .try_into()
        }
        Command::Deactivate { col, id } => store.deactivate(&col, cell(&id)).await.try_into(),
        Command::Delete { col, id } => store.delete(&col, cell(&id)).await.try_into(),
        Command::LastId => store.last_id().await.try_into(),
        Command::Find { key, value, one } => {
            if one {
                store.find_one_by_key(&key, cell(&value)).await.try_into()
            } else {
                store.find_by_key(&key, cell(&value)).await.try_into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ouroboros_sheet_store::{MemoryGrid, SheetConfig};
    use std::sync::Arc;

    fn store() -> (Arc<MemoryGrid>, SheetStore) {
        let backend = Arc::new(MemoryGrid::new("book-1").with_sheet(
            "S",
            &[&["id", "name", "active"], &["1", "Ana", "TRUE"], &["2", "Bob", "FALSE"]],
        ));
        let store = SheetStore::new(SheetConfig::new("S"), backend.clone()).unwrap();
        (backend, store)
    }

    #[tokio::test]
    async fn test_read_with_filter() {
        let (_, store) = store();
        let command = Command::Read {
            column: Some("id".to_string()),
            op: ">=".to_string(),
            value: Some("1".to_string()),
            single: true,
            include_inactive: true,
        };
        let output = run(&store, command).await.unwrap();
        assert!(output.success);
        assert_eq!(output.body["data"]["name"], "Ana");
    }

    #[tokio::test]
    async fn test_insert_and_last_id() {
        let (backend, store) = store();
        let command = Command::Insert {
            data: r#"{"name":"Cid"}"#.to_string(),
            user: None,
            include_id: true,
        };
        let output = run(&store, command).await.unwrap();
        assert_eq!(output.body["status"], 201);
        assert_eq!(backend.cell("S", 4, 1), Some(CellValue::from(3)));

        let output = run(&store, Command::LastId).await.unwrap();
        assert_eq!(output.body["data"], 3);
    }

    #[tokio::test]
    async fn test_delete_reports_failure() {
        let (_, store) = store();
        let command = Command::Delete {
            col: "id".to_string(),
            id: "9".to_string(),
        };
        let output = run(&store, command).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.body["error"]["type"], "NOT_FOUND_ERROR");
    }

    #[tokio::test]
    async fn test_bad_json_is_rejected() {
        let (backend, store) = store();
        let command = Command::Update {
            col: "id".to_string(),
            id: "1".to_string(),
            values: "not json".to_string(),
        };
        assert!(run(&store, command).await.is_err());
        assert!(backend.calls().is_empty());
    }
}
