use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use super::{Tool, ToolError, parse_args, write_output};

fn default_ticket_type() -> String {
    "Gold".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    db_path: PathBuf,
    #[serde(default = "default_ticket_type")]
    ticket_type: String,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// Total `units * price` for one ticket type. Type matching ignores
/// surrounding whitespace and case.
pub fn total_sales(db_path: &Path, ticket_type: &str) -> Result<f64> {
    if !db_path.is_file() {
        bail!("database not found: {}", db_path.display());
    }
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let total: f64 = conn
        .query_row(
            "SELECT COALESCE(SUM(units * price), 0.0)
             FROM tickets
             WHERE LOWER(TRIM(type)) = LOWER(TRIM(?1))",
            [ticket_type],
            |row| row.get(0),
        )
        .context("ticket sales query failed")?;
    Ok(total)
}

/// Sums ticket sales for one ticket type from a SQLite database.
pub struct TicketSalesTool;

impl TicketSalesTool {
    async fn run(args: Args) -> Result<f64> {
        let db_path = args.db_path.clone();
        let ticket_type = args.ticket_type.clone();
        let total =
            tokio::task::spawn_blocking(move || total_sales(&db_path, &ticket_type)).await??;

        if let Some(output) = &args.output_file {
            write_output(output, &total.to_string()).await?;
        }
        Ok(total)
    }
}

#[async_trait]
impl Tool for TicketSalesTool {
    fn name(&self) -> &str {
        "calculate_ticket_sales"
    }

    fn description(&self) -> &str {
        "Compute total sales (units times price) for one ticket type from the tickets table of a SQLite database. Defaults to Gold tickets. Optionally writes the total to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "db_path": {"type": "string", "description": "SQLite database with a tickets(type, units, price) table"},
                "ticket_type": {"type": "string", "description": "Ticket type to total, default Gold"},
                "output_file": {"type": "string", "description": "Where to write the total"}
            },
            "required": ["db_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let total = Self::run(args).await?;
        Ok(json!(total))
    }
}
