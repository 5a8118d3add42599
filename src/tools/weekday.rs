use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use super::{Tool, ToolError, parse_args, write_output};

/// Date-only formats, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%b %d, %Y", "%Y/%m/%d", "%d/%m/%Y"];

/// Date-time formats, tried after the date-only ones.
const DATETIME_FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    weekday: String,
    #[serde(default)]
    dates: Option<Vec<String>>,
    #[serde(default)]
    input_file: Option<PathBuf>,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// Parse a weekday name, full or abbreviated, any case.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| anyhow!("not a weekday: {:?}", name))
}

/// Parse a single date written in one of the supported formats.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    bail!("unrecognized date: {:?}", text)
}

/// How many of `dates` fall on `weekday`. Any unparseable date is an error.
pub fn count_weekday<S: AsRef<str>>(dates: &[S], weekday: Weekday) -> Result<usize> {
    let mut count = 0;
    for (i, date) in dates.iter().enumerate() {
        let parsed = parse_date(date.as_ref()).with_context(|| format!("entry {}", i + 1))?;
        if parsed.weekday() == weekday {
            count += 1;
        }
    }
    Ok(count)
}

/// Non-empty lines of a dates file.
async fn read_dates(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Counts dates that fall on a given weekday.
pub struct WeekdayCountTool;

#[async_trait]
impl Tool for WeekdayCountTool {
    fn name(&self) -> &str {
        "count_given_weekday_in_dates"
    }

    fn description(&self) -> &str {
        "Count how many dates fall on a given weekday. Dates come from a list, from a file with one date per line, or both. Optionally writes the count to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "weekday": {"type": "string", "description": "Weekday name, e.g. Wednesday"},
                "dates": {"type": "array", "items": {"type": "string"}, "description": "Dates to check"},
                "input_file": {"type": "string", "description": "File with one date per line"},
                "output_file": {"type": "string", "description": "Where to write the count"}
            },
            "required": ["weekday"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let weekday = parse_weekday(&args.weekday)?;

        if args.dates.is_none() && args.input_file.is_none() {
            return Err(anyhow!("either dates or input_file is required").into());
        }

        let mut dates = args.dates.unwrap_or_default();
        if let Some(input) = &args.input_file {
            dates.extend(read_dates(input).await?);
        }

        let count = count_weekday(&dates, weekday)?;

        if let Some(output) = &args.output_file {
            write_output(output, &count.to_string()).await?;
        }

        Ok(json!(count))
    }
}
