use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::path::PathBuf;

use super::{Tool, ToolError, parse_args, write_output};

fn default_sort_keys() -> Vec<String> {
    vec!["last_name".to_string(), "first_name".to_string()]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    input_file: PathBuf,
    output_file: PathBuf,
    #[serde(default = "default_sort_keys")]
    sort_keys: Vec<String>,
}

/// Order two field values. Missing or null sorts first, numbers before strings.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Stable sort of contact objects by `keys`, in priority order.
pub fn sort_contacts(contacts: &mut [Value], keys: &[String]) {
    contacts.sort_by(|a, b| {
        keys.iter()
            .map(|key| compare_field(a.get(key), b.get(key)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Sorts a JSON array of contacts into a new file.
pub struct SortContactsTool;

impl SortContactsTool {
    async fn run(args: Args) -> Result<usize> {
        if args.sort_keys.is_empty() {
            bail!("sort_keys must not be empty");
        }

        let raw = tokio::fs::read_to_string(&args.input_file)
            .await
            .with_context(|| format!("failed to read {}", args.input_file.display()))?;
        let parsed: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", args.input_file.display()))?;

        let Value::Array(mut contacts) = parsed else {
            bail!("{} does not contain a JSON array", args.input_file.display());
        };

        sort_contacts(&mut contacts, &args.sort_keys);

        let out = serde_json::to_string_pretty(&contacts)?;
        write_output(&args.output_file, &out).await?;
        Ok(contacts.len())
    }
}

#[async_trait]
impl Tool for SortContactsTool {
    fn name(&self) -> &str {
        "sort_contacts_file"
    }

    fn description(&self) -> &str {
        "Sort a JSON array of contacts by the given keys (default: last_name, then first_name) and write the sorted array to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input_file": {"type": "string", "description": "JSON file with an array of contacts"},
                "output_file": {"type": "string", "description": "Where to write the sorted array"},
                "sort_keys": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Fields to sort by, highest priority first"
                }
            },
            "required": ["input_file", "output_file"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let count = Self::run(args).await?;
        Ok(json!(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(contacts: &[Value]) -> Vec<String> {
        contacts
            .iter()
            .map(|c| {
                format!(
                    "{} {}",
                    c["first_name"].as_str().unwrap_or(""),
                    c["last_name"].as_str().unwrap_or("")
                )
            })
            .collect()
    }

    #[test]
    fn sorts_by_last_then_first() {
        let mut contacts = vec![
            json!({"first_name": "Zoe", "last_name": "Adams"}),
            json!({"first_name": "Bob", "last_name": "Young"}),
            json!({"first_name": "Amy", "last_name": "Adams"}),
        ];
        sort_contacts(&mut contacts, &default_sort_keys());
        assert_eq!(names(&contacts), vec!["Amy Adams", "Zoe Adams", "Bob Young"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut contacts = vec![
            json!({"first_name": "A", "last_name": "Same", "id": 1}),
            json!({"first_name": "A", "last_name": "Same", "id": 2}),
        ];
        sort_contacts(&mut contacts, &default_sort_keys());
        assert_eq!(contacts[0]["id"], 1);
        assert_eq!(contacts[1]["id"], 2);
    }

    #[test]
    fn missing_fields_sort_first() {
        let mut contacts = vec![
            json!({"first_name": "B", "last_name": "Brown"}),
            json!({"first_name": "NoLast"}),
        ];
        sort_contacts(&mut contacts, &default_sort_keys());
        assert_eq!(contacts[0]["first_name"], "NoLast");
    }

    #[test]
    fn null_fields_sort_with_missing() {
        let mut contacts = vec![
            json!({"first_name": "B", "last_name": "Brown"}),
            json!({"first_name": "Nil", "last_name": null}),
            json!({"first_name": "Absent"}),
        ];
        sort_contacts(&mut contacts, &default_sort_keys());
        assert_eq!(names(&contacts), vec!["Absent ", "Nil ", "B Brown"]);
        assert_eq!(compare_field(Some(&Value::Null), None), Ordering::Equal);
    }

    #[test]
    fn numbers_compare_numerically() {
        let mut rows = vec![json!({"age": 10}), json!({"age": 9}), json!({"age": 100})];
        sort_contacts(&mut rows, &["age".to_string()]);
        let ages: Vec<i64> = rows.iter().map(|r| r["age"].as_i64().unwrap()).collect();
        assert_eq!(ages, vec![9, 10, 100]);
    }

    #[tokio::test]
    async fn tool_writes_sorted_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("contacts.json");
        let output = dir.path().join("contacts-sorted.json");
        std::fs::write(
            &input,
            r#"[{"first_name":"b","last_name":"z"},{"first_name":"a","last_name":"z"},{"first_name":"c","last_name":"a"}]"#,
        )
        .unwrap();

        let result = SortContactsTool
            .execute(json!({"input_file": input, "output_file": output}))
            .await
            .unwrap();
        assert_eq!(result, json!(3));

        let sorted: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(names(&sorted), vec!["c a", "a z", "b z"]);
    }

    #[tokio::test]
    async fn tool_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("contacts.json");
        std::fs::write(&input, r#"{"first_name": "x"}"#).unwrap();

        let err = SortContactsTool
            .execute(json!({"input_file": input, "output_file": dir.path().join("out.json")}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("JSON array"));
    }
}
