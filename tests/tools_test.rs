use std::fs;
use std::sync::Arc;

use serde_json::{Value, json};

use errand::llm::mock::{MockEmbedder, MockVision};
use errand::tools::{ToolContext, ToolError, ToolRegistry};

fn registry() -> ToolRegistry {
    ToolRegistry::standard(ToolContext {
        vision: Arc::new(MockVision::replying("Card: 4026 3992 1234 5678")),
        embedder: Arc::new(MockEmbedder::new(vec![
            ("The app crashes on start", vec![1.0, 0.0, 0.1]),
            ("Great design", vec![0.0, 1.0, 0.0]),
            ("Crashes when I open it", vec![0.9, 0.0, 0.2]),
        ])),
    })
}

async fn call(registry: &ToolRegistry, name: &str, args: Value) -> Result<Value, ToolError> {
    registry
        .get(name)
        .unwrap_or_else(|| panic!("{} not registered", name))
        .execute(args)
        .await
}

// ── Registry ──────────────────────────────────────────────────────

#[test]
fn standard_registry_has_every_utility() {
    let registry = registry();
    assert_eq!(
        registry.names(),
        vec![
            "calculate_ticket_sales",
            "count_given_weekday_in_dates",
            "extract_numbers_from_image",
            "extract_sender_email",
            "extract_titles_from_markdown_files",
            "format_file_with_prettier",
            "get_similar_comments",
            "run_datagen_script",
            "sort_contacts_file",
            "write_most_recent_log_first_lines",
        ]
    );
}

#[test]
fn manifest_is_sorted_and_described() {
    let manifest = registry().manifest();
    let names: Vec<&str> = manifest.iter().map(|f| f.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    for spec in &manifest {
        assert!(!spec.description.is_empty(), "{} has no description", spec.name);
        assert_eq!(spec.parameters["type"], "object", "{}", spec.name);
    }
}

#[test]
fn unknown_name_is_absent() {
    assert!(registry().get("rm_rf").is_none());
}

// ── End to end ────────────────────────────────────────────────────

#[tokio::test]
async fn sorts_contacts_into_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("contacts.json");
    let output = dir.path().join("sorted.json");
    fs::write(
        &input,
        r#"[
            {"first_name": "Zoe", "last_name": "Adams"},
            {"first_name": "Amy", "last_name": "Brown"},
            {"first_name": "Ann", "last_name": "Adams"}
        ]"#,
    )
    .unwrap();

    let result = call(
        &registry(),
        "sort_contacts_file",
        json!({"input_file": input, "output_file": output}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!(3));

    let sorted: Vec<Value> = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let firsts: Vec<&str> = sorted
        .iter()
        .map(|c| c["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(firsts, vec!["Ann", "Zoe", "Amy"]);
}

#[tokio::test]
async fn extracts_sender_from_email() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("email.txt");
    let output = dir.path().join("sender.txt");
    fs::write(
        &input,
        "Subject: Hi\nFrom: \"Jane Doe\" <jane@example.com>\nTo: bob@example.org\n\nBody\n",
    )
    .unwrap();

    let result = call(
        &registry(),
        "extract_sender_email",
        json!({"input_file": input, "output_file": output}),
    )
    .await
    .unwrap();

    assert_eq!(result, json!("jane@example.com"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "jane@example.com");
}

#[tokio::test]
async fn reads_card_number_through_vision() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("card.png");
    fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

    let result = call(
        &registry(),
        "extract_numbers_from_image",
        json!({"image_path": image}),
    )
    .await
    .unwrap();

    assert_eq!(result, json!("4026399212345678"));
}

#[tokio::test]
async fn finds_most_similar_comments() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("comments.txt");
    fs::write(
        &input,
        "The app crashes on start\nGreat design\nCrashes when I open it\n",
    )
    .unwrap();

    let result = call(
        &registry(),
        "get_similar_comments",
        json!({"input_file": input}),
    )
    .await
    .unwrap();

    assert_eq!(result["first"], "The app crashes on start");
    assert_eq!(result["second"], "Crashes when I open it");
}

#[tokio::test]
async fn indexes_markdown_titles() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir_all(docs.join("guide")).unwrap();
    fs::write(docs.join("README.md"), "# Project\n").unwrap();
    fs::write(docs.join("guide/setup.md"), "intro\n# Setup\n").unwrap();
    fs::write(docs.join("notes.txt"), "# Not markdown\n").unwrap();
    let output = dir.path().join("index.json");

    let result = call(
        &registry(),
        "extract_titles_from_markdown_files",
        json!({"docs_dir": docs, "output_file": output}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!(2));

    let index: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        index,
        json!({"README.md": "Project", "guide/setup.md": "Setup"})
    );
}

#[tokio::test]
async fn sums_gold_ticket_sales() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("tickets.db");
    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE tickets (type TEXT, units INTEGER, price REAL);
             INSERT INTO tickets VALUES ('Gold', 2, 10.5);
             INSERT INTO tickets VALUES (' gold ', 1, 4.0);
             INSERT INTO tickets VALUES ('Silver', 5, 3.0);",
        )
        .unwrap();
    }

    let result = call(
        &registry(),
        "calculate_ticket_sales",
        json!({"db_path": db}),
    )
    .await
    .unwrap();

    assert_eq!(result.as_f64(), Some(25.0));
}

#[tokio::test]
async fn extra_argument_is_invalid() {
    let err = call(
        &registry(),
        "extract_sender_email",
        json!({"input_file": "/data/email.txt", "cc": true}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments(_)));
}

#[tokio::test]
async fn missing_input_is_a_failure() {
    let err = call(
        &registry(),
        "write_most_recent_log_first_lines",
        json!({"logs_dir": "/nonexistent/logs", "output_file": "/nonexistent/out.txt"}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ToolError::Failed(_)));
}
