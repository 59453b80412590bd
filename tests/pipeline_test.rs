//! Pipeline orchestration tests using an in-process generator (no network).

use async_trait::async_trait;
use dysmail::{Error, Pipeline, Result, TextGenerator};

/// Pretends to be the completion model: wraps the fragment it finds below
/// the prompt preamble in a minimal MJML skeleton.
struct FakeModel;

#[async_trait]
impl TextGenerator for FakeModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let fragment = prompt.split_once('\n').map(|(_, f)| f).unwrap_or("");
        Ok(format!(
            "<mj-section><mj-column><mj-text>{fragment}</mj-text></mj-column></mj-section>"
        ))
    }
}

/// Always fails the way the real client reports a non-success status.
struct RateLimitedModel;

#[async_trait]
impl TextGenerator for RateLimitedModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("Error: 429 - Too Many Requests".to_string())
    }
}

fn sample_email() -> String {
    let para = |s: &str| format!("<p>{}</p>", s.repeat(60));
    format!(
        "<html><body>{}{}{}</body></html>",
        para("a"),
        para("b"),
        para("c")
    )
}

#[tokio::test]
async fn test_artifacts_written_per_stage_in_document_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = Pipeline::new(&FakeModel, dir.path(), 20).expect("valid budget");

    let report = pipeline.run(&sample_email()).await.expect("run should succeed");
    assert_eq!(report.fragments, 3);
    assert_eq!(report.unchanged, 0);

    for (index, marker) in ["a", "b", "c"].iter().enumerate() {
        let mjml = std::fs::read_to_string(
            dir.path().join(format!("mjml/output-{index}.mjml")),
        )
        .expect("mjml artifact should exist");
        assert!(mjml.starts_with("<mj-section>"));
        assert!(mjml.contains(marker));

        let dml = std::fs::read_to_string(
            dir.path().join(format!("dml/output-{index}.dml")),
        )
        .expect("dml artifact should exist");
        assert!(dml.starts_with("<dys-row>"));
        assert!(dml.contains("<dys-column><dys-text>"));
        assert!(dml.contains(marker));
    }
}

#[tokio::test]
async fn test_failed_calls_flow_through_as_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = Pipeline::new(&RateLimitedModel, dir.path(), 20).expect("valid budget");

    let report = pipeline.run(&sample_email()).await.expect("run should succeed");
    assert_eq!(report.fragments, 3);
    // The error string is not markup; the rewriter passes it through.
    assert_eq!(report.unchanged, 3);

    let dml = std::fs::read_to_string(dir.path().join("dml/output-0.dml"))
        .expect("dml artifact should exist");
    assert_eq!(dml, "Error: 429 - Too Many Requests");
}

#[tokio::test]
async fn test_budget_without_completion_room_is_rejected() {
    let result = Pipeline::new(&FakeModel, "unused", 5000);
    assert!(matches!(result, Err(Error::BudgetTooLarge { .. })));
}
