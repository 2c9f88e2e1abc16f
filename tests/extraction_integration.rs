//! Integration tests for extracting the built-in streams
//!
//! These run the shipped catalog end to end against an in-memory GAPI:
//! token minting, pagination, conformance and Singer output.

mod common;

use common::{FakeGapi, engine};
use serde_json::{Value, json};
use tap_gapi::storage::{MemorySink, NdjsonDirectorySink, SingerSink};
use tap_gapi::streams::catalog::{BUSINESS_TAXONOMY_SCOPE, FINANCE_SCOPE};
use tap_gapi::tap::StreamOutcome;
use tap_gapi::{StreamRegistry, TapPipeline};
use tempfile::TempDir;

fn cost_center(id: &str) -> Value {
    json!({"costCenterId": id, "costCenterName": format!("CC {id}"), "revenueEligibleFlag": true})
}

#[tokio::test]
async fn test_cost_center_pages_followed() {
    let fake = FakeGapi::new();
    fake.respond(
        "/finance/chart-of-account/cost-center",
        200,
        json!({"result": {"items": [cost_center("100"), cost_center("101")], "lastEvaluatedKey": {"costCenterId": "101"}}}),
    );
    fake.respond(
        "/finance/chart-of-account/cost-center",
        200,
        json!({"result": {"items": [cost_center("102")], "lastEvaluatedKey": null}}),
    );

    let registry = StreamRegistry::builtin().unwrap();
    let engine = engine(&fake, FINANCE_SCOPE);
    let costcenter = &registry.streams_for(FINANCE_SCOPE)[0];

    let (records, summary) = engine.extract_all(costcenter).await.unwrap();
    let ids: Vec<&str> = records
        .iter()
        .map(|r| r["costCenterId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["100", "101", "102"]);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.requests, 2);

    let queries = fake.queries_for("/finance/chart-of-account/cost-center");
    assert_eq!(queries[0], vec![("activeStatus".to_string(), "ALL".to_string())]);
    assert_eq!(queries[1][1].0, "nextToken");
    assert_eq!(
        serde_json::from_str::<Value>(&queries[1][1].1).unwrap(),
        json!({"costCenterId": "101"})
    );
}

#[tokio::test]
async fn test_taxonomy_scope_to_singer() {
    let fake = FakeGapi::new();
    fake.respond(
        "/business/taxonomy/markets",
        200,
        json!({"result": [{"id": "m1", "name": "Chicago", "active": true, "notInSchema": 1}]}),
    );
    fake.respond(
        "/business/taxonomy/groups",
        200,
        json!({"result": [{"id": "g1", "name": "Data"}, {"id": "g2", "name": "Cloud"}]}),
    );

    let tap = TapPipeline::new(engine(&fake, BUSINESS_TAXONOMY_SCOPE), StreamRegistry::builtin().unwrap())
        .with_streams(["markets", "groups"]);
    let mut sink = SingerSink::new(Vec::new());
    let report = tap.run(BUSINESS_TAXONOMY_SCOPE, &mut sink).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.total_records(), 3);
    assert_eq!(fake.token_requests(), 1);

    let messages: Vec<Value> = String::from_utf8(sink.into_inner())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<(&str, &str)> = messages
        .iter()
        .map(|m| (m["type"].as_str().unwrap(), m["stream"].as_str().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("SCHEMA", "markets"),
            ("RECORD", "markets"),
            ("SCHEMA", "groups"),
            ("RECORD", "groups"),
            ("RECORD", "groups"),
        ]
    );
    assert_eq!(messages[1]["record"], json!({"id": "m1", "name": "Chicago", "active": true}));
    assert_eq!(messages[0]["key_properties"], json!(["id"]));

    let queries = fake.queries_for("/business/taxonomy/groups");
    assert_eq!(queries, vec![vec![("includeInactive".to_string(), "true".to_string())]]);
}

#[tokio::test]
async fn test_failed_stream_does_not_stop_siblings() {
    let fake = FakeGapi::new();
    fake.respond("/business/taxonomy/markets", 200, json!({"result": [{"id": "m1"}]}));
    fake.respond("/business/taxonomy/capabilities", 403, json!({"message": "forbidden"}));
    fake.respond("/business/taxonomy/groups", 200, json!({"result": [{"id": "g1"}]}));

    let tap = TapPipeline::new(engine(&fake, BUSINESS_TAXONOMY_SCOPE), StreamRegistry::builtin().unwrap())
        .with_streams(["markets", "capabilities", "groups"]);
    let mut sink = MemorySink::new();
    let report = tap.run(BUSINESS_TAXONOMY_SCOPE, &mut sink).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed().count(), 1);
    assert!(matches!(report.streams[1].outcome, StreamOutcome::Failed { .. }));
    assert_eq!(report.streams[1].summary.requests, 1);
    assert_eq!(sink.records_for("groups").count(), 1);
}

#[tokio::test]
async fn test_transient_errors_retried_within_budget() {
    let fake = FakeGapi::new();
    fake.respond("/business/taxonomy/groups", 503, json!({"message": "unavailable"}));
    fake.respond("/business/taxonomy/groups", 429, json!({"message": "slow down"}));
    fake.respond("/business/taxonomy/groups", 200, json!({"result": [{"id": "g1"}]}));

    let tap = TapPipeline::new(engine(&fake, BUSINESS_TAXONOMY_SCOPE), StreamRegistry::builtin().unwrap())
        .with_streams(["groups"]);
    let report = tap
        .run(BUSINESS_TAXONOMY_SCOPE, &mut MemorySink::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.streams[0].summary.requests, 3);
}

#[tokio::test]
async fn test_rejected_credentials_abort_run() {
    let fake = FakeGapi::new();
    fake.reject_tokens(401);

    let tap = TapPipeline::new(engine(&fake, FINANCE_SCOPE), StreamRegistry::builtin().unwrap());
    let report = tap.run(FINANCE_SCOPE, &mut MemorySink::new()).await.unwrap();

    assert!(report.aborted);
    assert_eq!(report.failed().count(), 1);
    assert_eq!(
        report
            .streams
            .iter()
            .filter(|s| s.outcome == StreamOutcome::Skipped)
            .count(),
        4
    );
    assert_eq!(fake.requests().len(), 1);
}

#[tokio::test]
async fn test_finance_scope_to_ndjson_directory() {
    let fake = FakeGapi::new();
    fake.respond(
        "/finance/chart-of-account/cost-center",
        200,
        json!({"result": {"items": [cost_center("1")], "lastEvaluatedKey": "next"}}),
    );
    for path in [
        "/finance/chart-of-account/cost-center",
        "/finance/chart-of-account/function",
        "/finance/chart-of-account/geography",
        "/finance/chart-of-account/legal-entity",
        "/finance/chart-of-account/organization",
    ] {
        fake.respond(path, 200, json!({"result": {"items": []}}));
    }

    let dir = TempDir::new().unwrap();
    let mut sink = NdjsonDirectorySink::new(dir.path()).unwrap();
    let tap = TapPipeline::new(engine(&fake, FINANCE_SCOPE), StreamRegistry::builtin().unwrap());
    let report = tap.run(FINANCE_SCOPE, &mut sink).await.unwrap();

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.streams.len(), 5);
    assert_eq!(fake.token_requests(), 1);

    let written = std::fs::read_to_string(sink.file_for("costcenter")).unwrap();
    assert_eq!(written.lines().count(), 1);
    assert_eq!(report.streams[0].summary.pages, 2);
    for name in ["function", "geography", "legalentity", "organization"] {
        assert!(sink.file_for(name).exists());
    }
}
