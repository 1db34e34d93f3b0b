//! End-to-end runs against mocked TSETMC mirrors

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::logging::{init_test_logging, log_test_step};
use crate::common::{config_for, payloads, read_lines};
use tsetmc_industries::api::{IndustryDataProvider, TsetmcClient};
use tsetmc_industries::data_collector::IndustryCollector;
use tsetmc_industries::error::{PipelineError, RetrievalError};
use tsetmc_industries::models::FailurePolicy;

const STATIC_PATH: &str = "/api/StaticData/GetStaticData";

fn related_path(code: &str) -> String {
    format!("/api/ClosingPrice/GetRelatedCompany/{}", code)
}

async fn mount_banks_and_tech(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(STATIC_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(payloads::static_data(&[("1", "Banks"), ("02", "Tech")])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(related_path("01")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(payloads::related_companies(&[(1, "BANK1", "Bank One")])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(related_path("02")))
        .respond_with(ResponseTemplate::new(200).set_body_json(payloads::related_companies(&[
            (2, "TECH1", "Tech Co"),
            (3, "TECH2", "Tech Two"),
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_writes_industry_and_combined_files() {
    init_test_logging();
    log_test_step("Full fetch-and-export run against one mirror");

    let server = MockServer::start().await;
    mount_banks_and_tech(&server).await;
    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), &[server.uri()]);

    let client = TsetmcClient::new(&config).unwrap();
    let report = IndustryCollector::new(client, config.clone()).run().await.unwrap();

    assert_eq!(report.industries_discovered, 2);
    assert_eq!(report.industries_exported, 2);
    assert_eq!(report.total_companies, 3);
    assert!(report.failed_industries.is_empty());

    assert_eq!(read_lines(&config.output_dir.join("Banks.csv")).len(), 2);
    assert_eq!(read_lines(&config.output_dir.join("Tech.csv")).len(), 3);
    let combined = read_lines(&config.combined_csv_path);
    assert_eq!(combined.len(), 4);
    assert_eq!(combined[1], "Banks,1,BANK1,Bank One");
    assert_eq!(combined[3], "Tech,3,TECH2,Tech Two");
}

#[tokio::test]
async fn test_second_mirror_used_when_first_fails() {
    init_test_logging();

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&broken)
        .await;
    let healthy = MockServer::start().await;
    mount_banks_and_tech(&healthy).await;

    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), &[broken.uri(), healthy.uri()]);
    let client = TsetmcClient::new(&config).unwrap();

    let groups = client.list_industries().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].code, "01");

    let companies = client.companies_for_industry("02").await.unwrap();
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0].id, "2");
}

#[tokio::test]
async fn test_all_mirrors_failing_is_retrieval_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), &[server.uri()]);
    let client = TsetmcClient::new(&config).unwrap();

    let err = client.companies_for_industry("01").await.unwrap_err();
    assert_matches!(err, RetrievalError::AllMirrorsFailed { last } => {
        assert_matches!(*last, RetrievalError::Http { status: 500, .. });
    });
}

#[tokio::test]
async fn test_non_json_body_is_malformed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATIC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), &[server.uri()]);
    let client = TsetmcClient::new(&config).unwrap();

    let err = client.list_industries().await.unwrap_err();
    assert_matches!(err, RetrievalError::AllMirrorsFailed { last } => {
        assert_matches!(*last, RetrievalError::MalformedPayload { .. });
    });
}

#[tokio::test]
async fn test_skip_policy_leaves_no_file_for_failed_industry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATIC_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(payloads::static_data(&[("01", "Banks"), ("02", "Tech")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(related_path("01")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(related_path("02")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(payloads::related_companies(&[(2, "TECH1", "Tech Co")])),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path(), &[server.uri()]);
    config.failure_policy = FailurePolicy::Skip;

    let client = TsetmcClient::new(&config).unwrap();
    let report = IndustryCollector::new(client, config.clone()).run().await.unwrap();

    assert_eq!(report.failed_industries, vec!["01".to_string()]);
    assert!(!config.output_dir.join("Banks.csv").exists());
    assert_eq!(
        read_lines(&config.combined_csv_path),
        vec!["industry,id,symbol,name", "Tech,2,TECH1,Tech Co"]
    );

    // the default policy aborts the same run
    config.failure_policy = FailurePolicy::Abort;
    let client = TsetmcClient::new(&config).unwrap();
    let err = IndustryCollector::new(client, config).run().await.unwrap_err();
    assert_matches!(err, PipelineError::Retrieval { code, .. } if code == "01");
}

#[tokio::test]
async fn test_rerun_produces_identical_files() {
    let server = MockServer::start().await;
    mount_banks_and_tech(&server).await;
    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path(), &[server.uri()]);
    config.write_utf8_bom = true;

    let client = TsetmcClient::new(&config).unwrap();
    let collector = IndustryCollector::new(client, config.clone());

    collector.run().await.unwrap();
    let first = fs::read(&config.combined_csv_path).unwrap();
    collector.run().await.unwrap();

    assert_eq!(fs::read(&config.combined_csv_path).unwrap(), first);
    assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 2);
}

#[tokio::test]
async fn test_no_industries_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATIC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"staticData": []})))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), &[server.uri()]);
    let client = TsetmcClient::new(&config).unwrap();

    let report = IndustryCollector::new(client, config.clone()).run().await.unwrap();

    assert_eq!(report.industries_discovered, 0);
    assert!(!config.output_dir.exists());
    assert!(!config.combined_csv_path.exists());
}
