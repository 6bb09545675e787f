//! HTTP collaborator tests against mock UniProt and MyGene services

use ferronet_ingest::clients::uniprot::{FROM_KEGG, TO_SWISS_PROT};
use ferronet_ingest::clients::{IdMappingClient, MappingRequest, MyGeneClient};
use ferronet_ingest::config::{MyGeneConfig, UniProtConfig};
use ferronet_ingest::IngestError;
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferronet_ingest=debug")
        .with_test_writer()
        .try_init();
}

fn uniprot_config(server: &MockServer) -> UniProtConfig {
    UniProtConfig {
        base_url: server.uri(),
        poll_interval_ms: 5,
        max_poll_interval_ms: 20,
        max_polls: 10,
        max_retries: 1,
        ..UniProtConfig::default()
    }
}

async fn mount_submit(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/idmapping/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": job_id })))
        .mount(server)
        .await;
}

// ============================================================================
// UniProt ID mapping
// ============================================================================

#[tokio::test]
async fn test_job_polls_until_finished_then_fetches_results() {
    init_tracing();
    let server = MockServer::start().await;
    mount_submit(&server, "job-1").await;

    Mock::given(method("GET"))
        .and(path("/idmapping/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobStatus": "RUNNING" })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/idmapping/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobStatus": "FINISHED" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/idmapping/results/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "from": "hsa:2879", "to": { "primaryAccession": "P36969" } },
                { "from": "hsa:6520", "to": { "primaryAccession": "Q9UPY5" } }
            ],
            "failedIds": ["hsa:999999"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = IdMappingClient::new(uniprot_config(&server)).unwrap();
    let request = MappingRequest::new(
        FROM_KEGG,
        TO_SWISS_PROT,
        vec!["hsa:2879".into(), "hsa:6520".into(), "hsa:999999".into()],
    )
    .with_tax_id(9606);

    let results = client.run_job(&request).await.unwrap();

    assert_eq!(results.mapped["hsa:2879"], "P36969");
    assert_eq!(results.mapped["hsa:6520"], "Q9UPY5");
    assert_eq!(results.failed, vec!["hsa:999999"]);
}

#[tokio::test]
async fn test_error_status_fails_the_job() {
    init_tracing();
    let server = MockServer::start().await;
    mount_submit(&server, "job-2").await;

    Mock::given(method("GET"))
        .and(path("/idmapping/status/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobStatus": "ERROR" })))
        .mount(&server)
        .await;

    let client = IdMappingClient::new(uniprot_config(&server)).unwrap();
    let request = MappingRequest::new(FROM_KEGG, TO_SWISS_PROT, vec!["hsa:2879".into()]);

    let err = client.run_job(&request).await.unwrap_err();
    assert!(
        matches!(&err, IngestError::JobFailed { job_id, status } if job_id == "job-2" && status == "ERROR"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_poll_limit_stops_a_stuck_job() {
    init_tracing();
    let server = MockServer::start().await;
    mount_submit(&server, "job-3").await;

    Mock::given(method("GET"))
        .and(path("/idmapping/status/job-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobStatus": "QUEUED" })))
        .mount(&server)
        .await;

    let config = UniProtConfig {
        max_polls: 3,
        ..uniprot_config(&server)
    };
    let client = IdMappingClient::new(config).unwrap();
    let request = MappingRequest::new(FROM_KEGG, TO_SWISS_PROT, vec!["hsa:2879".into()]);

    let err = client.run_job(&request).await.unwrap_err();
    assert!(matches!(err, IngestError::PollLimitExceeded { polls: 3, .. }));
}

#[tokio::test]
async fn test_cancellation_interrupts_polling() {
    init_tracing();
    let server = MockServer::start().await;
    mount_submit(&server, "job-4").await;

    Mock::given(method("GET"))
        .and(path("/idmapping/status/job-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobStatus": "RUNNING" })))
        .mount(&server)
        .await;

    let config = UniProtConfig {
        poll_interval_ms: 50,
        max_poll_interval_ms: 50,
        max_polls: 1000,
        ..uniprot_config(&server)
    };
    let client = IdMappingClient::new(config).unwrap();
    let token = client.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        token.cancel();
    });

    let request = MappingRequest::new(FROM_KEGG, TO_SWISS_PROT, vec!["hsa:2879".into()]);
    let err = client.run_job(&request).await.unwrap_err();
    assert!(matches!(err, IngestError::Cancelled));
}

#[tokio::test]
async fn test_failed_batch_is_recorded_and_others_continue() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/idmapping/run"))
        .and(body_string_contains("hsa%3A3"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_submit(&server, "job-5").await;
    Mock::given(method("GET"))
        .and(path("/idmapping/status/job-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "from": "hsa:1", "to": { "primaryAccession": "P00001" } },
                { "from": "hsa:2", "to": { "primaryAccession": "P00002" } }
            ]
        })))
        .mount(&server)
        .await;

    let config = UniProtConfig {
        batch_size: 2,
        ..uniprot_config(&server)
    };
    let client = IdMappingClient::new(config).unwrap();
    let ids: Vec<String> = ["hsa:1", "hsa:2", "hsa:3"].iter().map(|id| id.to_string()).collect();

    let results = client
        .batch_convert(FROM_KEGG, TO_SWISS_PROT, &ids, Some(9606))
        .await
        .unwrap();

    assert_eq!(results.mapped.len(), 2);
    assert_eq!(results.mapped["hsa:2"], "P00002");
    assert_eq!(results.failed, vec!["hsa:3"]);
}

// ============================================================================
// MyGene
// ============================================================================

#[tokio::test]
async fn test_mygene_batches_and_skips_failed_batch() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_string_contains("\"slc7a11\""))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "query": "gpx4", "_id": "2879", "symbol": "GPX4",
                "ensembl": { "gene": "ENSG00000167468" },
                "uniprot": { "Swiss-Prot": "P36969" }
            },
            { "query": "acsl4", "_id": "2182", "symbol": "ACSL4", "uniprot": { "Swiss-Prot": "O60488" } }
        ])))
        .mount(&server)
        .await;

    let config = MyGeneConfig {
        base_url: server.uri(),
        batch_size: 2,
        max_retries: 1,
        ..MyGeneConfig::default()
    };
    let client = MyGeneClient::new(config).unwrap();
    let symbols: Vec<String> = ["gpx4", "acsl4", "slc7a11"].iter().map(|s| s.to_string()).collect();

    let hits = client.query_symbols(&symbols).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits.failed_batches, 1);
    assert_eq!(hits.get("GPX4").and_then(|hit| hit.uniprot_id.as_deref()), Some("P36969"));
    assert_eq!(hits.get("gpx4").and_then(|hit| hit.ensembl_id.as_deref()), Some("ENSG00000167468"));
    assert!(hits.get("slc7a11").is_none());
}
