use std::sync::Arc;
use std::time::Duration;

use foldmcp_client::alphafold::AlphaFoldClient;
use foldmcp_client::http::{ApiClient, ApiRequest, ClientSettings, HttpConfig, RetryPolicy};
use foldmcp_client::uniprot::{UniProtClient, UniProtSearchParams};
use foldmcp_core::CacheDb;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prediction_body(accession: &str) -> serde_json::Value {
    json!([{
        "entryId": format!("AF-{accession}-F1"),
        "uniprotAccession": accession,
        "uniprotId": "STRP1_HUMAN",
        "uniprotDescription": "Striatin-interacting protein 1",
        "taxId": 9606,
        "organismScientificName": "Homo sapiens",
        "uniprotStart": 1,
        "uniprotEnd": 837,
        "uniprotSequence": "MEPAVGGPGPLIVNNKQPQPPPPPPP",
        "modelCreatedDate": "2022-06-01",
        "latestVersion": 4,
        "allVersions": [1, 2, 3, 4],
        "bcifUrl": "https://alphafold.ebi.ac.uk/files/a.bcif",
        "cifUrl": "https://alphafold.ebi.ac.uk/files/a.cif",
        "pdbUrl": "https://alphafold.ebi.ac.uk/files/a.pdb",
        "paeImageUrl": "https://alphafold.ebi.ac.uk/files/a.png",
        "paeDocUrl": "https://alphafold.ebi.ac.uk/files/a.json"
    }])
}

async fn api_client(retries: u32) -> ApiClient {
    let cache = CacheDb::open_in_memory().await.unwrap();
    let settings = ClientSettings {
        http: HttpConfig { timeout: Duration::from_secs(2), ..Default::default() },
        retry: RetryPolicy { retries, backoff_factor: 0.01, pre_delay: None },
        default_cache_ttl: 86_400,
        ..Default::default()
    };
    let transport = Arc::new(foldmcp_client::http::HttpTransport::new(&settings.http).unwrap());
    ApiClient::new(Arc::new(cache), transport, Arc::new(foldmcp_client::http::TokioSleeper), settings)
}

#[tokio::test]
async fn prediction_is_served_from_cache_on_second_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prediction/Q5VSL9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_body("Q5VSL9")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AlphaFoldClient::new(api_client(0).await, server.uri());

    let first = client.prediction("Q5VSL9", None).await.unwrap().unwrap();
    let second = client.prediction("Q5VSL9", None).await.unwrap().unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].entry_id, "AF-Q5VSL9-F1");
    assert_eq!(first, second);
}

#[tokio::test]
async fn zero_ttl_always_hits_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&server)
        .await;

    let client = api_client(0).await;
    let url = format!("{}/status", server.uri());

    for _ in 0..2 {
        let parsed = client.request_json(ApiRequest::get(&url).with_cache_ttl(0)).await.unwrap();
        assert_eq!(parsed, Ok(json!({"text": "ok"})));
    }
}

#[tokio::test]
async fn error_status_is_returned_and_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prediction/P00000"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(2)
        .mount(&server)
        .await;

    let client = AlphaFoldClient::new(api_client(3).await, server.uri());

    for _ in 0..2 {
        let err = client.prediction("P00000", None).await.unwrap().unwrap_err();
        assert_eq!(err.code, 404);
        assert_eq!(err.message, "Not Found");
    }
}

#[tokio::test]
async fn sequence_checksum_sent_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prediction/Q5VSL9"))
        .and(query_param("sequence_checksum", "5F1D2B5A0D3C3E7B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_body("Q5VSL9")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AlphaFoldClient::new(api_client(0).await, server.uri());

    let entries = client.prediction("Q5VSL9", Some("5F1D2B5A0D3C3E7B")).await.unwrap().unwrap();
    assert_eq!(entries[0].uniprot_accession, "Q5VSL9");
}

#[tokio::test]
async fn annotations_default_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/annotations/Q5VSL9"))
        .and(query_param("annotation_type", "MUTAGEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accession": "Q5VSL9",
            "id": "STRP1_HUMAN",
            "sequence": "MEPAV",
            "annotation": [{
                "type": "MUTAGEN",
                "description": "AlphaMissense",
                "source_name": "AlphaMissense",
                "evidence": "COMPUTATIONAL/PREDICTED",
                "regions": [{"start": 1, "end": 5, "annotation_value": [0.2, 0.4, 0.6, 0.8, 1.0]}]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AlphaFoldClient::new(api_client(0).await, server.uri());

    let response = client.annotations("Q5VSL9", None).await.unwrap().unwrap();
    assert_eq!(response.id, "STRP1_HUMAN");
    assert_eq!(response.annotation[0].kind, "MUTAGEN");
}

#[tokio::test]
async fn uniprot_search_sends_query_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "gene:BRCA1"))
        .and(query_param("size", "2"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"primaryAccession": "P38398"}, {"primaryAccession": "Q3YB07"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = UniProtClient::new(api_client(0).await, server.uri());
    let params = UniProtSearchParams { size: Some(2), ..UniProtSearchParams::new("gene:BRCA1") };

    let response = client.search(&params).await.unwrap().unwrap();
    assert_eq!(response.results.len(), 2);
}

#[tokio::test]
async fn csv_body_is_sniffed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("accession,length\nQ5VSL9,837\n"))
        .mount(&server)
        .await;

    let client = api_client(0).await;

    let parsed = client
        .request_json(ApiRequest::get(format!("{}/export", server.uri())))
        .await
        .unwrap();

    assert_eq!(parsed, Ok(json!([{"accession": "Q5VSL9", "length": "837"}])));
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/lookup"))
        .and(wiremock::matchers::body_json(json!({"ids": ["Q5VSL9"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(0).await;
    let body = serde_json::from_value(json!({"ids": ["Q5VSL9"]})).unwrap();

    let parsed = client
        .request_json(
            ApiRequest::post(format!("{}/lookup", server.uri()))
                .with_body(foldmcp_client::http::RequestBody::Raw(body)),
        )
        .await
        .unwrap();

    assert_eq!(parsed, Ok(json!({"found": 1})));
}

#[tokio::test]
async fn unreachable_host_exhausts_retries() {
    let server = MockServer::start().await;
    let url = format!("{}/gone", server.uri());
    drop(server);

    let client = api_client(1).await;

    let parsed = client.request_json(ApiRequest::get(url)).await.unwrap();

    let err = parsed.unwrap_err();
    assert_eq!(err.code, 599);
    assert!(err.message.starts_with("All retry attempts failed"));
}
