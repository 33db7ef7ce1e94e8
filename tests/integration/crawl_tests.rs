//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock venue sites and test the full
//! crawl cycle end-to-end: fetch, extract, validate, store, export.

use paper_harvest::config::{
    load_config_with_hash, BrowserConfig, Config, CrawlerConfig, FetchConfig, OutputConfig,
    UserAgentConfig,
};
use paper_harvest::crawler::{build_engine, crawl, run_jobs, run_recorded, CrawlJob};
use paper_harvest::output::{export_partition, read_export, ExportOutcome};
use paper_harvest::storage::{open_corpus, RunStatus};
use paper_harvest::venues::{neurips_site, Interspeech};
use paper_harvest::{CrawlState, HarvestError, Partition};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to `db_path`
fn create_test_config(db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            detail_concurrency: 4,
            max_listing_pages: 10,
            minimum_request_interval: 5, // Very short for testing
        },
        fetch: FetchConfig {
            request_timeout: 5,
            max_attempts: 2,
            initial_backoff: 10,
            max_backoff: 20,
            backoff_multiplier: 2.0,
        },
        browser: BrowserConfig {
            enabled: false,
            ..BrowserConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.display().to_string(),
            export_dir: "./test_exports".to_string(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

fn interspeech_index() -> String {
    r#"<html><body>
<div class="nav"><a href="../index.html">Archive</a></div>
<div class="w3-card">
  <a href="engines.html"><p>Speech from Engines</p></a>
  <a href="engines.pdf">PDF</a>
  <a href="imitation.html"><p>The Imitation Game</p></a>
  <a href="untitled.html"><p>Withdrawn</p></a>
</div>
</body></html>"#
        .to_string()
}

fn interspeech_paper(title: &str, authors: &str, abstract_text: Option<&str>) -> String {
    let abstract_block = abstract_text
        .map(|text| format!(r#"<div id="abstract"><p>{}</p></div>"#, text))
        .unwrap_or_default();
    format!(
        r#"<html><body>
<div id="global-info"><h3>{title}</h3><h5>{authors}</h5></div>
{abstract_block}
</body></html>"#
    )
}

/// Mounts an Interspeech year with two complete papers and one without an abstract
async fn mount_interspeech_year(server: &MockServer, year: u16) {
    let base = format!("/interspeech_{}", year);

    Mock::given(method("GET"))
        .and(path(format!("{}/index.html", base)))
        .respond_with(html(&interspeech_index()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/engines.html", base)))
        .respond_with(html(&interspeech_paper(
            "Speech from Engines",
            "Ada Lovelace, Charles Babbage",
            Some("Engines can talk."),
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/imitation.html", base)))
        .respond_with(html(&interspeech_paper(
            "The Imitation Game",
            "Alan Turing",
            Some("Can machines think?"),
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/untitled.html", base)))
        .respond_with(html(&interspeech_paper("Withdrawn", "Nobody", None)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_stores_valid_records() {
    let mock_server = MockServer::start().await;
    mount_interspeech_year(&mock_server, 2023).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let engine = build_engine(&config).unwrap();
    let job = CrawlJob::new(Box::new(Interspeech::with_origin(mock_server.uri())), 2023);
    let mut corpus = open_corpus(&db_path).unwrap();

    let report = run_recorded(&engine, &job, &mut corpus, "hash-1")
        .await
        .unwrap();

    assert_eq!(report.state, CrawlState::Terminated);
    assert_eq!(report.listing_pages, 1);
    assert_eq!(report.details_dispatched, 3);
    assert_eq!(report.records_emitted, 2);
    assert_eq!(report.records_dropped, 1);
    assert_eq!(report.fetch_failures, 0);

    let partition = Partition::new("Interspeech", 2023);
    let records = corpus.load_partition(&partition).unwrap();
    assert_eq!(records.len(), 2);

    let engines = records
        .iter()
        .find(|record| record.title == "Speech from Engines")
        .expect("engines paper stored");
    assert_eq!(engines.authors, "Ada Lovelace, Charles Babbage");
    assert_eq!(engines.abstract_text, "Engines can talk.");
    assert_eq!(engines.venue, "Interspeech");
    assert_eq!(engines.year, 2023);
    assert_eq!(
        engines.source_url,
        format!("{}/interspeech_2023/engines.html", mock_server.uri())
    );

    let run = corpus.latest_run(&partition).unwrap().expect("run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash-1");
    assert_eq!(run.counts.records_emitted, 2);
    assert_eq!(run.counts.records_dropped, 1);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_rerun_does_not_duplicate_records() {
    let mock_server = MockServer::start().await;
    mount_interspeech_year(&mock_server, 2023).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let engine = build_engine(&config).unwrap();
    let job = CrawlJob::new(Box::new(Interspeech::with_origin(mock_server.uri())), 2023);
    let mut corpus = open_corpus(&db_path).unwrap();

    let first = run_recorded(&engine, &job, &mut corpus, "hash").await.unwrap();
    let second = run_recorded(&engine, &job, &mut corpus, "hash").await.unwrap();

    assert_eq!(first.records_emitted, 2);
    assert_eq!(second.records_emitted, 0);
    assert_eq!(second.records_existing, 2);

    let partition = Partition::new("Interspeech", 2023);
    assert_eq!(corpus.count_records(&partition).unwrap(), 2);

    let latest = corpus.latest_run(&partition).unwrap().unwrap();
    assert_eq!(latest.status, RunStatus::Completed);
    assert_eq!(latest.counts.records_emitted, 0);
}

#[tokio::test]
async fn test_failed_detail_does_not_affect_siblings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/interspeech_2022/index.html"))
        .respond_with(html(&interspeech_index()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/interspeech_2022/engines.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/interspeech_2022/imitation.html"))
        .respond_with(html(&interspeech_paper(
            "The Imitation Game",
            "Alan Turing",
            Some("Can machines think?"),
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/interspeech_2022/untitled.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let engine = build_engine(&config).unwrap();
    let job = CrawlJob::new(Box::new(Interspeech::with_origin(mock_server.uri())), 2022);
    let mut corpus = open_corpus(&db_path).unwrap();

    let report = run_recorded(&engine, &job, &mut corpus, "hash").await.unwrap();

    assert_eq!(report.state, CrawlState::Terminated);
    assert_eq!(report.records_emitted, 1);
    assert_eq!(report.fetch_failures, 2);

    let records = corpus
        .load_partition(&Partition::new("Interspeech", 2022))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "The Imitation Game");
}

#[tokio::test]
async fn test_schedule_site_follows_allowed_cards() {
    let mock_server = MockServer::start().await;

    // Event pages are mounted first so they win over the bare schedule path
    Mock::given(method("GET"))
        .and(path("/Conferences/2023/Schedule"))
        .and(query_param("showEvent", "101"))
        .respond_with(html(
            r#"<html><body><div id="main">
  <div class="header">Schedule</div>
  <div class="container"><div class="authors">
    <button class="btn">Grace Hopper</button><button class="btn">Ada Lovelace</button>
  </div></div>
  <div class="abstractContainer"><p>Compilers for everyone.</p></div>
</div></body></html>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Conferences/2023/Schedule"))
        .and(query_param("showEvent", "102"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Conferences/2023/Schedule"))
        .respond_with(html(
            r#"<html><body><div id="main">
<div id="maincard_101" class="maincard">
  <div class="maincardHeader">Poster<i class="fa"></i></div>
  <div class="maincardHeader">Hall J #101</div>
  <div class="maincardBody">A Compiler for Every Machine</div>
</div>
<div id="maincard_102" class="maincard">
  <div class="maincardHeader">Workshop<i class="fa"></i></div>
  <div class="maincardHeader">Room 1</div>
  <div class="maincardBody">Workshop on Things</div>
</div>
</div></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let engine = build_engine(&config).unwrap();
    let job = CrawlJob::new(Box::new(neurips_site().with_origin(mock_server.uri())), 2023);
    let mut corpus = open_corpus(&db_path).unwrap();

    let report = run_recorded(&engine, &job, &mut corpus, "hash").await.unwrap();
    assert_eq!(report.details_dispatched, 1);
    assert_eq!(report.records_emitted, 1);

    let records = corpus
        .load_partition(&Partition::new("NeurIPS", 2023))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "A Compiler for Every Machine");
    assert_eq!(records[0].authors, "Grace Hopper, Ada Lovelace");
    assert_eq!(records[0].abstract_text, "Compilers for everyone.");
}

#[tokio::test]
async fn test_concurrent_jobs_write_separate_partitions() {
    let mock_server = MockServer::start().await;
    mount_interspeech_year(&mock_server, 2022).await;
    mount_interspeech_year(&mock_server, 2023).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let engine = build_engine(&config).unwrap();
    let jobs = vec![
        CrawlJob::new(Box::new(Interspeech::with_origin(mock_server.uri())), 2022),
        CrawlJob::new(Box::new(Interspeech::with_origin(mock_server.uri())), 2023),
    ];

    let results = run_jobs(&engine, jobs, &db_path, "hash").await;
    assert_eq!(results.len(), 2);
    for result in &results {
        let report = result.as_ref().unwrap();
        assert_eq!(report.records_emitted, 2);
    }
    assert_eq!(results[0].as_ref().unwrap().partition.year, 2022);
    assert_eq!(results[1].as_ref().unwrap().partition.year, 2023);

    let corpus = open_corpus(&db_path).unwrap();
    let partitions = corpus.list_partitions().unwrap();
    assert_eq!(
        partitions,
        vec![
            (Partition::new("Interspeech", 2022), 2),
            (Partition::new("Interspeech", 2023), 2),
        ]
    );
}

#[tokio::test]
async fn test_unsupported_year_is_recorded_as_failed_run() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let error = crawl(&config, "hash", "Interspeech", 1999).await.unwrap_err();
    assert!(error.is_configuration_error());
    assert!(matches!(
        error,
        HarvestError::UnsupportedVenueYear { year: 1999, .. }
    ));

    let corpus = open_corpus(&db_path).unwrap();
    let partition = Partition::new("Interspeech", 1999);
    let run = corpus.latest_run(&partition).unwrap().expect("run recorded");
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(corpus.count_records(&partition).unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_venue_is_a_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let config = create_test_config(&db_path);

    let error = crawl(&config, "hash", "SIGBOVIK", 2023).await.unwrap_err();
    assert!(error.is_configuration_error());
    assert!(matches!(error, HarvestError::UnsupportedVenue(_)));
}

#[tokio::test]
async fn test_export_after_crawl() {
    let mock_server = MockServer::start().await;
    mount_interspeech_year(&mock_server, 2023).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("corpus.db");
    let export_dir = temp_dir.path().join("exports");
    let config = create_test_config(&db_path);

    let engine = build_engine(&config).unwrap();
    let job = CrawlJob::new(Box::new(Interspeech::with_origin(mock_server.uri())), 2023);
    let mut corpus = open_corpus(&db_path).unwrap();
    run_recorded(&engine, &job, &mut corpus, "hash").await.unwrap();

    let partition = Partition::new("Interspeech", 2023);
    let first = export_partition(&corpus, &partition, &export_dir).unwrap();
    assert!(matches!(first, ExportOutcome::Written { records: 2, .. }));
    assert!(first.path().ends_with("Interspeech_2023.json"));

    let exported = read_export(first.path()).unwrap();
    assert_eq!(exported, corpus.load_partition(&partition).unwrap());

    // A rerun adds nothing, so the export is left alone
    run_recorded(&engine, &job, &mut corpus, "hash").await.unwrap();
    let second = export_partition(&corpus, &partition, &export_dir).unwrap();
    assert!(matches!(second, ExportOutcome::Unchanged { records: 2, .. }));
}

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("harvest.toml");
    std::fs::write(
        &config_path,
        r#"
[crawler]
detail-concurrency = 8
minimum-request-interval = 1500

[browser]
enabled = false

[user-agent]
crawler-name = "PaperHarvest"
crawler-version = "1.0.0"
contact-url = "https://example.com/about"
contact-email = "crawler@example.com"

[output]
database-path = "./corpus.db"
"#,
    )
    .unwrap();

    let (config, hash) = load_config_with_hash(&config_path).unwrap();
    assert_eq!(config.crawler.detail_concurrency, 8);
    assert_eq!(config.crawler.max_listing_pages, 200);
    assert_eq!(config.crawler.minimum_request_interval, 1500);
    assert_eq!(config.fetch.max_attempts, 3);
    assert!(!config.browser.enabled);
    assert_eq!(config.output.export_dir, "./data");
    assert_eq!(hash.len(), 64);
}
