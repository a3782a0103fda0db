//! Tests for the export task that ties formatting and sending together

use opentsdb_export::metrics::ExportCategory;
use opentsdb_export::{run_export, Config, ExportOutcome, MetricLine, SendOutcome, TestResults};
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::time::{timeout, Duration};

fn results() -> TestResults {
    TestResults::from_json(
        &json!({
            "aggregates": [{
                "id": "serverResponseTime",
                "type": "timing",
                "stats": {
                    "min": 10, "p10": 11, "median": 20, "mean": 21,
                    "p90": 30, "p99": 35, "max": 40
                }
            }],
            "pages": [{
                "url": "https://www.example.com/",
                "rules": { "expiresmod": { "v": 70 } },
                "yslow": { "pageWeight": { "v": 2048 } }
            }],
            "domains": [{
                "domain": "www.example.com",
                "wait": { "stats": [100, 120, 140] },
                "accumulatedTime": 360,
                "count": 3
            }]
        })
        .to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_export_skipped_without_host() {
    let config = Config::default();
    assert!(config.opentsdb.host.is_none());

    let outcome = run_export(&config, &results()).await.unwrap();
    assert_eq!(outcome, ExportOutcome::Skipped);
}

#[tokio::test]
async fn test_export_sends_formatted_results() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        received
    });

    let mut config = Config::default();
    config.opentsdb.host = Some("127.0.0.1".to_string());
    config.opentsdb.port = port;
    config.opentsdb.namespace = "ci".to_string();
    config.run.url = "https://www.example.com/".to_string();

    let outcome = run_export(&config, &results()).await.unwrap();
    assert!(matches!(outcome, ExportOutcome::Sent(SendOutcome::Delivered { .. })));

    let received = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert!(received.ends_with("\n\n"));

    let lines: Vec<MetricLine> = received
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| MetricLine::parse(l).unwrap())
        .collect();

    // rule, page weight, 7 aggregate stats, 2 run counts, 3 wait stats, accumulated time, requests
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0].namespace, "ci.rules");
    assert_eq!(lines[0].get_tag("url"), Some("https//www.example.com/"));
    assert!(lines
        .iter()
        .filter(|l| l.namespace.starts_with("ci.summary"))
        .all(|l| l.get_tag("host") == Some("www.example.com")));

    let timestamp = lines[0].timestamp;
    assert!(lines.iter().all(|l| l.timestamp == timestamp));
}

#[tokio::test]
async fn test_export_reports_failure_when_target_down() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut config = Config::default();
    config.opentsdb.host = Some("127.0.0.1".to_string());
    config.opentsdb.port = port;
    config.opentsdb.data = vec![ExportCategory::Summary];

    let outcome = run_export(&config, &results()).await.unwrap();
    assert_eq!(outcome, ExportOutcome::Sent(SendOutcome::Failed));
}
