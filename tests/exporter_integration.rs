//! Exporter Integration Tests
//!
//! End-to-end scrapes against mock `/jmx` endpoints served by axum.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use hadoop_exporter::catalog::FieldCatalog;
use hadoop_exporter::collector::{CollectorRegistry, ServiceCollector};
use hadoop_exporter::server::{AppState, METRICS_PATH, create_router};
use hadoop_exporter::service::ServiceKind;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

const COMMON_CATALOG: &str = r#"
JvmMetrics:
  MemHeapUsedM: Current heap memory used in MB.
  GcCountParNew: ParNew GC count.
  GcCountConcurrentMarkSweep: ConcurrentMarkSweep GC count.
"#;

const NAMENODE_CATALOG: &str = r#"
FSNamesystem:
  HAState: Current state of the NameNode.
  CapacityTotal: Current raw capacity of DataNodes in bytes.
  MissingBlocks: Current number of missing blocks.
FSNamesystemState:
  FSState: Current state of the file system.
  TotalSyncTimes: Total milliseconds spent in sync operations.
"#;

const RESOURCEMANAGER_CATALOG: &str = r#"
ClusterMetrics:
  NumActiveNMs: Current number of active NodeManagers.
"#;

const HBASE_CATALOG: &str = r#"
IPC:
  TotalCallTime_25th_percentile: Total call time, 25th percentile.
  TotalCallTime_75th_percentile: Total call time, 75th percentile.
  TotalCallTime_99th_percentile: Total call time, 99th percentile.
"#;

/// Write a catalog directory and load it for `services`.
fn write_catalog(dir: &Path, services: &[ServiceKind]) -> FieldCatalog {
    let files = [
        ("common.yaml", COMMON_CATALOG),
        ("namenode.yaml", NAMENODE_CATALOG),
        ("resourcemanager.yaml", RESOURCEMANAGER_CATALOG),
        ("hbase.yaml", HBASE_CATALOG),
    ];
    for (name, content) in files {
        std::fs::write(dir.join(name), content).expect("Failed to write catalog file");
    }
    FieldCatalog::load(dir, services.iter().copied()).expect("Failed to load catalog")
}

fn namenode_payload() -> Value {
    json!({
        "beans": [
            {
                "name": "Hadoop:service=NameNode,name=JvmMetrics",
                "modelerType": "JvmMetrics",
                "tag.Context": "jvm",
                "MemHeapUsedM": 512.5,
                "GcCountParNew": 3,
                "GcCountConcurrentMarkSweep": 1
            },
            {
                "name": "Hadoop:service=NameNode,name=FSNamesystem",
                "modelerType": "FSNamesystem",
                "tag.HAState": "active",
                "CapacityTotal": 1000,
                "MissingBlocks": 0
            },
            {
                "name": "Hadoop:service=NameNode,name=FSNamesystemState",
                "modelerType": "org.apache.hadoop.hdfs.server.namenode.FSNamesystem",
                "FSState": "Operational",
                "TotalSyncTimes": "12 34"
            }
        ]
    })
}

fn hbase_payload() -> Value {
    json!({
        "beans": [
            {
                "name": "Hadoop:service=HBase,name=Master,sub=IPC",
                "TotalCallTime_25th_percentile": 10,
                "TotalCallTime_75th_percentile": 15
            }
        ]
    })
}

/// Start a mock Hadoop daemon farm and return its base URL.
///
/// - `/namenode/jmx` and `/hbase/jmx` serve valid payloads
/// - `/broken/jmx` answers HTTP 500
/// - `/garbage/jmx` answers a body that is not JSON
/// - `/nobeans/jmx` answers JSON without a `beans` key
async fn start_mock_jmx() -> String {
    let router = Router::new()
        .route("/namenode/jmx", get(|| async { Json(namenode_payload()) }))
        .route("/hbase/jmx", get(|| async { Json(hbase_payload()) }))
        .route(
            "/broken/jmx",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/garbage/jmx", get(|| async { "<html>not json</html>" }))
        .route("/nobeans/jmx", get(|| async { Json(json!({"status": "ok"})) }));

    serve(router).await
}

/// Serve `router` on a random local port.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://{}", addr)
}

fn collector(
    cluster: &str,
    service: ServiceKind,
    catalog: &FieldCatalog,
    url: String,
) -> ServiceCollector {
    ServiceCollector::http(
        cluster,
        service,
        catalog,
        url.parse().expect("Invalid mock url"),
        Duration::from_secs(2),
    )
    .expect("Failed to build collector")
}

/// Start the exporter over `registry` and return its base URL.
async fn start_exporter(registry: CollectorRegistry) -> String {
    let state = AppState {
        registry: Arc::new(registry),
        metrics_path: METRICS_PATH.to_string(),
    };
    serve(create_router(state)).await
}

async fn scrape(base_url: &str) -> String {
    let resp = reqwest::get(format!("{}{}", base_url, METRICS_PATH))
        .await
        .expect("Failed to scrape exporter");
    assert_eq!(resp.status(), 200);
    resp.text().await.expect("Failed to read scrape body")
}

/// Sample lines of the exposition, without comments.
fn samples(body: &str) -> Vec<&str> {
    body.lines()
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .collect()
}

// =============================================================================
// Scrape Tests
// =============================================================================

#[tokio::test]
async fn test_scrape_namenode() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path(), &[ServiceKind::NameNode]);
    let jmx = start_mock_jmx().await;

    let mut registry = CollectorRegistry::new();
    registry.register(collector(
        "prod",
        ServiceKind::NameNode,
        &catalog,
        format!("{}/namenode/jmx", jmx),
    ));
    let exporter = start_exporter(registry).await;

    let body = scrape(&exporter).await;
    let lines = samples(&body);

    for expected in [
        r#"hadoop_namenode_fsname_system_ha_state{cluster="prod"} 1"#,
        r#"hadoop_namenode_fsname_system_capacity_bytes{cluster="prod",mode="Total"} 1000"#,
        r#"hadoop_namenode_fsname_system_missing_blocks{cluster="prod"} 0"#,
        r#"hadoop_namenode_fsname_system_fs_state{cluster="prod"} 1"#,
        r#"hadoop_namenode_fsname_system_total_sync_times{cluster="prod"} 1234"#,
        r#"hadoop_namenode_jvm_mem_used_mebibytes{cluster="prod",mode="heap"} 512.5"#,
        r#"hadoop_namenode_jvm_gc_count{cluster="prod",type="ParNew"} 3"#,
        r#"hadoop_namenode_jvm_gc_count{cluster="prod",type="ConcurrentMarkSweep"} 1"#,
        r#"hadoop_exporter_target_up{cluster="prod",service="namenode"} 1"#,
    ] {
        assert!(lines.contains(&expected), "missing `{expected}` in:\n{body}");
    }

    // Every service family carries `cluster` as its first label.
    for line in lines.iter().filter(|l| l.starts_with("hadoop_namenode_")) {
        assert!(line.contains(r#"{cluster="prod""#), "bad labels: {line}");
    }

    // Two GC fields aggregate into one family.
    assert_eq!(body.matches("# TYPE hadoop_namenode_jvm_gc_count gauge").count(), 1);
}

#[tokio::test]
async fn test_failed_targets_do_not_affect_siblings() {
    let dir = TempDir::new().unwrap();
    let services = [
        ServiceKind::NameNode,
        ServiceKind::ResourceManager,
        ServiceKind::HBase,
    ];
    let catalog = write_catalog(dir.path(), &services);
    let jmx = start_mock_jmx().await;

    let mut registry = CollectorRegistry::new();
    registry.register(collector(
        "prod",
        ServiceKind::ResourceManager,
        &catalog,
        format!("{}/broken/jmx", jmx),
    ));
    registry.register(collector(
        "prod",
        ServiceKind::NameNode,
        &catalog,
        format!("{}/namenode/jmx", jmx),
    ));
    registry.register(collector(
        "prod",
        ServiceKind::HBase,
        &catalog,
        format!("{}/garbage/jmx", jmx),
    ));
    let exporter = start_exporter(registry).await;

    let body = scrape(&exporter).await;
    let lines = samples(&body);

    assert!(!body.contains("hadoop_resourcemanager_"));
    assert!(!body.contains("hadoop_hbase_"));
    assert!(lines.contains(&r#"hadoop_namenode_fsname_system_ha_state{cluster="prod"} 1"#));

    assert!(lines.contains(&r#"hadoop_exporter_target_up{cluster="prod",service="resourcemanager"} 0"#));
    assert!(lines.contains(&r#"hadoop_exporter_target_up{cluster="prod",service="namenode"} 1"#));
    assert!(lines.contains(&r#"hadoop_exporter_target_up{cluster="prod",service="hbase"} 0"#));
}

#[tokio::test]
async fn test_missing_beans_key_yields_no_families() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path(), &[ServiceKind::NameNode]);
    let jmx = start_mock_jmx().await;

    let mut registry = CollectorRegistry::new();
    registry.register(collector(
        "prod",
        ServiceKind::NameNode,
        &catalog,
        format!("{}/nobeans/jmx", jmx),
    ));
    let exporter = start_exporter(registry).await;

    let body = scrape(&exporter).await;
    assert!(!body.contains("hadoop_namenode_"));
    assert!(body.contains(r#"hadoop_exporter_target_up{cluster="prod",service="namenode"} 0"#));
}

#[tokio::test]
async fn test_unreachable_target() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path(), &[ServiceKind::NameNode]);

    // Bind then drop a listener to get a port nobody serves.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut registry = CollectorRegistry::new();
    registry.register(collector(
        "prod",
        ServiceKind::NameNode,
        &catalog,
        format!("http://{}/jmx", addr),
    ));
    let exporter = start_exporter(registry).await;

    let body = scrape(&exporter).await;
    assert!(body.contains(r#"hadoop_exporter_target_up{cluster="prod",service="namenode"} 0"#));
}

#[tokio::test]
async fn test_scrape_hbase_histogram() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path(), &[ServiceKind::HBase]);
    let jmx = start_mock_jmx().await;

    let mut registry = CollectorRegistry::new();
    registry.register(collector(
        "prod",
        ServiceKind::HBase,
        &catalog,
        format!("{}/hbase/jmx", jmx),
    ));
    let exporter = start_exporter(registry).await;

    let body = scrape(&exporter).await;
    let lines = samples(&body);

    assert!(body.contains("# TYPE hadoop_hbase_call_time_total histogram"));
    assert!(lines.contains(&r#"hadoop_hbase_call_time_total_count{cluster="prod"} 2"#));
    assert!(lines.contains(&r#"hadoop_hbase_call_time_total_sum{cluster="prod"} 25"#));
}

#[tokio::test]
async fn test_same_service_in_two_clusters() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path(), &[ServiceKind::NameNode]);
    let jmx = start_mock_jmx().await;

    let mut registry = CollectorRegistry::new();
    for cluster in ["prod", "dr"] {
        registry.register(collector(
            cluster,
            ServiceKind::NameNode,
            &catalog,
            format!("{}/namenode/jmx", jmx),
        ));
    }
    let exporter = start_exporter(registry).await;

    let body = scrape(&exporter).await;
    let lines = samples(&body);

    assert_eq!(
        body.matches("# TYPE hadoop_namenode_fsname_system_ha_state gauge")
            .count(),
        1
    );
    assert!(lines.contains(&r#"hadoop_namenode_fsname_system_ha_state{cluster="prod"} 1"#));
    assert!(lines.contains(&r#"hadoop_namenode_fsname_system_ha_state{cluster="dr"} 1"#));
}

#[tokio::test]
async fn test_label_order_stable_across_scrapes() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path(), &[ServiceKind::NameNode]);
    let jmx = start_mock_jmx().await;

    let mut registry = CollectorRegistry::new();
    registry.register(collector(
        "prod",
        ServiceKind::NameNode,
        &catalog,
        format!("{}/namenode/jmx", jmx),
    ));
    let exporter = start_exporter(registry).await;

    let strip = |body: &str| -> Vec<String> {
        samples(body)
            .into_iter()
            .filter(|line| !line.starts_with("hadoop_exporter_scrape_duration_seconds"))
            .map(str::to_string)
            .collect()
    };

    let first = strip(&scrape(&exporter).await);
    let second = strip(&scrape(&exporter).await);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

// =============================================================================
// Health & Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_healthz() {
    let exporter = start_exporter(CollectorRegistry::new()).await;

    let resp = reqwest::get(format!("{}/healthz", exporter))
        .await
        .expect("Failed to send healthz request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse healthz response");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["collectors"], 0);

    // No collectors, no families.
    assert!(samples(&scrape(&exporter).await).is_empty());
}

#[test]
fn test_bundled_catalog_loads() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("catalog");
    let services = [
        ServiceKind::NameNode,
        ServiceKind::DataNode,
        ServiceKind::JournalNode,
        ServiceKind::ResourceManager,
        ServiceKind::NodeManager,
        ServiceKind::MapReduce,
        ServiceKind::HBase,
    ];
    let catalog = FieldCatalog::load(&dir, services).expect("Bundled catalog must load");

    for service in services {
        let collector = ServiceCollector::new(
            "prod",
            service,
            &catalog,
            Arc::new(hadoop_exporter::fetch::StaticBeanSource::default()),
        )
        .expect("Failed to build collector");
        assert!(collector.schema().family_count() > 0, "{service} has no families");
    }
}
