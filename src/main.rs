//! TracerX AI batch runner.
//! Analyzes each batch file given on the command line (`-` reads stdin), in
//! order, against one shared history, then prints the history summary and
//! regional risk. Every output is one JSON line on stdout.

use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracerx_ai::{
    config::ServiceConfig,
    logging::StructuredLogger,
    service::{AnalyzeRequest, ScanService},
    storage::{self, DurableStore, NullStore},
};
use tracing::{info, warn};

const DEV_SECRET: &[u8] = b"tracerx-dev-secret";

fn read_batch(path: &str) -> Result<AnalyzeRequest, Box<dyn std::error::Error + Send + Sync>> {
    let mut text = String::new();
    if path == "-" {
        std::io::stdin().read_to_string(&mut text)?;
    } else {
        text = std::fs::read_to_string(path)?;
    }
    // Either a request body `{"scan_data": [...]}` or a bare array of rows.
    let value: Value = serde_json::from_str(&text)?;
    Ok(match value {
        Value::Array(_) => AnalyzeRequest {
            scan_data: Some(value),
        },
        other => serde_json::from_value(other)?,
    })
}

fn open_store(config: &ServiceConfig) -> Arc<dyn DurableStore> {
    let secret = match std::env::var(&config.store.secret_env) {
        Ok(s) if !s.is_empty() => s.into_bytes(),
        _ => {
            warn!(var = %config.store.secret_env, "store secret not set; using development secret");
            DEV_SECRET.to_vec()
        }
    };
    match storage::open(&config.store, &secret) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "durable store unavailable; records stay in memory only");
            Arc::new(NullStore)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("TRACERX_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = ServiceConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), "TracerX AI starting");

    let store = open_store(&config);
    let service = ScanService::new(&config, store)?;

    let inputs: Vec<String> = std::env::args().skip(1).collect();
    if inputs.is_empty() {
        warn!("no batch files given; reporting empty history");
    }

    let mut out = std::io::stdout().lock();
    for path in &inputs {
        let request = match read_batch(path) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path, error = %e, "unreadable batch");
                StructuredLogger::emit_json(&json!({ "source": path, "error": e.to_string() }), &mut out)?;
                continue;
            }
        };
        match service.analyze_request(&request) {
            Ok(response) => StructuredLogger::emit_json(&response, &mut out)?,
            Err(e) => {
                warn!(path = %path, error = %e, "batch rejected");
                StructuredLogger::emit_json(&json!({ "source": path, "error": e.to_string() }), &mut out)?;
            }
        }
    }

    let history = service.get_history();
    StructuredLogger::emit_json(
        &json!({ "total_scans": history.total_scans, "timestamp": history.timestamp }),
        &mut out,
    )?;
    let risk = service.predict_risk();
    let levels = service.risk().levels(&risk);
    StructuredLogger::emit_json(
        &json!({ "region_risk": risk.region_risk, "levels": levels, "generated_at": risk.generated_at }),
        &mut out,
    )?;

    info!(
        batches = inputs.len(),
        total_scans = history.total_scans,
        store_failures = service.detector().store_failures(),
        "TracerX AI run complete"
    );
    Ok(())
}
