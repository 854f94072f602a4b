use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::OnceCell;

use crate::decoder::RecordKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RefreshOutcome {
    Success,
    Failure,
}

pub struct Metrics {
    refresh_total: HashMap<RefreshOutcome, u64>,
    refresh_joined_total: u64,
    decode_skipped_total: HashMap<RecordKind, u64>,
}

static METRICS: OnceCell<Mutex<Metrics>> = OnceCell::new();

fn get() -> &'static Mutex<Metrics> {
    METRICS.get_or_init(|| {
        Mutex::new(Metrics {
            refresh_total: HashMap::new(),
            refresh_joined_total: 0,
            decode_skipped_total: HashMap::new(),
        })
    })
}

fn with<R>(f: impl FnOnce(&mut Metrics) -> R) -> R {
    let mut m = get().lock().unwrap_or_else(|e| e.into_inner());
    f(&mut m)
}

pub fn record_refresh(outcome: RefreshOutcome) {
    with(|m| *m.refresh_total.entry(outcome).or_insert(0) += 1);
}

/// A refresh request that joined one already in flight
pub fn record_refresh_joined() {
    with(|m| m.refresh_joined_total += 1);
}

pub fn record_decode_skip(kind: RecordKind) {
    with(|m| *m.decode_skipped_total.entry(kind).or_insert(0) += 1);
}

pub fn decode_skips(kind: RecordKind) -> u64 {
    with(|m| m.decode_skipped_total.get(&kind).copied().unwrap_or(0))
}

pub fn snapshot_as_json(db_path: Option<&str>) -> serde_json::Value {
    use serde_json::json;

    let (refresh, joined, skipped) = with(|m| {
        let refresh: Vec<serde_json::Value> = m
            .refresh_total
            .iter()
            .map(|(outcome, count)| {
                json!({
                    "outcome": match outcome {
                        RefreshOutcome::Success => "success",
                        RefreshOutcome::Failure => "failure",
                    },
                    "count": count
                })
            })
            .collect();

        let skipped: Vec<serde_json::Value> = RecordKind::ALL
            .iter()
            .filter_map(|kind| {
                m.decode_skipped_total
                    .get(kind)
                    .map(|count| json!({ "kind": kind.as_str(), "count": count }))
            })
            .collect();

        (refresh, m.refresh_joined_total, skipped)
    });

    json!({
        "refresh_total": refresh,
        "refresh_joined_total": joined,
        "decode_skipped_total": skipped,
        "storage": storage_json(db_path),
    })
}

fn storage_json(db_path: Option<&str>) -> serde_json::Value {
    use serde_json::json;

    let Some(db_path) = db_path.filter(|p| *p != ":memory:") else {
        return serde_json::Value::Null;
    };
    let db_bytes = std::fs::metadata(db_path)
        .ok()
        .and_then(|m| if m.is_file() { Some(m.len()) } else { None });

    json!({
        "db_path": db_path,
        "db_size_mb": db_bytes.map(|b| round2(bytes_to_mb(b))),
        "free_storage_mb": filesystem_free_mb(db_path),
    })
}

fn bytes_to_mb(bytes: u64) -> f64 {
    let mb = 1024.0 * 1024.0;
    (bytes as f64) / mb
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn filesystem_free_mb(db_path: &str) -> Option<f64> {
    use sysinfo::Disks;
    let disks = Disks::new_with_refreshed_list();
    let path = std::path::Path::new(db_path).canonicalize().ok()?;
    disks
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| round2(bytes_to_mb(d.available_space())))
}
