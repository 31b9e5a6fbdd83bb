//! Test helpers for writing scene scripts and marker lists to disk.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A 1x1 opaque PNG.
pub(super) const PIXEL_PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// Temporary directory with UTF-8 path helpers.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        write_utf8(&path, contents.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture");
}

/// JSON for a marker with grouping attributes at `lng`/`lat`.
pub(super) fn marker_json(id: &str, city: &str, lng: f64, lat: f64) -> String {
    format!(
        r#"{{"id": "{id}", "coordinate": {{"latitude": {lat}, "longitude": {lng}}}, "title": "{id}",
            "groupingAttributes": {{"province": "Shanxi", "city": "{city}"}}}}"#
    )
}

/// Three markers: two in Taiyuan, one in Datong.
pub(super) fn three_markers_json() -> String {
    format!(
        "[{}, {}, {}]",
        marker_json("t1", "Taiyuan", 112.5, 37.8),
        marker_json("t2", "Taiyuan", 112.6, 37.9),
        marker_json("d1", "Datong", 113.3, 40.1),
    )
}

/// Clustering rules for district 12, city 10 and province 8.
pub(super) const TIERED_RULES_JSON: &str = r#"{"enabled": true, "rules": [
    {"by": "district", "thresholdZoomLevel": 12},
    {"by": "city", "thresholdZoomLevel": 10},
    {"by": "province", "thresholdZoomLevel": 8}
]}"#;

/// Parse a report written by a command.
pub(super) fn parse_report(bytes: &[u8]) -> serde_json::Value {
    let text = String::from_utf8(bytes.to_vec()).expect("report is utf-8");
    serde_json::from_str(&text).expect("report is JSON")
}
