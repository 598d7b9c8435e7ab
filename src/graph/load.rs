use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::GraphSnapshot;

pub fn load_snapshot(path: &Path) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    parse_snapshot(&raw).with_context(|| format!("failed to parse snapshot {}", path.display()))
}

pub fn parse_snapshot(raw: &str) -> Result<GraphSnapshot> {
    serde_json::from_str(raw).context("invalid snapshot JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::Tier;

    #[test]
    fn parses_minimal_snapshot() {
        let raw = r#"{
            "nodes": [
                { "id": "acme", "label": "Acme", "type": "owner" },
                { "id": "s3", "type": "provider", "metadata": { "alerts": 2 }, "x": 4.0, "y": 8.5 }
            ],
            "links": [ { "source": "acme", "target": "s3", "type": "uses" } ]
        }"#;

        let snapshot = parse_snapshot(raw).expect("snapshot parses");
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[1].tier, Tier::Provider);
        assert_eq!(snapshot.nodes[1].x, Some(4.0));
        assert_eq!(snapshot.links[0].kind, "uses");
    }

    #[test]
    fn rejects_unknown_tier() {
        let raw = r#"{ "nodes": [ { "id": "x", "type": "galaxy" } ] }"#;
        assert!(parse_snapshot(raw).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load_snapshot(Path::new("/nonexistent/tiergraph.json")).unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/tiergraph.json"));
    }
}
