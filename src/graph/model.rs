use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Opaque per-entity attributes supplied by the data source.
pub type Metadata = BTreeMap<String, Value>;

/// Mutually exclusive entity categories, ordered from the top of the hierarchy down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Owner,
    Intermediary,
    Provider,
    Leaf,
}

impl Tier {
    pub const ALL: [Self; 4] = [Self::Owner, Self::Intermediary, Self::Provider, Self::Leaf];

    /// The global root tier every hierarchy branch should terminate at.
    pub const TOP: Self = Self::Owner;

    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Intermediary => "intermediary",
            Self::Provider => "provider",
            Self::Leaf => "leaf",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub tier: Tier,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

impl SnapshotNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, tier: Tier) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tier,
            metadata: Metadata::new(),
            x: None,
            y: None,
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotLink {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SnapshotLink {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            metadata: Metadata::new(),
        }
    }
}

/// One atomic delivery of entities and relationships from the data source.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub links: Vec<SnapshotLink>,
}

/// Number of open alerts flagged in metadata, if any.
pub fn alert_count(metadata: &Metadata) -> Option<u64> {
    if let Some(count) = metadata.get("alerts").and_then(Value::as_u64) {
        return (count > 0).then_some(count);
    }

    match metadata.get("alert") {
        Some(Value::Bool(true)) => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn alert_count_prefers_numeric_alerts() {
        let mut metadata = Metadata::new();
        metadata.insert("alerts".to_owned(), json!(3));
        metadata.insert("alert".to_owned(), json!(true));
        assert_eq!(alert_count(&metadata), Some(3));
    }

    #[test]
    fn alert_count_ignores_zero_and_false() {
        let mut metadata = Metadata::new();
        metadata.insert("alerts".to_owned(), json!(0));
        assert_eq!(alert_count(&metadata), None);

        let mut flagged = Metadata::new();
        flagged.insert("alert".to_owned(), json!(false));
        assert_eq!(alert_count(&flagged), None);

        flagged.insert("alert".to_owned(), json!(true));
        assert_eq!(alert_count(&flagged), Some(1));
    }

    #[test]
    fn display_label_falls_back_to_id() {
        let node = SnapshotNode::new("vendor-7", "", Tier::Provider);
        assert_eq!(node.display_label(), "vendor-7");
    }
}
