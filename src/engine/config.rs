use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::graph::{Direction, Tier};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Force,
    Hierarchical,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Hierarchical => "Hierarchy",
        }
    }
}

/// Which tier roots the hierarchy. `All` roots at the top tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RootType {
    #[default]
    All,
    Owner,
    Intermediary,
    Provider,
    Leaf,
}

impl RootType {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Owner,
        Self::Intermediary,
        Self::Provider,
        Self::Leaf,
    ];

    pub fn tier(self) -> Tier {
        match self {
            Self::All => Tier::TOP,
            Self::Owner => Tier::Owner,
            Self::Intermediary => Tier::Intermediary,
            Self::Provider => Tier::Provider,
            Self::Leaf => Tier::Leaf,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            other => other.tier().label(),
        }
    }
}

impl From<Tier> for RootType {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Owner => Self::Owner,
            Tier::Intermediary => Self::Intermediary,
            Tier::Provider => Self::Provider,
            Tier::Leaf => Self::Leaf,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDimension {
    /// Follow links from source to target.
    #[default]
    Downstream,
    /// Follow links from target back to source.
    Upstream,
}

impl TraversalDimension {
    pub fn direction(self) -> Direction {
        match self {
            Self::Downstream => Direction::Forward,
            Self::Upstream => Direction::Reverse,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Downstream => "downstream",
            Self::Upstream => "upstream",
        }
    }
}

/// View parameters supplied by the host alongside each snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewConfig {
    pub layout_mode: LayoutMode,
    pub root_type: RootType,
    pub dimension: TraversalDimension,
    pub search_text: String,
    pub focus_node_id: Option<String>,
    /// Empty means every node is expanded.
    pub expanded_node_ids: BTreeSet<String>,
    pub type_filter: Option<Tier>,
}

impl ViewConfig {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded_node_ids.is_empty() || self.expanded_node_ids.contains(id)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceTuning {
    /// Extra gap kept between rendered circles, sized for their labels.
    pub min_separation: f32,
    pub collision_strength: f32,
    pub repulsion_strength: f32,
    pub repulsion_cutoff: f32,
    /// Single ideal length shared by every link.
    pub link_distance: f32,
    pub spring_strength: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub max_ticks: u32,
    pub bounds_padding: f32,
    pub anchor_ease: f32,
    pub anchor_ring_radius: f32,
    pub overlap_passes: usize,
    pub anchor_tier: Tier,
}

impl Default for ForceTuning {
    fn default() -> Self {
        Self {
            min_separation: 18.0,
            collision_strength: 0.7,
            repulsion_strength: 2_400.0,
            repulsion_cutoff: 360.0,
            link_distance: 150.0,
            spring_strength: 0.08,
            velocity_decay: 0.6,
            alpha_decay: 0.975,
            alpha_min: 0.005,
            max_ticks: 300,
            bounds_padding: 40.0,
            anchor_ease: 0.18,
            anchor_ring_radius: 180.0,
            overlap_passes: 48,
            anchor_tier: Tier::TOP,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeTuning {
    pub origin_x: f32,
    pub level_width: f32,
    pub label_height: f32,
    pub sibling_padding: f32,
    pub ease: f32,
    pub settle_epsilon: f32,
    pub max_ticks: u32,
}

impl Default for TreeTuning {
    fn default() -> Self {
        Self {
            origin_x: 80.0,
            level_width: 220.0,
            label_height: 16.0,
            sibling_padding: 14.0,
            ease: 0.22,
            settle_epsilon: 0.5,
            max_ticks: 160,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    pub drag_threshold: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub wheel_sensitivity: f32,
    /// Bounds on the zoom factor a single wheel event may apply.
    pub wheel_factor_min: f32,
    pub wheel_factor_max: f32,
    pub fit_label_padding: f32,
    pub tooltip_offset: f32,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            zoom_min: 0.1,
            zoom_max: 4.0,
            wheel_sensitivity: 0.0018,
            wheel_factor_min: 0.85,
            wheel_factor_max: 1.15,
            fit_label_padding: 24.0,
            tooltip_offset: 14.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TierSizes {
    pub owner: f32,
    pub intermediary: f32,
    pub provider: f32,
    pub leaf: f32,
}

impl TierSizes {
    pub fn radius(&self, tier: Tier) -> f32 {
        match tier {
            Tier::Owner => self.owner,
            Tier::Intermediary => self.intermediary,
            Tier::Provider => self.provider,
            Tier::Leaf => self.leaf,
        }
    }
}

impl Default for TierSizes {
    fn default() -> Self {
        Self {
            owner: 26.0,
            intermediary: 20.0,
            provider: 16.0,
            leaf: 11.0,
        }
    }
}

/// Every empirical constant the engine uses, grouped by concern.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub force: ForceTuning,
    pub tree: TreeTuning,
    pub interaction: InteractionTuning,
    pub sizes: TierSizes,
}

impl EngineTuning {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tuning file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid tuning JSON in {}", path.display()))
    }
}
