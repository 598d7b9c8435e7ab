mod config;
mod interaction;
mod layout;
mod scene;
mod viewport;

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};
use tracing::debug;

pub use config::{
    EngineTuning, ForceTuning, InteractionTuning, LayoutMode, RootType, TierSizes,
    TraversalDimension, TreeTuning, ViewConfig,
};
pub use interaction::{ContextAction, ContextMenu, PointerEvent};
pub use layout::{TreeEntry, TreeInfo};
pub use scene::{EMPTY_PLACEHOLDER, HitTarget, Primitive, Scene, ShapeGroup, Tooltip, tier_color};
pub use viewport::{ViewTransform, Viewport};

use crate::graph::{Adjacency, GraphData, GraphSnapshot, Metadata, SnapshotNode, Tier};
use crate::util::stable_pair;
use interaction::Interaction;
use layout::{
    ForceStep, Mobility, anchor_targets, build_hierarchy, extract_focus, orphan_mask,
    place_forest, resolve_overlaps, search_mask, step_forces,
};

/// Notifications for the host, drained once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Selected(String),
    Focused(Option<String>),
    ContextAction {
        action: ContextAction,
        node_id: String,
        tier: Tier,
    },
    ViewportChanged {
        pan: Vec2,
        zoom: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleReason {
    AlphaThreshold,
    TickCeiling,
    TreeConverged,
}

pub(crate) struct RenderNode {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) tier: Tier,
    pub(crate) metadata: Metadata,
    pub(crate) world_pos: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) base_radius: f32,
}

pub(crate) struct RenderLink {
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) kind: String,
}

/// The active, renderable node/link arena the simulation and the pointer handlers share.
#[derive(Default)]
pub(crate) struct RenderGraph {
    pub(crate) nodes: Vec<RenderNode>,
    pub(crate) links: Vec<RenderLink>,
    pub(crate) index_by_id: HashMap<String, usize>,
    pub(crate) adjacency: Adjacency,
}

impl RenderGraph {
    pub(crate) fn new(nodes: Vec<RenderNode>, links: Vec<RenderLink>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        let adjacency = Adjacency::build(
            nodes.len(),
            links.iter().map(|link| (link.source, link.target)),
        );

        Self {
            nodes,
            links,
            index_by_id,
            adjacency,
        }
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }
}

struct Simulation {
    running: bool,
    alpha: f32,
    ticks: u32,
    last_settle: Option<SettleReason>,
}

impl Simulation {
    fn idle() -> Self {
        Self {
            running: false,
            alpha: 0.0,
            ticks: 0,
            last_settle: None,
        }
    }

    fn start(&mut self) {
        self.running = true;
        self.alpha = 1.0;
        self.ticks = 0;
        self.last_settle = None;
    }
}

pub struct GraphEngine {
    tuning: EngineTuning,
    view: ViewConfig,
    viewport: Viewport,
    source: GraphData,
    /// Nodes that passed search, focus and hierarchy filtering, before orphan pruning.
    active: GraphData,
    /// Tree slots of the active set in hierarchical mode.
    placements: HashMap<String, Vec2>,
    graph: RenderGraph,
    tree_info: TreeInfo,
    tree_targets: Vec<Option<Vec2>>,
    structure_hash: Option<u64>,
    simulation: Simulation,
    /// Ids excluded from force updates while a drag is in progress.
    pinned: HashSet<String>,
    interaction: Interaction,
    selected: Option<String>,
    events: Vec<EngineEvent>,
    fit_on_settle: bool,
}

impl GraphEngine {
    pub fn new(tuning: EngineTuning) -> Self {
        Self {
            tuning,
            view: ViewConfig::default(),
            viewport: Viewport::default(),
            source: GraphData::default(),
            active: GraphData::default(),
            placements: HashMap::new(),
            graph: RenderGraph::default(),
            tree_info: TreeInfo::new(),
            tree_targets: Vec::new(),
            structure_hash: None,
            simulation: Simulation::idle(),
            pinned: HashSet::new(),
            interaction: Interaction::default(),
            selected: None,
            events: Vec::new(),
            fit_on_settle: false,
        }
    }

    /// Accepts a new snapshot and view as one atomic replacement. Returns false, and
    /// leaves positions and the tick loop untouched, when neither changed structurally.
    pub fn relayout(&mut self, snapshot: &GraphSnapshot, view: ViewConfig) -> bool {
        let source = GraphData::ingest(snapshot);
        let hash = structural_hash(&source, &view);
        self.source = source;

        if self.structure_hash == Some(hash) {
            debug!("snapshot and view unchanged, keeping current layout");
            self.refresh_attributes();
            return false;
        }

        if view.focus_node_id != self.view.focus_node_id {
            self.events
                .push(EngineEvent::Focused(view.focus_node_id.clone()));
        }
        self.view = view;
        self.structure_hash = Some(hash);
        self.rebuild();
        true
    }

    /// Re-runs the pipeline over the current snapshot with new view parameters.
    /// Emits `Focused` whenever the focus node changes.
    pub fn set_view(&mut self, view: ViewConfig) -> bool {
        let hash = structural_hash(&self.source, &view);
        if self.structure_hash == Some(hash) {
            return false;
        }

        if view.focus_node_id != self.view.focus_node_id {
            self.events
                .push(EngineEvent::Focused(view.focus_node_id.clone()));
        }
        self.view = view;
        self.structure_hash = Some(hash);
        self.rebuild();
        true
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    pub fn set_focus(&mut self, focus: Option<String>) {
        if self.view.focus_node_id == focus {
            return;
        }

        let mut view = self.view.clone();
        view.focus_node_id = focus;
        self.set_view(view);
    }

    pub fn set_tuning(&mut self, tuning: EngineTuning) {
        if self.tuning == tuning {
            return;
        }

        let reshaped = self.tuning.tree != tuning.tree
            || self.tuning.sizes != tuning.sizes
            || self.tuning.force.anchor_tier != tuning.force.anchor_tier;
        self.tuning = tuning;
        if reshaped {
            self.rebuild();
            return;
        }

        if !self.graph.nodes.is_empty() {
            self.simulation.running = true;
            self.simulation.alpha = self.simulation.alpha.max(0.3);
            self.simulation.ticks = 0;
        }
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    /// View-only update; never touches the layout.
    pub fn set_transform(&mut self, pan: Vec2, zoom: f32) {
        self.viewport
            .set_transform(pan, zoom, &self.tuning.interaction);
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
            self.viewport.size = size;
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// One scheduled callback: a single layout tick followed by a render pass.
    pub fn frame(&mut self) -> Scene {
        self.tick();
        self.scene()
    }

    pub fn scene(&self) -> Scene {
        scene::build_scene(self)
    }

    pub fn is_running(&self) -> bool {
        self.simulation.running
    }

    /// Cancels the tick loop. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.simulation.running = false;
    }

    pub fn ticks(&self) -> u32 {
        self.simulation.ticks
    }

    pub fn alpha(&self) -> f32 {
        self.simulation.alpha
    }

    pub fn last_settle(&self) -> Option<SettleReason> {
        self.simulation.last_settle
    }

    /// Clears focus and refits the viewport.
    pub fn reset_view(&mut self) {
        self.set_focus(None);
        self.fit_to_content();
        self.fit_on_settle = self.simulation.running;
    }

    pub fn fit_to_content(&mut self) -> bool {
        let fitted = self.viewport.fit_to_content(
            self.graph
                .nodes
                .iter()
                .map(|node| (node.world_pos, node.base_radius)),
            &self.tuning.interaction,
        );
        if fitted {
            self.push_viewport_event();
        }
        fitted
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<String>) {
        if let Some(id) = &id {
            self.events.push(EngineEvent::Selected(id.clone()));
        }
        if self.selected != id {
            self.selected = id;
            self.refresh_orphans();
        }
    }

    pub fn tree_info(&self) -> &TreeInfo {
        &self.tree_info
    }

    pub fn node_position(&self, id: &str) -> Option<Vec2> {
        self.graph
            .index_of(id)
            .map(|index| self.graph.nodes[index].world_pos)
    }

    pub fn rendered_node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.nodes.iter().map(|node| node.id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.graph.links.len()
    }

    /// Snapshot entity for details views, whether or not it is currently rendered.
    pub fn entity(&self, id: &str) -> Option<&SnapshotNode> {
        self.source.index_of(id).map(|index| &self.source.nodes[index])
    }

    pub fn rendered_degree(&self, id: &str) -> usize {
        self.graph
            .index_of(id)
            .map_or(0, |index| self.graph.adjacency.degree(index))
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_viewport_event(&mut self) {
        self.events.push(EngineEvent::ViewportChanged {
            pan: self.viewport.pan,
            zoom: self.viewport.zoom,
        });
    }

    fn refresh_attributes(&mut self) {
        for node in &mut self.active.nodes {
            if let Some(index) = self.source.index_of(&node.id) {
                let entity = &self.source.nodes[index];
                node.label = entity.label.clone();
                node.metadata = entity.metadata.clone();
            }
        }
        for node in &mut self.graph.nodes {
            let Some(index) = self.source.index_of(&node.id) else {
                continue;
            };
            let entity = &self.source.nodes[index];
            node.label = entity.display_label().to_owned();
            node.metadata = entity.metadata.clone();
        }
    }

    fn rebuild(&mut self) {
        self.interaction.cancel_gesture();
        self.pinned.clear();

        let bounds = self.viewport.bounds();
        let searched = self
            .source
            .subgraph(&search_mask(&self.source, &self.view));
        let adjacency = Adjacency::build(searched.node_count(), searched.edges());
        let focus = self
            .view
            .focus_node_id
            .as_deref()
            .and_then(|id| searched.index_of(id));

        let forest = match (focus, self.view.layout_mode) {
            (Some(focus), _) => Some(extract_focus(&adjacency, focus)),
            (None, LayoutMode::Hierarchical) => Some(build_hierarchy(
                &searched,
                &adjacency,
                self.view.root_type.tier(),
                self.view.dimension.direction(),
            )),
            (None, LayoutMode::Force) => None,
        };

        let mut placements = HashMap::new();
        let (tree_info, active) = match &forest {
            Some(forest) if self.view.layout_mode == LayoutMode::Hierarchical => {
                placements = place_forest(
                    forest,
                    &searched,
                    &self.view,
                    &self.tuning.sizes,
                    &self.tuning.tree,
                    bounds,
                );
                let keep = searched
                    .nodes
                    .iter()
                    .map(|node| placements.contains_key(&node.id))
                    .collect::<Vec<_>>();
                (forest.tree_info(&searched), searched.subgraph(&keep))
            }
            Some(forest) => (
                forest.tree_info(&searched),
                searched.subgraph(&forest.membership()),
            ),
            None => (TreeInfo::new(), searched),
        };

        self.active = active;
        self.placements = placements;
        self.tree_info = tree_info;
        self.apply_orphan_filter();

        if self.graph.nodes.is_empty() {
            self.simulation = Simulation::idle();
            self.fit_on_settle = false;
            return;
        }

        self.simulation.start();
        self.fit_on_settle = true;
    }

    fn orphan_keep_mask(&self) -> Vec<bool> {
        orphan_mask(
            &self.active,
            self.tuning.force.anchor_tier,
            &[
                self.selected.as_deref(),
                self.interaction.hovered(),
                self.view.focus_node_id.as_deref(),
            ],
        )
    }

    /// Renders the active set minus orphans that are neither anchors nor currently
    /// selected, hovered or focused.
    fn apply_orphan_filter(&mut self) {
        let pruned = self.active.subgraph(&self.orphan_keep_mask());
        let placements = std::mem::take(&mut self.placements);

        self.graph = self.carry_over(&pruned, &placements);
        self.tree_targets = self
            .graph
            .nodes
            .iter()
            .map(|node| placements.get(&node.id).copied())
            .collect();
        self.placements = placements;
    }

    /// Re-applies orphan pruning after the selection or hover moved. Survivors keep
    /// their positions; the layout is reheated only when a node comes back.
    fn refresh_orphans(&mut self) {
        let keep = self.orphan_keep_mask();
        let wanted = self
            .active
            .nodes
            .iter()
            .zip(&keep)
            .filter(|(_, kept)| **kept)
            .map(|(node, _)| node.id.as_str())
            .collect::<Vec<_>>();
        let grew = wanted.iter().any(|id| self.graph.index_of(id).is_none());
        if !grew && wanted.len() == self.graph.nodes.len() {
            return;
        }

        self.apply_orphan_filter();
        if grew && !self.graph.nodes.is_empty() {
            self.simulation.running = true;
            self.simulation.alpha = self.simulation.alpha.max(0.3);
            self.simulation.ticks = 0;
        }
    }

    /// Builds the next arena, keeping the position of every node that survives.
    fn carry_over(&mut self, active: &GraphData, placements: &HashMap<String, Vec2>) -> RenderGraph {
        let prior = std::mem::take(&mut self.graph)
            .nodes
            .into_iter()
            .map(|node| (node.id.clone(), node.world_pos))
            .collect::<HashMap<_, _>>();
        let adjacency = Adjacency::build(active.node_count(), active.edges());
        let center = self.viewport.bounds().center().to_vec2();
        let spread = (active.node_count() as f32).sqrt() * 40.0;

        let nodes = active
            .nodes
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let world_pos = prior
                    .get(&entity.id)
                    .copied()
                    .unwrap_or_else(|| {
                        initial_position(
                            entity,
                            adjacency
                                .undirected(index)
                                .find_map(|neighbor| prior.get(&active.nodes[neighbor.node].id)),
                            placements.get(&entity.id),
                            center,
                            spread,
                        )
                    });

                RenderNode {
                    id: entity.id.clone(),
                    label: entity.display_label().to_owned(),
                    tier: entity.tier,
                    metadata: entity.metadata.clone(),
                    world_pos,
                    velocity: Vec2::ZERO,
                    base_radius: self.tuning.sizes.radius(entity.tier),
                }
            })
            .collect();

        let links = active
            .links
            .iter()
            .map(|link| RenderLink {
                source: link.source,
                target: link.target,
                kind: link.kind.clone(),
            })
            .collect();

        RenderGraph::new(nodes, links)
    }

    fn tick(&mut self) {
        if !self.simulation.running {
            return;
        }
        if self.graph.nodes.is_empty() {
            self.simulation.running = false;
            return;
        }

        match self.view.layout_mode {
            LayoutMode::Force => self.tick_force(),
            LayoutMode::Hierarchical => self.tick_tree(),
        }
    }

    fn pinned_mask(&self) -> Vec<bool> {
        self.graph
            .nodes
            .iter()
            .map(|node| {
                self.pinned.contains(&node.id) || node.tier == self.tuning.force.anchor_tier
            })
            .collect()
    }

    fn mobility(&self) -> Vec<Mobility> {
        self.graph
            .nodes
            .iter()
            .map(|node| {
                if self.pinned.contains(&node.id) {
                    Mobility::Held
                } else if node.tier == self.tuning.force.anchor_tier {
                    Mobility::Anchored
                } else {
                    Mobility::Free
                }
            })
            .collect()
    }

    fn tick_force(&mut self) {
        let bounds = self.viewport.bounds();
        let pinned = self.pinned_mask();
        let mut anchors = anchor_targets(&self.graph, &self.tuning.force, bounds);
        for (anchor, node) in anchors.iter_mut().zip(&self.graph.nodes) {
            if self.pinned.contains(&node.id) {
                *anchor = None;
            }
        }

        let step = ForceStep {
            pinned: &pinned,
            anchors: &anchors,
            alpha: self.simulation.alpha,
            bounds,
        };
        step_forces(&mut self.graph, &step, &self.tuning.force);

        self.simulation.alpha *= self.tuning.force.alpha_decay;
        self.simulation.ticks += 1;

        if self.simulation.alpha < self.tuning.force.alpha_min {
            self.settle(SettleReason::AlphaThreshold);
        } else if self.simulation.ticks >= self.tuning.force.max_ticks {
            self.settle(SettleReason::TickCeiling);
        }
    }

    fn tick_tree(&mut self) {
        let ease = self.tuning.tree.ease.clamp(0.01, 1.0);
        let mut largest_gap = 0.0_f32;

        for (node, target) in self.graph.nodes.iter_mut().zip(&self.tree_targets) {
            node.velocity = Vec2::ZERO;
            let Some(target) = *target else {
                continue;
            };
            if self.pinned.contains(&node.id) {
                continue;
            }
            node.world_pos += (target - node.world_pos) * ease;
            largest_gap = largest_gap.max((target - node.world_pos).length());
        }

        self.simulation.ticks += 1;
        if largest_gap < self.tuning.tree.settle_epsilon {
            for (node, target) in self.graph.nodes.iter_mut().zip(&self.tree_targets) {
                if let Some(target) = *target
                    && !self.pinned.contains(&node.id)
                {
                    node.world_pos = target;
                }
            }
            self.settle(SettleReason::TreeConverged);
        } else if self.simulation.ticks >= self.tuning.tree.max_ticks {
            self.settle(SettleReason::TickCeiling);
        }
    }

    fn settle(&mut self, reason: SettleReason) {
        let mut remaining_overlaps = 0;
        if self.view.layout_mode == LayoutMode::Force {
            let mobility = self.mobility();
            remaining_overlaps = resolve_overlaps(&mut self.graph, &mobility, &self.tuning.force);
        }
        for node in &mut self.graph.nodes {
            node.velocity = Vec2::ZERO;
        }

        self.simulation.running = false;
        self.simulation.last_settle = Some(reason);
        debug!(
            ticks = self.simulation.ticks,
            alpha = self.simulation.alpha,
            ?reason,
            remaining_overlaps,
            "layout settled"
        );

        if self.fit_on_settle {
            self.fit_on_settle = false;
            self.fit_to_content();
        }
    }
}

fn initial_position(
    entity: &SnapshotNode,
    neighbor: Option<&Vec2>,
    placement: Option<&Vec2>,
    center: Vec2,
    spread: f32,
) -> Vec2 {
    if let (Some(x), Some(y)) = (entity.x, entity.y)
        && x.is_finite()
        && y.is_finite()
    {
        return vec2(x, y);
    }

    let (jx, jy) = stable_pair(&entity.id);
    let jitter = vec2(jx, jy);
    if let Some(neighbor) = neighbor {
        return *neighbor + jitter * 40.0;
    }
    if let Some(placement) = placement {
        return *placement;
    }
    center + jitter * spread
}

/// Hash over sorted node and link ids plus the view parameters that shape the layout.
fn structural_hash(data: &GraphData, view: &ViewConfig) -> u64 {
    let mut nodes = data
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node.tier))
        .collect::<Vec<_>>();
    nodes.sort_unstable();

    let mut links = data
        .links
        .iter()
        .map(|link| {
            (
                data.nodes[link.source].id.as_str(),
                data.nodes[link.target].id.as_str(),
                link.kind.as_str(),
            )
        })
        .collect::<Vec<_>>();
    links.sort_unstable();

    let mut hasher = DefaultHasher::new();
    nodes.hash(&mut hasher);
    links.hash(&mut hasher);
    view.hash(&mut hasher);
    hasher.finish()
}
