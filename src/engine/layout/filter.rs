use crate::engine::config::ViewConfig;
use crate::graph::{GraphData, Tier};
use crate::util::contains_ignore_case;

/// Nodes matching the search text (label or tier, case-insensitive) and the type
/// filter. The focused node always survives.
pub(in crate::engine) fn search_mask(data: &GraphData, view: &ViewConfig) -> Vec<bool> {
    let query = view.search_text.trim().to_lowercase();

    data.nodes
        .iter()
        .map(|node| {
            if view.focus_node_id.as_deref() == Some(node.id.as_str()) {
                return true;
            }
            let tier_matches = view.type_filter.is_none_or(|tier| node.tier == tier);
            let text_matches = query.is_empty()
                || contains_ignore_case(node.display_label(), &query)
                || contains_ignore_case(node.tier.label(), &query);
            tier_matches && text_matches
        })
        .collect()
}

/// Drops nodes without an incident link unless they are of the anchor tier or named
/// in `exempt` (selection, hover, focus).
pub(in crate::engine) fn orphan_mask(
    data: &GraphData,
    anchor_tier: Tier,
    exempt: &[Option<&str>],
) -> Vec<bool> {
    let mut incident = vec![false; data.node_count()];
    for (source, target) in data.edges() {
        incident[source] = true;
        incident[target] = true;
    }

    data.nodes
        .iter()
        .zip(incident)
        .map(|(node, has_link)| {
            has_link
                || node.tier == anchor_tier
                || exempt.iter().flatten().any(|id| *id == node.id)
        })
        .collect()
}
