mod adjacency;
mod ingest;
mod load;
mod model;

pub use adjacency::{Adjacency, Direction, Neighbor};
pub use ingest::{GraphData, ResolvedLink};
pub use load::load_snapshot;
pub use model::{GraphSnapshot, Metadata, SnapshotLink, SnapshotNode, Tier, alert_count};
