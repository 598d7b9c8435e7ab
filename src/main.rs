mod app;
mod engine;
mod graph;
mod util;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use engine::{EngineTuning, LayoutMode, RootType, TraversalDimension, ViewConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON snapshot with `nodes` and `links`.
    #[arg(long)]
    snapshot: PathBuf,
    #[arg(long, value_enum, default_value_t = LayoutMode::Force)]
    layout: LayoutMode,
    #[arg(long, value_enum, default_value_t = RootType::All)]
    root_type: RootType,
    #[arg(long, value_enum, default_value_t = TraversalDimension::Downstream)]
    dimension: TraversalDimension,
    /// JSON file overriding any subset of the layout constants.
    #[arg(long)]
    tuning: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tiergraph=info")),
        )
        .init();

    let args = Args::parse();
    let tuning = match &args.tuning {
        Some(path) => EngineTuning::load(path)?,
        None => EngineTuning::default(),
    };
    let view = ViewConfig {
        layout_mode: args.layout,
        root_type: args.root_type,
        dimension: args.dimension,
        ..ViewConfig::default()
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "tiergraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::GraphViewerApp::new(
                cc,
                args.snapshot.clone(),
                tuning.clone(),
                view.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to start the viewer: {error}"))
}
