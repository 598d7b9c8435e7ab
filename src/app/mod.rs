use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Align, Context, Layout};
use tracing::{debug, info, warn};

use crate::engine::{
    ContextAction, EngineEvent, EngineTuning, GraphEngine, LayoutMode, RootType, ViewConfig,
};
use crate::graph::{GraphSnapshot, load_snapshot};

mod canvas;
mod render_utils;
mod ui;

type LoadResult = Result<GraphSnapshot, String>;

pub struct GraphViewerApp {
    snapshot_path: PathBuf,
    tuning: EngineTuning,
    initial_view: ViewConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    entity_count: usize,
    relationship_count: usize,
    /// Screen rect of the open context menu last frame, so clicks on it are not
    /// forwarded to the canvas.
    menu_rect: Option<egui::Rect>,
}

impl GraphViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        snapshot_path: PathBuf,
        tuning: EngineTuning,
        initial_view: ViewConfig,
    ) -> Self {
        let state = Self::start_load(snapshot_path.clone());
        Self {
            snapshot_path,
            tuning,
            initial_view,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(snapshot_path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_snapshot(&snapshot_path).map_err(|error| {
                warn!(path = %snapshot_path.display(), "failed to load snapshot: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(snapshot_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(snapshot_path),
        }
    }

    fn ready(&self, snapshot: GraphSnapshot) -> AppState {
        let mut model = ViewModel::new(self.tuning.clone());
        model.resupply(&snapshot, self.initial_view.clone());
        AppState::Ready(Box::new(model))
    }
}

impl eframe::App for GraphViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(snapshot)) => transition = Some(Ok(snapshot)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.snapshot_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.snapshot_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(snapshot)) => {
                            let view = model.engine.view().clone();
                            model.resupply(&snapshot, view);
                        }
                        Ok(Err(error)) => transition = Some(Err(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.snapshot_path.clone());
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(snapshot) => self.ready(snapshot),
                Err(error) => AppState::Error(error),
            };
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let AppState::Ready(model) = &mut self.state {
            model.engine.stop();
        }
    }
}

impl ViewModel {
    fn new(tuning: EngineTuning) -> Self {
        Self {
            engine: GraphEngine::new(tuning),
            entity_count: 0,
            relationship_count: 0,
            menu_rect: None,
        }
    }

    fn resupply(&mut self, snapshot: &GraphSnapshot, view: ViewConfig) {
        info!(
            nodes = snapshot.nodes.len(),
            links = snapshot.links.len(),
            "snapshot loaded"
        );
        self.entity_count = snapshot.nodes.len();
        self.relationship_count = snapshot.links.len();
        self.engine.relayout(snapshot, view);
    }

    fn show(
        &mut self,
        ctx: &Context,
        snapshot_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("tiergraph");
                    ui.separator();
                    ui.label(format!("snapshot: {}", snapshot_path.display()));
                    ui.label(format!("entities: {}", self.entity_count));
                    ui.label(format!("relationships: {}", self.relationship_count));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Reset view").clicked() {
                        self.engine.reset_view();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));

        self.apply_engine_events();
    }

    fn status_text(&self) -> String {
        let state = if self.engine.is_running() {
            "settling"
        } else {
            "settled"
        };
        format!(
            "rendered {} nodes / {} links  |  tick {}  |  alpha {:.3}  |  {state}",
            self.engine.node_count(),
            self.engine.link_count(),
            self.engine.ticks(),
            self.engine.alpha(),
        )
    }

    /// Submits `view` if it differs from what the engine is showing.
    fn submit_view(&mut self, view: ViewConfig) {
        if view != *self.engine.view() {
            self.engine.set_view(view);
        }
    }

    fn apply_engine_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::Selected(id) => debug!(%id, "node selected"),
                EngineEvent::Focused(focus) => debug!(?focus, "focus changed"),
                EngineEvent::ContextAction {
                    action,
                    node_id,
                    tier,
                } => {
                    debug!(?action, %node_id, ?tier, "context action");
                    let mut view = self.engine.view().clone();
                    match action {
                        ContextAction::RerootAtType => {
                            view.layout_mode = LayoutMode::Hierarchical;
                            view.root_type = RootType::from(tier);
                            view.focus_node_id = None;
                        }
                        ContextAction::FilterToType => view.type_filter = Some(tier),
                    }
                    self.submit_view(view);
                }
                EngineEvent::ViewportChanged { .. } => {}
            }
        }
    }
}
