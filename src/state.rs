use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use tracing::{debug, error, info, warn};

use crate::{
    canvas::TerminalCanvas,
    config::AtlasConfig,
    data::DatasetFetcher,
    error::AtlasError,
    host::{FeatureId, MapHost},
    interaction::{FeatureInteractionController, PointerEvent},
    layer::{GeometryLayerManager, RenderedFeature},
    palette::RandomPalette,
};

/// Where the boundary dataset stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetStatus {
    Loading,
    Ready(usize),
    /// Base map only.
    Unavailable(String),
}

pub struct AppState {
    pub canvas: TerminalCanvas,
    pub layers: GeometryLayerManager<RandomPalette>,
    pub status: DatasetStatus,
    pub hovered: Option<FeatureId>,
    fetch: Option<DatasetFetcher>,
    config: AtlasConfig,
}

impl AppState {
    pub fn new(config: AtlasConfig) -> Self {
        let canvas = TerminalCanvas::new(config.center, config.zoom);
        let layers = GeometryLayerManager::new(
            RandomPalette,
            FeatureInteractionController::new(config.layer_reordering),
        );
        let fetch = Some(DatasetFetcher::spawn(&config.dataset));
        Self { canvas, layers, status: DatasetStatus::Loading, hovered: None, fetch, config }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn hovered_feature(&self) -> Option<&RenderedFeature> {
        self.layers.layer()?.get(self.hovered?)
    }

    /// Name of the hovered region, as its popup would title it.
    pub fn hovered_name(&self) -> Option<&str> {
        Some(self.hovered_feature()?.popup().title.as_str())
    }

    /// Starts a new fetch; an older one still in flight is dropped.
    pub fn reload(&mut self) {
        info!(path = %self.config.dataset.display(), "reloading dataset");
        self.fetch = Some(DatasetFetcher::spawn(&self.config.dataset));
        self.status = DatasetStatus::Loading;
    }

    /// Applies a finished fetch, if any. Called once per loop iteration.
    pub fn tick(&mut self) {
        let Some(result) = self.fetch.as_ref().and_then(DatasetFetcher::poll) else {
            return;
        };
        self.fetch = None;
        if self.canvas.is_disposed() {
            debug!("canvas gone, fetch result dropped");
            return;
        }

        match result {
            Ok(dataset) => {
                self.hovered = None;
                match self.layers.render(dataset, &mut self.canvas) {
                    Ok(layer) => {
                        if layer.is_empty() {
                            warn!("dataset loaded but nothing to draw");
                        }
                        self.status = DatasetStatus::Ready(layer.len());
                        debug!(drawn = self.canvas.feature_count(), "canvas updated");
                    }
                    Err(AtlasError::RenderTargetDisposed) => debug!("canvas gone during render"),
                    Err(e) => {
                        error!(error = %e, "rendering the geometry layer failed");
                        self.status = DatasetStatus::Unavailable(e.to_string());
                    }
                }
            }
            Err(e) => {
                let reason = describe(&e);
                error!(error = %reason, "failed to load boundary dataset, showing base map only");
                self.status = DatasetStatus::Unavailable(reason);
            }
        }
    }

    /// Returns true when the app should exit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Esc => self.canvas.close_popup(),
            Char('r') => self.reload(),
            Char('+') | Char('=') => self.canvas.zoom_by(2.0),
            Char('-') => self.canvas.zoom_by(0.5),
            Left => self.canvas.pan(-0.1, 0.0),
            Right => self.canvas.pan(0.1, 0.0),
            Up => self.canvas.pan(0.0, 0.1),
            Down => self.canvas.pan(0.0, -0.1),
            Char('0') => {
                if let Err(e) = self.canvas.set_view(self.config.center, self.config.zoom) {
                    debug!(error = %e, "home view ignored");
                }
            }
            _ => {}
        }
        false
    }

    pub fn handle_mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) {
        match kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let under = self.canvas.feature_at(column, row);
                self.hover(under);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = self.canvas.feature_at(column, row) {
                    self.pointer(id, PointerEvent::Click);
                }
            }
            MouseEventKind::ScrollUp => self.canvas.zoom_by(1.25),
            MouseEventKind::ScrollDown => self.canvas.zoom_by(0.8),
            _ => {}
        }
    }

    /// Turns the feature under the pointer into leave/enter pairs.
    fn hover(&mut self, under: Option<FeatureId>) {
        if under == self.hovered {
            return;
        }
        if let Some(prev) = self.hovered.take() {
            self.pointer(prev, PointerEvent::Leave);
        }
        if let Some(next) = under {
            self.pointer(next, PointerEvent::Enter);
            self.hovered = Some(next);
        }
    }

    fn pointer(&mut self, id: FeatureId, event: PointerEvent) {
        if event == PointerEvent::Click {
            if let Some(f) = self.layers.layer().and_then(|l| l.get(id)) {
                info!(region = %f.region().id, "governorate selected");
            }
        }
        if let Err(e) = self.layers.handle(id, event, &mut self.canvas) {
            warn!(feature = id, ?event, error = %e, "pointer event not applied");
        }
    }

    /// Called after each draw so a resized terminal gets a fresh view.
    pub fn after_draw(&mut self) {
        if self.canvas.needs_invalidate() {
            if let Err(e) = self.canvas.invalidate_size() {
                debug!(error = %e, "invalidate ignored");
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.fetch = None;
        if let Err(e) = self.layers.clear(&mut self.canvas) {
            debug!(error = %e, "layer clear on shutdown");
        }
        self.canvas.dispose();
        info!("map torn down");
    }
}

fn describe(e: &AtlasError) -> String {
    match std::error::Error::source(e) {
        Some(cause) => format!("{e}: {cause}"),
        None => e.to_string(),
    }
}
