use std::collections::HashMap;

use geo::{BoundingRect, Contains, Coord, MultiPolygon, Point, Rect, coord};
use ratatui::{
    Frame,
    layout::{Position, Rect as TuiRect},
    style::Color,
    symbols::Marker,
    widgets::{
        Block,
        canvas::{Canvas, Context, Line, Map, MapResolution, Points},
    },
};
use tracing::debug;

use crate::{
    error::AtlasError,
    host::{FeatureId, MapHost},
    popup::PopupContent,
    style::FeatureStyle,
};

/// Tiles visible across the viewport at a given zoom.
const VIEW_TILES: f64 = 4.0;
const FIT_PADDING: f64 = 0.05;
/// Terminal size assumed until the first draw.
const DEFAULT_AREA: (u16, u16) = (100, 30);

struct CanvasFeature {
    id: FeatureId,
    shape: MultiPolygon<f64>,
    style: FeatureStyle,
    popup: Option<PopupContent>,
}

/// What the current viewport was derived from, so it can be rebuilt when
/// the terminal changes size.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ViewAnchor {
    Center { center: Coord<f64>, zoom: u8 },
    Extent { bounds: Rect<f64>, padding: f64 },
}

#[derive(Default)]
struct FillCache {
    key: Option<(Rect<f64>, TuiRect)>,
    points: HashMap<FeatureId, Vec<(f64, f64)>>,
}

/// Braille map in the terminal; implements [`MapHost`] for the geometry layer.
pub struct TerminalCanvas {
    features: Vec<CanvasFeature>,
    view: Rect<f64>,
    anchor: ViewAnchor,
    area: Option<TuiRect>,
    size_changed: bool,
    open_popup: Option<FeatureId>,
    fill: FillCache,
    disposed: bool,
}

impl TerminalCanvas {
    pub fn new(center: Coord<f64>, zoom: u8) -> Self {
        let anchor = ViewAnchor::Center { center, zoom };
        let mut canvas = Self {
            features: Vec::new(),
            view: Rect::new(center, center),
            anchor,
            area: None,
            size_changed: false,
            open_popup: None,
            fill: FillCache::default(),
            disposed: false,
        };
        canvas.view = canvas.resolve(anchor);
        canvas
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn viewport(&self) -> Rect<f64> {
        self.view
    }

    pub fn popup(&self) -> Option<&PopupContent> {
        let id = self.open_popup?;
        self.find(id)?.popup.as_ref()
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tears the canvas down; every later host call is refused.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.features.clear();
        self.open_popup = None;
        self.fill = FillCache::default();
    }

    /// Set by a draw at a new size; cleared by `invalidate_size`.
    pub fn needs_invalidate(&self) -> bool {
        self.size_changed
    }

    /// Shifts the view by a fraction of its span.
    pub fn pan(&mut self, fx: f64, fy: f64) {
        let (w, h) = (self.view.width(), self.view.height());
        let offset = coord! { x: w * fx, y: h * fy };
        self.set_extent(Rect::new(self.view.min() + offset, self.view.max() + offset));
    }

    /// `factor > 1` zooms in.
    pub fn zoom_by(&mut self, factor: f64) {
        let c = self.view.center();
        let half = coord! {
            x: self.view.width() / factor / 2.0,
            y: self.view.height() / factor / 2.0,
        };
        self.set_extent(Rect::new(c - half, c + half));
    }

    fn set_extent(&mut self, bounds: Rect<f64>) {
        self.anchor = ViewAnchor::Extent { bounds, padding: 0.0 };
        self.view = self.resolve(self.anchor);
    }

    /// Topmost feature under a terminal cell.
    pub fn feature_at(&self, column: u16, row: u16) -> Option<FeatureId> {
        let area = self.area?;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        let p = Point::new(
            self.view.min().x + fx * self.view.width(),
            self.view.max().y - fy * self.view.height(),
        );
        self.features.iter().rev().find(|f| f.shape.contains(&p)).map(|f| f.id)
    }

    fn find(&self, id: FeatureId) -> Option<&CanvasFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    fn find_mut(&mut self, id: FeatureId) -> Result<&mut CanvasFeature, AtlasError> {
        self.features.iter_mut().find(|f| f.id == id).ok_or(AtlasError::UnknownFeature(id))
    }

    fn ensure_live(&self) -> Result<(), AtlasError> {
        if self.disposed { Err(AtlasError::RenderTargetDisposed) } else { Ok(()) }
    }

    /// Latitude span per unit of longitude span; braille dots are roughly square.
    fn aspect(&self) -> f64 {
        let (w, h) = self.area.map(|a| (a.width, a.height)).unwrap_or(DEFAULT_AREA);
        (f64::from(h.max(1)) * 4.0) / (f64::from(w.max(1)) * 2.0)
    }

    fn resolve(&self, anchor: ViewAnchor) -> Rect<f64> {
        let aspect = self.aspect();
        match anchor {
            ViewAnchor::Center { center, zoom } => {
                let lon_span = 360.0 / 2f64.powi(i32::from(zoom)) * VIEW_TILES;
                let half = coord! { x: lon_span / 2.0, y: lon_span * aspect / 2.0 };
                Rect::new(center - half, center + half)
            }
            ViewAnchor::Extent { bounds, padding } => {
                let c = bounds.center();
                let mut w = bounds.width().max(1e-6) * (1.0 + 2.0 * padding);
                let mut h = bounds.height().max(1e-6) * (1.0 + 2.0 * padding);
                if h / w < aspect {
                    h = w * aspect;
                } else {
                    w = h / aspect;
                }
                let half = coord! { x: w / 2.0, y: h / 2.0 };
                Rect::new(c - half, c + half)
            }
        }
    }

    fn refresh_fill(&mut self, inner: TuiRect) {
        let key = Some((self.view, inner));
        if self.fill.key == key {
            return;
        }
        let cols = usize::from(inner.width) * 2;
        let rows = usize::from(inner.height) * 4;
        let dx = self.view.width() / cols.max(1) as f64;
        let dy = self.view.height() / rows.max(1) as f64;
        let origin = self.view.min();

        self.fill.points.clear();
        for f in &self.features {
            let Some(b) = f.shape.bounding_rect() else {
                continue;
            };
            let i0 = ((b.min().x - origin.x) / dx).floor().max(0.0) as usize;
            let i1 = (((b.max().x - origin.x) / dx).ceil().max(0.0) as usize).min(cols);
            let j0 = ((b.min().y - origin.y) / dy).floor().max(0.0) as usize;
            let j1 = (((b.max().y - origin.y) / dy).ceil().max(0.0) as usize).min(rows);

            let mut pts = Vec::new();
            for i in i0..i1 {
                let x = origin.x + (i as f64 + 0.5) * dx;
                for j in j0..j1 {
                    let y = origin.y + (j as f64 + 0.5) * dy;
                    if f.shape.contains(&Point::new(x, y)) {
                        pts.push((x, y));
                    }
                }
            }
            self.fill.points.insert(f.id, pts);
        }
        self.fill.key = key;
        debug!(features = self.features.len(), "fill samples rebuilt");
    }

    /// Draws the base map and every feature in z-order.
    pub fn render(&mut self, f: &mut Frame, area: TuiRect, title: &str) {
        let block = Block::bordered().title(title);
        let inner = block.inner(area);
        if self.area != Some(inner) {
            self.size_changed = true;
            self.area = Some(inner);
        }
        self.refresh_fill(inner);

        let dot_width = self.view.width() / (f64::from(inner.width.max(1)) * 2.0);
        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([self.view.min().x, self.view.max().x])
            .y_bounds([self.view.min().y, self.view.max().y])
            .paint(|ctx| {
                ctx.draw(&Map { color: Color::DarkGray, resolution: MapResolution::High });
                ctx.layer();
                for feature in &self.features {
                    if let Some(pts) = self.fill.points.get(&feature.id) {
                        ctx.draw(&Points {
                            coords: pts,
                            color: feature.style.fill_color.shade(feature.style.fill_opacity),
                        });
                    }
                    draw_outline(ctx, feature, dot_width);
                    ctx.layer();
                }
            });
        f.render_widget(canvas, area);
    }
}

/// Heavier strokes are drawn as extra passes shifted one dot to the right.
fn draw_outline(ctx: &mut Context<'_>, feature: &CanvasFeature, dot_width: f64) {
    let style = &feature.style;
    let color = style.stroke_color.shade(style.stroke_opacity);
    let passes = style.stroke_weight.round().max(1.0) as usize;
    for poly in &feature.shape.0 {
        for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
            for pass in 0..passes {
                let shift = pass as f64 * dot_width;
                for w in ring.0.windows(2) {
                    ctx.draw(&Line {
                        x1: w[0].x + shift,
                        y1: w[0].y,
                        x2: w[1].x + shift,
                        y2: w[1].y,
                        color,
                    });
                }
            }
        }
    }
}

impl MapHost for TerminalCanvas {
    fn set_view(&mut self, center: Coord<f64>, zoom: u8) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.anchor = ViewAnchor::Center { center, zoom };
        self.view = self.resolve(self.anchor);
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.anchor = ViewAnchor::Extent { bounds, padding: FIT_PADDING };
        self.view = self.resolve(self.anchor);
        Ok(())
    }

    fn invalidate_size(&mut self) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.size_changed = false;
        self.view = self.resolve(self.anchor);
        Ok(())
    }

    fn add_feature(
        &mut self,
        id: FeatureId,
        shape: &MultiPolygon<f64>,
        style: &FeatureStyle,
    ) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.features.push(CanvasFeature { id, shape: shape.clone(), style: *style, popup: None });
        self.fill.key = None;
        Ok(())
    }

    fn clear_features(&mut self) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.features.clear();
        self.open_popup = None;
        self.fill = FillCache::default();
        Ok(())
    }

    fn set_style(&mut self, id: FeatureId, style: &FeatureStyle) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.find_mut(id)?.style = *style;
        Ok(())
    }

    fn bring_to_front(&mut self, id: FeatureId) -> Result<(), AtlasError> {
        self.ensure_live()?;
        let pos = self
            .features
            .iter()
            .position(|f| f.id == id)
            .ok_or(AtlasError::UnknownFeature(id))?;
        let feature = self.features.remove(pos);
        self.features.push(feature);
        Ok(())
    }

    fn bind_popup(&mut self, id: FeatureId, popup: &PopupContent) -> Result<(), AtlasError> {
        self.ensure_live()?;
        self.find_mut(id)?.popup = Some(popup.clone());
        Ok(())
    }

    fn open_popup(&mut self, id: FeatureId) -> Result<(), AtlasError> {
        self.ensure_live()?;
        if self.find_mut(id)?.popup.is_some() {
            self.open_popup = Some(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::tests::square, palette::HexColor, style::StyleOverride};
    use ratatui::{Terminal, backend::TestBackend};

    fn style() -> FeatureStyle {
        FeatureStyle {
            fill_color: HexColor::from_u32(0xE63946),
            stroke_color: HexColor::WHITE,
            stroke_weight: 1.0,
            stroke_opacity: 1.0,
            fill_opacity: 0.7,
        }
    }

    fn draw(canvas: &mut TerminalCanvas, terminal: &mut Terminal<TestBackend>) {
        terminal
            .draw(|f| {
                let area = f.area();
                canvas.render(f, area, "Egypt");
            })
            .unwrap();
    }

    fn canvas_with_two_overlapping() -> TerminalCanvas {
        let mut canvas = TerminalCanvas::new(coord! { x: 30.8, y: 26.8 }, 6);
        canvas.add_feature(0, &square(30.0, 26.0, 2.0), &style()).unwrap();
        canvas.add_feature(1, &square(31.0, 26.0, 2.0), &style()).unwrap();
        canvas
    }

    #[test]
    fn center_view_spans_four_tiles() {
        let canvas = TerminalCanvas::new(coord! { x: 30.8025, y: 26.8206 }, 6);
        let v = canvas.viewport();
        assert!((v.width() - 22.5).abs() < 1e-9);
        assert!((v.center().x - 30.8025).abs() < 1e-9);
        assert!((v.height() - 22.5 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn fit_contains_bounds_with_padding() {
        let mut canvas = TerminalCanvas::new(coord! { x: 0.0, y: 0.0 }, 2);
        let b = Rect::new(coord! { x: 30.0, y: 22.0 }, coord! { x: 36.0, y: 31.0 });
        canvas.fit_bounds(b).unwrap();
        let v = canvas.viewport();
        assert!(v.min().x < 30.0 && v.max().x > 36.0);
        assert!(v.min().y < 22.0 && v.max().y > 31.0);
        assert!((v.center().x - 33.0).abs() < 1e-9);
    }

    #[test]
    fn hit_test_prefers_topmost_and_follows_raise() {
        let mut canvas = canvas_with_two_overlapping();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        draw(&mut canvas, &mut terminal);
        canvas.invalidate_size().unwrap();
        let overlap = Rect::new(coord! { x: 31.2, y: 26.5 }, coord! { x: 31.8, y: 27.5 });
        canvas.fit_bounds(overlap).unwrap();
        draw(&mut canvas, &mut terminal);

        // The view now sits inside the overlap; the middle cell hits both.
        assert_eq!(canvas.feature_at(30, 10), Some(1));
        canvas.bring_to_front(0).unwrap();
        assert_eq!(canvas.feature_at(30, 10), Some(0));
        // Border cells are outside the map area.
        assert_eq!(canvas.feature_at(0, 0), None);
    }

    #[test]
    fn resize_is_flagged_until_invalidated() {
        let mut canvas = canvas_with_two_overlapping();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        draw(&mut canvas, &mut terminal);
        assert!(canvas.needs_invalidate());
        canvas.invalidate_size().unwrap();
        assert!(!canvas.needs_invalidate());
        let before = canvas.viewport();

        terminal.backend_mut().resize(80, 20);
        draw(&mut canvas, &mut terminal);
        assert!(canvas.needs_invalidate());
        canvas.invalidate_size().unwrap();
        assert!(canvas.viewport().height() < before.height());
    }

    #[test]
    fn popup_opens_only_when_bound() {
        let mut canvas = canvas_with_two_overlapping();
        canvas.open_popup(0).unwrap();
        assert!(canvas.popup().is_none());

        let popup = PopupContent { title: "Cairo".into(), detail: None };
        canvas.bind_popup(0, &popup).unwrap();
        canvas.open_popup(0).unwrap();
        assert_eq!(canvas.popup(), Some(&popup));
        canvas.close_popup();
        assert!(canvas.popup().is_none());
        assert!(matches!(canvas.open_popup(7), Err(AtlasError::UnknownFeature(7))));
    }

    #[test]
    fn set_style_replaces_feature_style() {
        let mut canvas = canvas_with_two_overlapping();
        let lit = StyleOverride::HIGHLIGHT.apply(&style());
        canvas.set_style(1, &lit).unwrap();
        assert_eq!(canvas.find(1).unwrap().style, lit);
        assert_eq!(canvas.find(0).unwrap().style, style());
    }

    #[test]
    fn disposed_canvas_refuses_calls() {
        let mut canvas = canvas_with_two_overlapping();
        canvas.dispose();
        assert!(canvas.is_disposed());
        assert_eq!(canvas.feature_count(), 0);
        assert!(matches!(canvas.set_style(0, &style()), Err(AtlasError::RenderTargetDisposed)));
        assert!(matches!(
            canvas.fit_bounds(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 })),
            Err(AtlasError::RenderTargetDisposed)
        ));
    }

    #[test]
    fn pan_and_zoom_move_the_view() {
        let mut canvas = TerminalCanvas::new(coord! { x: 30.0, y: 26.0 }, 6);
        let start = canvas.viewport();
        canvas.pan(0.1, 0.0);
        assert!((canvas.viewport().center().x - (30.0 + start.width() * 0.1)).abs() < 1e-9);
        canvas.zoom_by(2.0);
        assert!((canvas.viewport().width() - start.width() / 2.0).abs() < 1e-9);
    }
}
