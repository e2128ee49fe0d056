use geo::Rect;

use crate::{host::FeatureId, layer::RenderedFeature, style::StyleOverride};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    Enter,
    Leave,
    Click,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightRequest {
    pub feature: FeatureId,
    pub style: StyleOverride,
    pub raise: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetRequest {
    pub feature: FeatureId,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitViewportRequest {
    pub feature: FeatureId,
    pub bounds: Rect<f64>,
}

/// What a pointer event on a feature asks the layer to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerCommand {
    Highlight(HighlightRequest),
    Reset(ResetRequest),
    FitViewport(FitViewportRequest),
    OpenPopup(FeatureId),
}

/// Maps pointer events to layer commands. Holds no per-feature state.
#[derive(Clone, Copy, Debug)]
pub struct FeatureInteractionController {
    supports_layer_reordering: bool,
}

impl FeatureInteractionController {
    pub fn new(supports_layer_reordering: bool) -> Self {
        Self { supports_layer_reordering }
    }

    pub fn respond(&self, feature: &RenderedFeature, event: PointerEvent) -> Vec<LayerCommand> {
        let id = feature.id();
        match event {
            PointerEvent::Enter => vec![LayerCommand::Highlight(HighlightRequest {
                feature: id,
                style: StyleOverride::HIGHLIGHT,
                raise: self.supports_layer_reordering,
            })],
            PointerEvent::Leave => vec![LayerCommand::Reset(ResetRequest { feature: id })],
            PointerEvent::Click => {
                let mut cmds = Vec::with_capacity(2);
                // An empty shape has no extent to fit.
                if let Some(bounds) = feature.bounds() {
                    let fit = FitViewportRequest { feature: id, bounds };
                    cmds.push(LayerCommand::FitViewport(fit));
                }
                cmds.push(LayerCommand::OpenPopup(id));
                cmds
            }
        }
    }
}
