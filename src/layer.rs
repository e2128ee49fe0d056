use geo::Rect;
use tracing::{debug, info, warn};

use crate::{
    data::{Region, RegionDataset},
    error::AtlasError,
    host::{FeatureId, MapHost},
    interaction::{FeatureInteractionController, LayerCommand, PointerEvent},
    palette::ColorAssigner,
    popup::PopupContent,
    style::{FeatureStyle, FeatureStyler},
};

/// A region as it lives on the map: default style captured at creation,
/// current style as mutated by interaction.
#[derive(Clone, Debug)]
pub struct RenderedFeature {
    id: FeatureId,
    region: Region,
    bounds: Option<Rect<f64>>,
    popup: PopupContent,
    default_style: FeatureStyle,
    current_style: FeatureStyle,
}

impl RenderedFeature {
    pub fn new(id: FeatureId, region: Region, style: FeatureStyle) -> Self {
        Self {
            id,
            bounds: region.bounds(),
            popup: PopupContent::for_region(&region),
            region,
            default_style: style,
            current_style: style,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    pub fn popup(&self) -> &PopupContent {
        &self.popup
    }

    #[cfg(test)]
    pub fn default_style(&self) -> &FeatureStyle {
        &self.default_style
    }

    pub fn current_style(&self) -> &FeatureStyle {
        &self.current_style
    }
}

/// Every feature of one dataset load, indexed by [`FeatureId`].
#[derive(Debug, Default)]
pub struct GeometryLayer {
    features: Vec<RenderedFeature>,
}

impl GeometryLayer {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: FeatureId) -> Option<&RenderedFeature> {
        self.features.get(id)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &RenderedFeature> {
        self.features.iter()
    }

    fn get_mut(&mut self, id: FeatureId) -> Result<&mut RenderedFeature, AtlasError> {
        self.features.get_mut(id).ok_or(AtlasError::UnknownFeature(id))
    }

    /// Puts back the style captured at creation, fill color included.
    pub fn reset_feature<H: MapHost>(
        &mut self,
        id: FeatureId,
        host: &mut H,
    ) -> Result<(), AtlasError> {
        let feature = self.get_mut(id)?;
        feature.current_style = feature.default_style;
        host.set_style(id, &feature.current_style)
    }

    fn apply(&mut self, cmd: LayerCommand, host: &mut impl MapHost) -> Result<(), AtlasError> {
        match cmd {
            LayerCommand::Highlight(req) => {
                let feature = self.get_mut(req.feature)?;
                feature.current_style = req.style.apply(&feature.current_style);
                host.set_style(req.feature, &feature.current_style)?;
                if req.raise {
                    host.bring_to_front(req.feature)?;
                }
                Ok(())
            }
            LayerCommand::Reset(req) => self.reset_feature(req.feature, host),
            LayerCommand::FitViewport(req) => {
                debug!(feature = req.feature, "fitting viewport to feature");
                host.fit_bounds(req.bounds)
            }
            LayerCommand::OpenPopup(id) => {
                self.get_mut(id)?;
                host.open_popup(id)
            }
        }
    }
}

/// Owns the current geometry layer and routes interaction into it.
pub struct GeometryLayerManager<C> {
    styler: FeatureStyler<C>,
    controller: FeatureInteractionController,
    layer: Option<GeometryLayer>,
}

impl<C: ColorAssigner> GeometryLayerManager<C> {
    pub fn new(colors: C, controller: FeatureInteractionController) -> Self {
        Self { styler: FeatureStyler::new(colors), controller, layer: None }
    }

    pub fn layer(&self) -> Option<&GeometryLayer> {
        self.layer.as_ref()
    }

    /// Builds one feature per region and hands them to `host`, replacing
    /// whatever layer was there before.
    pub fn render<H: MapHost>(
        &mut self,
        dataset: RegionDataset,
        host: &mut H,
    ) -> Result<&GeometryLayer, AtlasError> {
        if self.layer.take().is_some() {
            host.clear_features()?;
        }

        let mut layer = GeometryLayer { features: Vec::with_capacity(dataset.len()) };
        for (id, region) in dataset.regions.into_iter().enumerate() {
            let style = self.styler.style_for(&region);
            let feature = RenderedFeature::new(id, region, style);
            debug!(feature = id, region = %feature.region.id, "adding feature");
            host.add_feature(id, &feature.region.shape, &feature.default_style)?;
            host.bind_popup(id, &feature.popup)?;
            layer.features.push(feature);
        }
        info!(features = layer.len(), "geometry layer rendered");
        Ok(&*self.layer.insert(layer))
    }

    /// Restores feature `id` to its creation style. A no-op without a layer.
    pub fn reset_feature<H: MapHost>(
        &mut self,
        id: FeatureId,
        host: &mut H,
    ) -> Result<(), AtlasError> {
        match self.layer.as_mut() {
            Some(layer) => quiet_if_disposed(layer.reset_feature(id, host)),
            None => Ok(()),
        }
    }

    /// Pointer event on feature `id`. Without a layer there is nothing to do.
    pub fn handle<H: MapHost>(
        &mut self,
        id: FeatureId,
        event: PointerEvent,
        host: &mut H,
    ) -> Result<(), AtlasError> {
        let Some(layer) = self.layer.as_ref() else {
            return Ok(());
        };
        let Some(feature) = layer.get(id) else {
            warn!(feature = id, ?event, "pointer event for unknown feature");
            return Err(AtlasError::UnknownFeature(id));
        };
        let commands = self.controller.respond(feature, event);
        for cmd in commands {
            match cmd {
                LayerCommand::Reset(req) => self.reset_feature(req.feature, host)?,
                cmd => {
                    if let Some(layer) = self.layer.as_mut() {
                        quiet_if_disposed(layer.apply(cmd, host))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Drops the layer and removes its features from `host`.
    pub fn clear<H: MapHost>(&mut self, host: &mut H) -> Result<(), AtlasError> {
        if self.layer.take().is_some() {
            quiet_if_disposed(host.clear_features())?;
        }
        Ok(())
    }
}

fn quiet_if_disposed(result: Result<(), AtlasError>) -> Result<(), AtlasError> {
    match result {
        Err(AtlasError::RenderTargetDisposed) => {
            debug!("host disposed, interaction ignored");
            Ok(())
        }
        other => other,
    }
}
