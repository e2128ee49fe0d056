use geo::{Coord, MultiPolygon, Rect};

use crate::{error::AtlasError, popup::PopupContent, style::FeatureStyle};

/// Position of a rendered feature inside its layer.
pub type FeatureId = usize;

/// The drawable map the geometry layer paints onto.
///
/// Every call fails with [`AtlasError::RenderTargetDisposed`] once the host
/// has been torn down.
pub trait MapHost {
    /// `center` is `x = longitude, y = latitude`.
    fn set_view(&mut self, center: Coord<f64>, zoom: u8) -> Result<(), AtlasError>;
    fn fit_bounds(&mut self, bounds: Rect<f64>) -> Result<(), AtlasError>;
    fn invalidate_size(&mut self) -> Result<(), AtlasError>;

    fn add_feature(
        &mut self,
        id: FeatureId,
        shape: &MultiPolygon<f64>,
        style: &FeatureStyle,
    ) -> Result<(), AtlasError>;
    fn clear_features(&mut self) -> Result<(), AtlasError>;
    fn set_style(&mut self, id: FeatureId, style: &FeatureStyle) -> Result<(), AtlasError>;
    fn bring_to_front(&mut self, id: FeatureId) -> Result<(), AtlasError>;
    fn bind_popup(&mut self, id: FeatureId, popup: &PopupContent) -> Result<(), AtlasError>;
    fn open_popup(&mut self, id: FeatureId) -> Result<(), AtlasError>;
}
