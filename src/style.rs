use crate::{
    data::Region,
    palette::{ColorAssigner, HexColor},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureStyle {
    pub fill_color: HexColor,
    pub stroke_color: HexColor,
    pub stroke_weight: f64,
    pub stroke_opacity: f64,
    pub fill_opacity: f64,
}

/// Partial style merged over the current one; `None` keeps the existing value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StyleOverride {
    pub fill_color: Option<HexColor>,
    pub stroke_color: Option<HexColor>,
    pub stroke_weight: Option<f64>,
    pub stroke_opacity: Option<f64>,
    pub fill_opacity: Option<f64>,
}

impl StyleOverride {
    /// Hover look: heavier gray border, denser fill.
    pub const HIGHLIGHT: StyleOverride = StyleOverride {
        fill_color: None,
        stroke_color: Some(HexColor::from_u32(0x666666)),
        stroke_weight: Some(3.0),
        stroke_opacity: None,
        fill_opacity: Some(0.9),
    };

    pub fn apply(&self, base: &FeatureStyle) -> FeatureStyle {
        FeatureStyle {
            fill_color: self.fill_color.unwrap_or(base.fill_color),
            stroke_color: self.stroke_color.unwrap_or(base.stroke_color),
            stroke_weight: self.stroke_weight.unwrap_or(base.stroke_weight),
            stroke_opacity: self.stroke_opacity.unwrap_or(base.stroke_opacity),
            fill_opacity: self.fill_opacity.unwrap_or(base.fill_opacity),
        }
    }
}

pub struct FeatureStyler<C> {
    colors: C,
}

impl<C: ColorAssigner> FeatureStyler<C> {
    pub const STROKE_COLOR: HexColor = HexColor::WHITE;
    pub const STROKE_WEIGHT: f64 = 1.0;
    pub const FILL_OPACITY: f64 = 0.7;

    pub fn new(colors: C) -> Self {
        Self { colors }
    }

    /// Default look of a region; only the fill varies between calls.
    pub fn style_for(&self, _region: &Region) -> FeatureStyle {
        FeatureStyle {
            fill_color: self.colors.pick(),
            stroke_color: Self::STROKE_COLOR,
            stroke_weight: Self::STROKE_WEIGHT,
            stroke_opacity: 1.0,
            fill_opacity: Self::FILL_OPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::region;
    use crate::palette::{PALETTE, tests::CyclingPalette};

    #[test]
    fn default_style_uses_fixed_stroke_and_drawn_fill() {
        let styler = FeatureStyler::new(CyclingPalette::default());
        let cairo = region("Cairo", None);

        let first = styler.style_for(&cairo);
        let second = styler.style_for(&cairo);

        assert_eq!(first.fill_color, PALETTE[0]);
        assert_eq!(second.fill_color, PALETTE[1]);
        assert_eq!(first.stroke_color, HexColor::WHITE);
        assert_eq!(first.stroke_weight, 1.0);
        assert_eq!(first.stroke_opacity, 1.0);
        assert_eq!(first.fill_opacity, 0.7);
    }

    #[test]
    fn highlight_keeps_fill_color() {
        let styler = FeatureStyler::new(CyclingPalette::default());
        let base = styler.style_for(&region("Giza", None));
        let lit = StyleOverride::HIGHLIGHT.apply(&base);

        assert_eq!(lit.fill_color, base.fill_color);
        assert_eq!(lit.stroke_color, HexColor::from_u32(0x666666));
        assert_eq!(lit.stroke_weight, 3.0);
        assert_eq!(lit.fill_opacity, 0.9);
        assert_eq!(lit.stroke_opacity, base.stroke_opacity);
    }

    #[test]
    fn empty_override_is_identity() {
        let styler = FeatureStyler::new(CyclingPalette::default());
        let base = styler.style_for(&region("Aswan", None));
        assert_eq!(StyleOverride::default().apply(&base), base);
    }
}
