use std::fmt;

use rand::{Rng, rng};
use ratatui::style::Color;

/// 24-bit RGB color, written as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HexColor(pub u8, pub u8, pub u8);

impl HexColor {
    pub const WHITE: HexColor = HexColor::from_u32(0xFFFFFF);

    pub const fn from_u32(rgb: u32) -> Self {
        HexColor((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Scales the color toward black; the terminal background stands in for
    /// whatever would show through a translucent fill.
    pub fn shade(self, opacity: f64) -> Color {
        let k = opacity.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f64 * k).round() as u8;
        Color::Rgb(scale(self.0), scale(self.1), scale(self.2))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl From<HexColor> for Color {
    fn from(c: HexColor) -> Self {
        Color::Rgb(c.0, c.1, c.2)
    }
}

pub const PALETTE: [HexColor; 25] = [
    HexColor::from_u32(0xE63946), HexColor::from_u32(0xF1FAEE), HexColor::from_u32(0xA8DADC),
    HexColor::from_u32(0x457B9D), HexColor::from_u32(0x1D3557), HexColor::from_u32(0xFF9F1C),
    HexColor::from_u32(0xFFBF69), HexColor::from_u32(0xCBF3F0), HexColor::from_u32(0x2EC4B6),
    HexColor::from_u32(0x011627), HexColor::from_u32(0xFF69B4), HexColor::from_u32(0xA2D2FF),
    HexColor::from_u32(0xBDE0FE), HexColor::from_u32(0xCDB4DB), HexColor::from_u32(0xFFC8DD),
    HexColor::from_u32(0x06D6A0), HexColor::from_u32(0x118AB2), HexColor::from_u32(0xEF476F),
    HexColor::from_u32(0xFFD166), HexColor::from_u32(0x073B4C), HexColor::from_u32(0x5E548E),
    HexColor::from_u32(0x9F86C0), HexColor::from_u32(0xBE95C4), HexColor::from_u32(0xE0B1CB),
    HexColor::from_u32(0xF8F9FA),
];

/// Source of fill colors for freshly rendered regions.
pub trait ColorAssigner {
    fn pick(&self) -> HexColor;
}

/// Uniform draw from [`PALETTE`]. Neighbours may end up with the same color.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPalette;

impl ColorAssigner for RandomPalette {
    fn pick(&self) -> HexColor {
        let mut rng = rng();
        PALETTE[rng.random_range(0..PALETTE.len())]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    /// Walks the palette in order so tests can predict every fill.
    #[derive(Default)]
    pub(crate) struct CyclingPalette {
        next: Cell<usize>,
    }

    impl ColorAssigner for CyclingPalette {
        fn pick(&self) -> HexColor {
            let i = self.next.get();
            self.next.set(i + 1);
            PALETTE[i % PALETTE.len()]
        }
    }

    #[test]
    fn every_entry_is_reachable_within_a_thousand_draws() {
        let seen: HashSet<HexColor> = (0..1000).map(|_| RandomPalette.pick()).collect();
        assert!(seen.iter().all(|c| PALETTE.contains(c)));
        assert_eq!(seen.len(), PALETTE.len());
    }

    #[test]
    fn palette_entries_are_distinct() {
        let unique: HashSet<_> = PALETTE.iter().collect();
        assert_eq!(unique.len(), PALETTE.len());
    }

    #[test]
    fn displays_as_uppercase_hex() {
        assert_eq!(PALETTE[0].to_string(), "#E63946");
        assert_eq!(HexColor::WHITE.to_string(), "#FFFFFF");
    }

    #[test]
    fn shade_darkens_proportionally() {
        assert_eq!(HexColor::WHITE.shade(0.5), Color::Rgb(128, 128, 128));
        assert_eq!(HexColor::WHITE.shade(2.0), Color::Rgb(255, 255, 255));
        assert_eq!(HexColor::WHITE.shade(0.0), Color::Rgb(0, 0, 0));
    }

    proptest::proptest! {
        #[test]
        fn pick_stays_in_palette(_round in 0u32..500) {
            proptest::prop_assert!(PALETTE.contains(&RandomPalette.pick()));
        }
    }
}
