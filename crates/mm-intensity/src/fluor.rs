use mm_core::ImageViewMut;

use crate::Lut256;

/// Display color for one fluorescence channel, packed as `0xRRGGBB`.
///
/// Only whether a component is nonzero matters: the channel is written into
/// every output channel whose component is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoColor(pub u32);

impl PseudoColor {
    pub const RED: Self = Self(0xFF0000);
    pub const GREEN: Self = Self(0x00FF00);
    pub const BLUE: Self = Self(0x0000FF);

    /// `[red, green, blue]` output channels this color contributes to.
    pub fn routes(self) -> [bool; 3] {
        [
            (self.0 >> 16) & 0xFF != 0,
            (self.0 >> 8) & 0xFF != 0,
            self.0 & 0xFF != 0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFilter {
    /// Amplification in percent, 100 keeps the channel as is.
    pub amplification: u32,
    pub color: PseudoColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluorescenceConfig {
    pub red: ChannelFilter,
    pub green: ChannelFilter,
    pub blue: ChannelFilter,
}

impl Default for FluorescenceConfig {
    fn default() -> Self {
        Self {
            red: ChannelFilter {
                amplification: 100,
                color: PseudoColor::RED,
            },
            green: ChannelFilter {
                amplification: 100,
                color: PseudoColor::GREEN,
            },
            blue: ChannelFilter {
                amplification: 100,
                color: PseudoColor::BLUE,
            },
        }
    }
}

impl FluorescenceConfig {
    /// True when compositing would reproduce the input.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    fn filters(&self) -> [ChannelFilter; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Re-colors an RGB fluorescence image in place.
///
/// Each source channel is amplified, then max-composited into the output
/// channels selected by its pseudo-color. Returns `false` without touching
/// the image when `cfg` is the identity.
pub fn fluorescence_composite(
    img: &mut ImageViewMut<'_, [u8; 3]>,
    cfg: &FluorescenceConfig,
) -> bool {
    if cfg.is_identity() {
        return false;
    }

    let filters = cfg.filters();
    let luts = filters.map(|f| Lut256::amplify(f.amplification));
    let routes = filters.map(|f| f.color.routes());

    for y in 0..img.height() {
        for px in img.row_mut(y) {
            let src = *px;
            let mut out = [0u8; 3];
            for (ch, &value) in src.iter().enumerate() {
                let v = luts[ch].map(value);
                for (dst, &routed) in out.iter_mut().zip(&routes[ch]) {
                    if routed {
                        *dst = (*dst).max(v);
                    }
                }
            }
            *px = out;
        }
    }

    true
}
