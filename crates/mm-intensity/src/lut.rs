use mm_core::{Error, ImageViewMut};

/// Precomputed byte-to-byte remap, built once and applied per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut256 {
    table: [u8; 256],
}

impl Default for Lut256 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Lut256 {
    pub fn identity() -> Self {
        Self::from_fn(|v| v)
    }

    pub fn from_fn(mut f: impl FnMut(u8) -> u8) -> Self {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = f(i as u8);
        }
        Self { table }
    }

    /// `gain * round(255 * (v / 255)^gamma)`, saturated to `0..=255`.
    pub fn gamma(gamma: f64, gain: f64) -> Result<Self, Error> {
        if !gamma.is_finite() || gamma < 0.0 {
            return Err(Error::InvalidParameter("gamma must be finite and >= 0"));
        }
        if !gain.is_finite() || gain < 0.0 {
            return Err(Error::InvalidParameter("gain must be finite and >= 0"));
        }

        Ok(Self::from_fn(|v| {
            let curved = (255.0 * (v as f64 / 255.0).powf(gamma)).round();
            (gain * curved).clamp(0.0, 255.0) as u8
        }))
    }

    /// Values `>= high` saturate to 254 and values `< low` drop to 0. The
    /// rest scale by `255 / high`, capped at 254.
    pub fn contrast_stretch(low: u8, high: u8) -> Result<Self, Error> {
        if low >= high {
            return Err(Error::InvalidParameter("contrast stretch needs low < high"));
        }

        let scale = 255.0 / high as f64;
        Ok(Self::from_fn(|v| {
            if v >= high {
                254
            } else if v < low {
                0
            } else {
                (v as f64 * scale).round().min(254.0) as u8
            }
        }))
    }

    /// Scales by `percent / 100`, saturating at 255.
    pub fn amplify(percent: u32) -> Self {
        let factor = percent as f64 * 0.01;
        Self::from_fn(|v| (factor * v as f64).round().min(255.0) as u8)
    }

    #[inline]
    pub fn map(&self, v: u8) -> u8 {
        self.table[v as usize]
    }

    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }

    pub fn apply_u8(&self, img: &mut ImageViewMut<'_, u8>) {
        for y in 0..img.height() {
            for px in img.row_mut(y) {
                *px = self.map(*px);
            }
        }
    }

    /// Remaps every channel of every pixel.
    pub fn apply_rgb(&self, img: &mut ImageViewMut<'_, [u8; 3]>) {
        for y in 0..img.height() {
            for px in img.row_mut(y) {
                for c in px.iter_mut() {
                    *c = self.map(*c);
                }
            }
        }
    }
}

pub fn gamma_correct_u8(
    img: &mut ImageViewMut<'_, u8>,
    gamma: f64,
    gain: f64,
) -> Result<(), Error> {
    Lut256::gamma(gamma, gain)?.apply_u8(img);
    Ok(())
}

pub fn gamma_correct_rgb(
    img: &mut ImageViewMut<'_, [u8; 3]>,
    gamma: f64,
    gain: f64,
) -> Result<(), Error> {
    Lut256::gamma(gamma, gain)?.apply_rgb(img);
    Ok(())
}

pub fn contrast_stretch_rgb(
    img: &mut ImageViewMut<'_, [u8; 3]>,
    low: u8,
    high: u8,
) -> Result<(), Error> {
    Lut256::contrast_stretch(low, high)?.apply_rgb(img);
    Ok(())
}
