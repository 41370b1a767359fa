use mm_core::{Error, Image, ImageView};

/// Nearest-neighbor resample of a binary mask to `width x height`.
///
/// Both axes use the single ratio `src.width() / width`, which keeps the
/// source aspect ratio. Output rows that map below the last source row stay
/// background. Output pixels are `0` or `255`.
pub fn resize_mask_nearest(
    src: &ImageView<'_, u8>,
    width: usize,
    height: usize,
) -> Result<Image<u8>, Error> {
    if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
        return Err(Error::EmptyDimensions);
    }

    let ratio = src.width() as f64 / width as f64;
    let mut out = Image::new_fill(width, height, 0u8);
    let mut dst = out.as_view_mut();

    for y in 0..height {
        let sy = (y as f64 * ratio).round() as usize;
        if sy >= src.height() {
            continue;
        }

        let src_row = src.row(sy);
        for (x, px) in dst.row_mut(y).iter_mut().enumerate() {
            let sx = ((x as f64 * ratio).round() as usize).min(src.width() - 1);
            *px = if src_row[sx] != 0 { 255 } else { 0 };
        }
    }

    Ok(out)
}
