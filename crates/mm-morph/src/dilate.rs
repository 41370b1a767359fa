use mm_core::{Connectivity, Image, ImageView, neighbor};

/// One binary dilation step. A pixel is set in the output if it or any of its
/// in-bounds neighbors is set in `src`.
pub fn dilate_binary_u8(src: &ImageView<'_, u8>, connectivity: Connectivity) -> Image<u8> {
    let (width, height) = src.dims();
    let mut out = Image::new_fill(width, height, 0u8);
    if width == 0 || height == 0 {
        return out;
    }

    let mut dst = out.as_view_mut();
    for y in 0..height {
        for x in 0..width {
            let any_set = src.row(y)[x] != 0
                || connectivity.offsets().iter().any(|&(dx, dy)| {
                    neighbor(x, y, dx, dy, width, height)
                        .is_some_and(|(nx, ny)| src.row(ny)[nx] != 0)
                });

            dst.row_mut(y)[x] = if any_set { 255 } else { 0 };
        }
    }

    out
}
