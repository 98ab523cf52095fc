use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// Source coordinate for center-aligned bilinear sampling: the sample
/// grid of both images is anchored at pixel centers.
#[inline]
fn sample_coord(dst_idx: usize, scale: f32, src_len: usize) -> (usize, usize, f32) {
    let pos = (dst_idx as f32 + 0.5) * scale - 0.5;
    let pos = pos.clamp(0.0, src_len as f32 - 1.0);
    let i0 = pos.floor() as usize;
    let i1 = (i0 + 1).min(src_len - 1);
    (i0, i1, pos - i0 as f32)
}

/// Bilinear resize into a preallocated f32 destination.
pub fn resize_bilinear_f32_into(src: ArrayView2<'_, f32>, mut dst: ArrayViewMut2<'_, f32>) {
    let (src_h, src_w) = src.dim();
    let (dst_h, dst_w) = dst.dim();
    if (src_h, src_w) == (dst_h, dst_w) {
        dst.assign(&src);
        return;
    }
    let scale_y = src_h as f32 / dst_h as f32;
    let scale_x = src_w as f32 / dst_w as f32;

    for dy in 0..dst_h {
        let (y0, y1, fy) = sample_coord(dy, scale_y, src_h);
        for dx in 0..dst_w {
            let (x0, x1, fx) = sample_coord(dx, scale_x, src_w);
            let top = src[[y0, x0]] * (1.0 - fx) + src[[y0, x1]] * fx;
            let bottom = src[[y1, x0]] * (1.0 - fx) + src[[y1, x1]] * fx;
            dst[[dy, dx]] = top * (1.0 - fy) + bottom * fy;
        }
    }
}

/// Bilinear resize into a preallocated 8-bit destination.
pub fn resize_bilinear_u8_into(src: ArrayView2<'_, u8>, mut dst: ArrayViewMut2<'_, u8>) {
    let (src_h, src_w) = src.dim();
    let (dst_h, dst_w) = dst.dim();
    if (src_h, src_w) == (dst_h, dst_w) {
        dst.assign(&src);
        return;
    }
    let scale_y = src_h as f32 / dst_h as f32;
    let scale_x = src_w as f32 / dst_w as f32;

    for dy in 0..dst_h {
        let (y0, y1, fy) = sample_coord(dy, scale_y, src_h);
        for dx in 0..dst_w {
            let (x0, x1, fx) = sample_coord(dx, scale_x, src_w);
            let top =
                src[[y0, x0]] as f32 * (1.0 - fx) + src[[y0, x1]] as f32 * fx;
            let bottom =
                src[[y1, x0]] as f32 * (1.0 - fx) + src[[y1, x1]] as f32 * fx;
            let val = top * (1.0 - fy) + bottom * fy;
            dst[[dy, dx]] = val.round().clamp(0.0, 255.0) as u8;
        }
    }
}

pub fn resize_bilinear_u8(src: ArrayView2<'_, u8>, dst_h: usize, dst_w: usize) -> Array2<u8> {
    let mut dst = Array2::zeros((dst_h, dst_w));
    resize_bilinear_u8_into(src, dst.view_mut());
    dst
}
