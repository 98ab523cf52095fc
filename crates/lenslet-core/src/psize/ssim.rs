use ndarray::Array2;

/// Gaussian window used by SSIM: 11 taps, sigma 1.5.
const KERNEL_RADIUS: usize = 5;
const KERNEL_SIGMA: f32 = 1.5;

fn gaussian_kernel() -> [f32; 2 * KERNEL_RADIUS + 1] {
    let mut kernel = [0.0f32; 2 * KERNEL_RADIUS + 1];
    let s2 = 2.0 * KERNEL_SIGMA * KERNEL_SIGMA;
    let mut sum = 0.0;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - KERNEL_RADIUS as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable gaussian blur with clamped borders.
fn blur(src: &Array2<f32>) -> Array2<f32> {
    let kernel = gaussian_kernel();
    let (h, w) = src.dim();

    let mut rows = Array2::<f32>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            let mut sum = 0.0;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src_col = (col as isize + ki as isize - KERNEL_RADIUS as isize)
                    .clamp(0, w as isize - 1) as usize;
                sum += src[[row, src_col]] * kv;
            }
            rows[[row, col]] = sum;
        }
    }

    let mut out = Array2::<f32>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            let mut sum = 0.0;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src_row = (row as isize + ki as isize - KERNEL_RADIUS as isize)
                    .clamp(0, h as isize - 1) as usize;
                sum += rows[[src_row, col]] * kv;
            }
            out[[row, col]] = sum;
        }
    }
    out
}

/// Mean structural similarity between two equally sized 8-bit-range f32
/// windows. 1.0 for identical content.
pub fn ssim(lhs: &Array2<f32>, rhs: &Array2<f32>) -> f32 {
    const C1: f32 = 6.5025;
    const C2: f32 = 58.5225;
    debug_assert_eq!(lhs.dim(), rhs.dim());

    let mu1 = blur(lhs);
    let mu2 = blur(rhs);

    let sigma1_sq = blur(&(lhs * lhs)) - &mu1 * &mu1;
    let sigma2_sq = blur(&(rhs * rhs)) - &mu2 * &mu2;
    let sigma12 = blur(&(lhs * rhs)) - &mu1 * &mu2;

    let mut sum = 0.0f64;
    let count = lhs.len() as f64;
    for i in 0..lhs.nrows() {
        for j in 0..lhs.ncols() {
            let m1m2 = mu1[[i, j]] * mu2[[i, j]];
            let numer = (2.0 * m1m2 + C1) * (2.0 * sigma12[[i, j]] + C2);
            let denom = (mu1[[i, j]] * mu1[[i, j]] + mu2[[i, j]] * mu2[[i, j]] + C1)
                * (sigma1_sq[[i, j]] + sigma2_sq[[i, j]] + C2);
            sum += (numer / denom) as f64;
        }
    }
    (sum / count) as f32
}
