//! Farneback dense optical flow on `ndarray` planes.
//!
//! Each frame is locally approximated by a quadratic polynomial
//! `f(x) ~ x' A x + b' x + c` fitted over a Gaussian-weighted neighbourhood.
//! A displacement `d` turns `b` into `b - 2 A d`, so `d` is recovered from the
//! change in `b` by solving a 2x2 system averaged over a window. The estimate
//! runs coarse-to-fine over an image pyramid, refining the flow a fixed number
//! of times per level.

use crate::config::FlowParams;
use ndarray::Array2;
use std::f64::consts::TAU;

/// Pyramid levels smaller than this on either side are skipped
const MIN_LEVEL_SIZE: usize = 32;

/// Regularization added to the 2x2 determinant
const DET_REGULARIZATION: f32 = 1e-3;

/// Per-pixel displacement from the previous frame to the next, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    pub dx: Array2<f32>,
    pub dy: Array2<f32>,
}

impl FlowField {
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            dx: Array2::zeros((height, width)),
            dy: Array2::zeros((height, width)),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dx.dim()
    }

    pub fn is_finite(&self) -> bool {
        self.dx.iter().chain(self.dy.iter()).all(|v| v.is_finite())
    }

    /// Mean magnitude and mean angle (radians in `[0, 2pi)`) over all pixels
    pub fn polar_means(&self) -> (f64, f64) {
        let count = self.dx.len();
        if count == 0 {
            return (0.0, 0.0);
        }
        let mut magnitude = 0.0;
        let mut angle = 0.0;
        for (&dx, &dy) in self.dx.iter().zip(self.dy.iter()) {
            let (dx, dy) = (dx as f64, dy as f64);
            magnitude += (dx * dx + dy * dy).sqrt();
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            let theta = dy.atan2(dx);
            angle += if theta < 0.0 { theta + TAU } else { theta };
        }
        (magnitude / count as f64, angle / count as f64)
    }

    /// Bilinear resize to a new grid, rescaling vectors to the new pixel units
    fn upscale(&self, height: usize, width: usize) -> Self {
        let (old_h, old_w) = self.dim();
        let sx = width as f32 / old_w as f32;
        let sy = height as f32 / old_h as f32;
        let mut dx = resize_bilinear(&self.dx, height, width);
        let mut dy = resize_bilinear(&self.dy, height, width);
        dx.mapv_inplace(|v| v * sx);
        dy.mapv_inplace(|v| v * sy);
        Self { dx, dy }
    }
}

/// Quadratic expansion coefficients (the constant term is not needed)
struct Coefficients {
    b1: Array2<f32>,
    b2: Array2<f32>,
    a11: Array2<f32>,
    a22: Array2<f32>,
    a12: Array2<f32>,
}

/// Weighted least-squares projection of a neighbourhood onto the basis
/// `[1, x, y, x^2, y^2, xy]`
struct PolyExpansion {
    taps: Vec<(isize, isize, [f32; 6])>,
}

impl PolyExpansion {
    fn new(poly_n: usize, sigma: f32) -> Self {
        let n = (poly_n / 2) as isize;
        let sigma = sigma as f64;
        let mut offsets = Vec::new();
        let mut gram = [[0.0_f64; 6]; 6];

        for dy in -n..=n {
            for dx in -n..=n {
                let (x, y) = (dx as f64, dy as f64);
                let weight = (-(x * x + y * y) / (2.0 * sigma * sigma)).exp();
                let basis = [1.0, x, y, x * x, y * y, x * y];
                for i in 0..6 {
                    for j in 0..6 {
                        gram[i][j] += weight * basis[i] * basis[j];
                    }
                }
                offsets.push((dx, dy, weight, basis));
            }
        }

        let taps = offsets
            .into_iter()
            .map(|(dx, dy, weight, basis)| {
                let rhs = basis.map(|b| weight * b);
                let p = solve_linear(gram, rhs).unwrap_or([0.0; 6]);
                (dx, dy, p.map(|v| v as f32))
            })
            .collect();

        Self { taps }
    }

    fn expand(&self, image: &Array2<f32>) -> Coefficients {
        let (h, w) = image.dim();
        let mut r = [(); 6].map(|_| Array2::<f32>::zeros((h, w)));

        for y in 0..h {
            for x in 0..w {
                let mut acc = [0.0_f32; 6];
                for (dx, dy, p) in &self.taps {
                    let sx = clamp_index(x as isize + dx, w);
                    let sy = clamp_index(y as isize + dy, h);
                    let v = image[[sy, sx]];
                    for k in 0..6 {
                        acc[k] += p[k] * v;
                    }
                }
                for k in 0..6 {
                    r[k][[y, x]] = acc[k];
                }
            }
        }

        let [_, b1, b2, a11, a22, mut a12] = r;
        a12.mapv_inplace(|v| v * 0.5);
        Coefficients {
            b1,
            b2,
            a11,
            a22,
            a12,
        }
    }
}

/// Farneback flow estimator
pub struct FarnebackFlow {
    params: FlowParams,
    expansion: PolyExpansion,
}

impl FarnebackFlow {
    pub fn new(params: FlowParams) -> Self {
        let expansion = PolyExpansion::new(params.poly_n, params.poly_sigma);
        Self { params, expansion }
    }

    /// Dense flow taking `prev` onto `next`; both planes must share a shape
    pub fn compute(&self, prev: &Array2<f32>, next: &Array2<f32>) -> FlowField {
        let _span = tracing::debug_span!("farneback").entered();

        let (height, width) = prev.dim();
        debug_assert_eq!(prev.dim(), next.dim());

        let mut flow: Option<FlowField> = None;
        for level in (0..self.params.levels).rev() {
            let scale = self.params.pyr_scale.powi(level as i32);
            let level_w = ((width as f32 * scale).round() as usize).max(1);
            let level_h = ((height as f32 * scale).round() as usize).max(1);
            if level > 0 && (level_w < MIN_LEVEL_SIZE || level_h < MIN_LEVEL_SIZE) {
                continue;
            }

            let (prev_l, next_l) = if level == 0 {
                (prev.clone(), next.clone())
            } else {
                let sigma = (1.0 / scale - 1.0) * 0.5;
                (
                    resize_bilinear(&gaussian_blur(prev, sigma), level_h, level_w),
                    resize_bilinear(&gaussian_blur(next, sigma), level_h, level_w),
                )
            };

            let mut current = match flow.take() {
                Some(coarse) => coarse.upscale(level_h, level_w),
                None => FlowField::zeros(level_h, level_w),
            };

            let r1 = self.expansion.expand(&prev_l);
            let r2 = self.expansion.expand(&next_l);
            for _ in 0..self.params.iterations {
                current = self.refine(&r1, &r2, &current);
            }
            flow = Some(current);
        }

        flow.unwrap_or_else(|| FlowField::zeros(height, width))
    }

    fn refine(&self, r1: &Coefficients, r2: &Coefficients, flow: &FlowField) -> FlowField {
        let (h, w) = flow.dim();
        let mut g11 = Array2::<f32>::zeros((h, w));
        let mut g12 = Array2::<f32>::zeros((h, w));
        let mut g22 = Array2::<f32>::zeros((h, w));
        let mut h1 = Array2::<f32>::zeros((h, w));
        let mut h2 = Array2::<f32>::zeros((h, w));

        for y in 0..h {
            for x in 0..w {
                let dx = flow.dx[[y, x]];
                let dy = flow.dy[[y, x]];
                let fx = x as f32 + dx;
                let fy = y as f32 + dy;

                let a11 = (r1.a11[[y, x]] + sample_bilinear(&r2.a11, fx, fy)) * 0.5;
                let a12 = (r1.a12[[y, x]] + sample_bilinear(&r2.a12, fx, fy)) * 0.5;
                let a22 = (r1.a22[[y, x]] + sample_bilinear(&r2.a22, fx, fy)) * 0.5;

                let db1 = -0.5 * (sample_bilinear(&r2.b1, fx, fy) - r1.b1[[y, x]])
                    + a11 * dx
                    + a12 * dy;
                let db2 = -0.5 * (sample_bilinear(&r2.b2, fx, fy) - r1.b2[[y, x]])
                    + a12 * dx
                    + a22 * dy;

                g11[[y, x]] = a11 * a11 + a12 * a12;
                g12[[y, x]] = a12 * (a11 + a22);
                g22[[y, x]] = a12 * a12 + a22 * a22;
                h1[[y, x]] = a11 * db1 + a12 * db2;
                h2[[y, x]] = a12 * db1 + a22 * db2;
            }
        }

        let window = self.params.window_size;
        let g11 = box_blur(&g11, window);
        let g12 = box_blur(&g12, window);
        let g22 = box_blur(&g22, window);
        let h1 = box_blur(&h1, window);
        let h2 = box_blur(&h2, window);

        let mut next = FlowField::zeros(h, w);
        for y in 0..h {
            for x in 0..w {
                let (a, b, c) = (g11[[y, x]], g12[[y, x]], g22[[y, x]]);
                let idet = 1.0 / (a * c - b * b + DET_REGULARIZATION);
                next.dx[[y, x]] = (c * h1[[y, x]] - b * h2[[y, x]]) * idet;
                next.dy[[y, x]] = (a * h2[[y, x]] - b * h1[[y, x]]) * idet;
            }
        }
        next
    }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

fn sample_bilinear(image: &Array2<f32>, x: f32, y: f32) -> f32 {
    let (h, w) = image.dim();
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = image[[y0, x0]] * (1.0 - fx) + image[[y0, x1]] * fx;
    let bottom = image[[y1, x0]] * (1.0 - fx) + image[[y1, x1]] * fx;
    top * (1.0 - fy) + bottom * fy
}

fn resize_bilinear(image: &Array2<f32>, height: usize, width: usize) -> Array2<f32> {
    let (h, w) = image.dim();
    if (h, w) == (height, width) {
        return image.clone();
    }
    let sx = w as f32 / width as f32;
    let sy = h as f32 / height as f32;
    Array2::from_shape_fn((height, width), |(y, x)| {
        let src_x = (x as f32 + 0.5) * sx - 0.5;
        let src_y = (y as f32 + 0.5) * sy - 0.5;
        sample_bilinear(image, src_x, src_y)
    })
}

/// Separable convolution with replicated borders
fn convolve_separable(image: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = image.dim();
    let radius = (kernel.len() / 2) as isize;

    let horizontal: Array2<f32> = Array2::from_shape_fn((h, w), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &wgt)| wgt * image[[y, clamp_index(x as isize + k as isize - radius, w)]])
            .sum()
    });

    Array2::from_shape_fn((h, w), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &wgt)| wgt * horizontal[[clamp_index(y as isize + k as isize - radius, h), x]])
            .sum()
    })
}

fn gaussian_blur(image: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if sigma <= 0.0 {
        return image.clone();
    }
    let radius = (sigma * 3.0).ceil().max(1.0) as isize;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= total);
    convolve_separable(image, &kernel)
}

fn box_blur(image: &Array2<f32>, size: usize) -> Array2<f32> {
    let size = size | 1;
    let kernel = vec![1.0 / size as f32; size];
    convolve_separable(image, &kernel)
}

/// Gaussian elimination with partial pivoting
fn solve_linear<const N: usize>(mut a: [[f64; N]; N], mut rhs: [f64; N]) -> Option<[f64; N]> {
    for col in 0..N {
        let pivot = (col..N).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..N {
            let factor = a[row][col] / a[col][col];
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0; N];
    for row in (0..N).rev() {
        let tail: f64 = (row + 1..N).map(|k| a[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / a[row][row];
    }
    Some(x)
}
