//! Savitzky–Golay differentiation.

use crate::error::ChartError;

/// First derivative (per sample) of `values`, smoothed with a least-squares
/// polynomial of `order` over a sliding `window`.
///
/// Each interior point takes the derivative of the fit centred on it. The
/// first and last `window / 2` points use the fit over the first and last
/// full window instead of padding the series.
pub fn savgol_derivative(
    values: &[f64],
    window: usize,
    order: usize,
) -> Result<Vec<f64>, ChartError> {
    if window % 2 == 0 || order >= window {
        return Err(ChartError::InvalidWindow { window, order });
    }
    if values.len() < window {
        return Err(ChartError::SeriesTooShort {
            field: String::new(),
            len: values.len(),
            window,
        });
    }

    let half = window / 2;
    let n = values.len();
    let mut out = vec![0.0; n];

    let head = fit(&values[..window], order);
    for (i, slot) in out.iter_mut().enumerate().take(half) {
        *slot = slope(&head, i as f64 - half as f64);
    }
    for i in half..n - half {
        out[i] = fit(&values[i - half..=i + half], order)[1];
    }
    let tail = fit(&values[n - window..], order);
    for i in n - half..n {
        out[i] = slope(&tail, (i + window - n) as f64 - half as f64);
    }

    Ok(out)
}

/// Polynomial coefficients (constant term first) fitting `ys` sampled at
/// `-h..=h`, where `h = ys.len() / 2`.
fn fit(ys: &[f64], order: usize) -> Vec<f64> {
    let half = (ys.len() / 2) as f64;
    let terms = order + 1;

    // normal equations: (XᵀX) a = Xᵀy
    let mut a = vec![vec![0.0; terms + 1]; terms];
    for (j, y) in ys.iter().enumerate() {
        let x = j as f64 - half;
        let powers: Vec<f64> = (0..terms).map(|k| x.powi(k as i32)).collect();
        for r in 0..terms {
            for c in 0..terms {
                a[r][c] += powers[r] * powers[c];
            }
            a[r][terms] += powers[r] * y;
        }
    }

    solve(a)
}

/// Gauss-Jordan elimination with partial pivoting on an augmented matrix.
fn solve(mut a: Vec<Vec<f64>>) -> Vec<f64> {
    let n = a.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);

        let p = a[col][col];
        if p == 0.0 {
            continue;
        }
        for c in col..=n {
            a[col][c] /= p;
        }
        for r in 0..n {
            if r != col {
                let factor = a[r][col];
                for c in col..=n {
                    a[r][c] -= factor * a[col][c];
                }
            }
        }
    }
    a.into_iter().map(|row| row[n]).collect()
}

/// d/dx of the polynomial at `x`.
fn slope(coeffs: &[f64], x: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, a)| k as f64 * a * x.powi(k as i32 - 1))
        .sum()
}
