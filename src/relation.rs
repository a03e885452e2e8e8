//! Integer relation detection (PSLQ) and canonical reduction
//!
//! Given real numbers `x_0 … x_{n-1}`, PSLQ looks for integers `c_i`, not all
//! zero, with `Σ c_i·x_i ≈ 0` within a tolerance. The refiner feeds it
//! `[1, c, c², -v, -c·v, -c²·v]` for a candidate value `v` and a target
//! constant `c`, so a hit expresses `v` as a ratio of two quadratics in `c`.
//!
//! The search can return several algebraically equivalent vectors for the
//! same value; [`reduce_fraction`] collapses them to one canonical
//! numerator/denominator pair by dividing out the common GCD and fixing the
//! sign of the first nonzero coefficient.
//!
//! Everything runs in arbitrary-precision floats: at the tolerances involved
//! (`10^(1-precision)` for refined candidates) double precision would be
//! noise long before the relation bound is reached.

use rug::{Float, Integer};

/// Bounds for one PSLQ run.
#[derive(Debug, Clone, Copy)]
pub struct RelationOptions {
    /// Largest acceptable relation coefficient magnitude.
    pub max_coeff: i64,
    pub max_steps: usize,
    /// Working precision (bits) of the reduction matrices.
    pub precision_bits: u32,
}

impl Default for RelationOptions {
    fn default() -> RelationOptions {
        RelationOptions {
            max_coeff: 1_000,
            max_steps: 256,
            precision_bits: 512,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("relation search needs at least two values, got {0}")]
    TooFewValues(usize),

    #[error("non-finite input at index {0}")]
    NonFinite(usize),
}

/// Search for an integer relation among `xs` with residual below `tol`.
///
/// Returns `Ok(None)` when no relation exists within the coefficient and
/// iteration bounds; that is an informative outcome, not a failure.
pub fn find_integer_relation(
    xs: &[Float],
    tol: &Float,
    opts: &RelationOptions,
) -> Result<Option<Vec<Integer>>, RelationError> {
    let n = xs.len();
    if n < 2 {
        return Err(RelationError::TooFewValues(n));
    }
    for (i, x) in xs.iter().enumerate() {
        if !x.is_finite() {
            return Err(RelationError::NonFinite(i));
        }
    }
    let prec = opts.precision_bits;

    // An input already below tolerance has the trivial unit relation.
    for (i, x) in xs.iter().enumerate() {
        if Float::with_val(prec, x.abs_ref()) < *tol {
            let mut relation = vec![Integer::new(); n];
            relation[i] = Integer::from(1);
            return Ok(Some(relation));
        }
    }

    // Partial root-sum-squares, s[k] = sqrt(x_k^2 + … + x_{n-1}^2).
    let mut s: Vec<Float> = Vec::with_capacity(n);
    let mut acc = Float::with_val(prec, 0);
    for x in xs.iter().rev() {
        acc += Float::with_val(prec, x * x);
        s.push(acc.clone().sqrt());
    }
    s.reverse();

    let norm = s[0].clone();
    if norm == 0 {
        return Ok(None);
    }
    let mut y: Vec<Float> = xs
        .iter()
        .map(|x| Float::with_val(prec, x / &norm))
        .collect();
    for sk in s.iter_mut() {
        *sk /= &norm;
    }

    // Lower-trapezoidal H, n rows by n-1 columns.
    let mut h: Vec<Vec<Float>> = vec![vec![Float::with_val(prec, 0); n - 1]; n];
    for i in 0..n {
        for j in 0..n - 1 {
            if i == j {
                h[i][j] = Float::with_val(prec, &s[j + 1] / &s[j]);
            } else if i > j {
                let num = Float::with_val(prec, &y[i] * &y[j]);
                let den = Float::with_val(prec, &s[j] * &s[j + 1]);
                h[i][j] = -(num / den);
            }
        }
    }

    let mut a = identity(n);
    let mut b = identity(n);
    hermite_reduce(&mut h, &mut y, &mut a, &mut b, prec);

    let gamma = Float::with_val(prec, 4.0 / 3.0).sqrt();

    for _ in 0..opts.max_steps {
        // Row with the largest gamma-weighted diagonal entry.
        let mut m = 0;
        let mut best = Float::with_val(prec, -1);
        let mut weight = gamma.clone();
        for (i, row) in h.iter().enumerate().take(n - 1) {
            let scored = Float::with_val(prec, row[i].abs_ref()) * &weight;
            if scored > best {
                best = scored;
                m = i;
            }
            weight *= &gamma;
        }

        y.swap(m, m + 1);
        h.swap(m, m + 1);
        a.swap(m, m + 1);
        for row in b.iter_mut() {
            row.swap(m, m + 1);
        }

        // Restore the trapezoidal shape with a Givens rotation.
        if m + 1 < n - 1 {
            let mm = Float::with_val(prec, &h[m][m] * &h[m][m]);
            let mn = Float::with_val(prec, &h[m][m + 1] * &h[m][m + 1]);
            let t0 = (mm + mn).sqrt();
            if t0 != 0 {
                let t1 = Float::with_val(prec, &h[m][m] / &t0);
                let t2 = Float::with_val(prec, &h[m][m + 1] / &t0);
                for row in h.iter_mut().skip(m) {
                    let t3 = row[m].clone();
                    let t4 = row[m + 1].clone();
                    row[m] = Float::with_val(prec, &t1 * &t3) + Float::with_val(prec, &t2 * &t4);
                    row[m + 1] =
                        Float::with_val(prec, &t1 * &t4) - Float::with_val(prec, &t2 * &t3);
                }
            }
        }

        hermite_reduce(&mut h, &mut y, &mut a, &mut b, prec);

        // A y entry within tolerance of zero exposes a relation as the
        // corresponding column of B.
        let mut smallest = 0;
        for i in 1..n {
            if y[i].clone().abs() < y[smallest].clone().abs() {
                smallest = i;
            }
        }
        if Float::with_val(prec, y[smallest].abs_ref()) < *tol {
            let relation: Vec<Integer> = (0..n).map(|j| b[j][smallest].clone()).collect();
            if relation.iter().all(|c| *c == 0) {
                return Ok(None);
            }
            if relation
                .iter()
                .any(|c| Integer::from(c.abs_ref()) > opts.max_coeff)
            {
                return Ok(None);
            }
            return Ok(Some(relation));
        }

        // The diagonal of H bounds the norm of any remaining relation; once
        // that bound passes max_coeff nothing acceptable is left to find.
        let mut max_diag = Float::with_val(prec, 0);
        for (i, row) in h.iter().enumerate().take(n - 1) {
            let d = Float::with_val(prec, row[i].abs_ref());
            if d > max_diag {
                max_diag = d;
            }
        }
        if max_diag == 0 {
            return Ok(None);
        }
        let bound = Float::with_val(prec, 1) / max_diag;
        if bound > opts.max_coeff as f64 {
            return Ok(None);
        }
    }

    Ok(None)
}

fn identity(n: usize) -> Vec<Vec<Integer>> {
    let mut m = vec![vec![Integer::new(); n]; n];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = Integer::from(1);
    }
    m
}

/// Size-reduce H, mirroring every operation into y, A and B.
fn hermite_reduce(
    h: &mut [Vec<Float>],
    y: &mut [Float],
    a: &mut [Vec<Integer>],
    b: &mut [Vec<Integer>],
    prec: u32,
) {
    let n = y.len();
    for i in 1..n {
        for j in (0..i.min(n - 1)).rev() {
            if h[j][j] == 0 {
                continue;
            }
            let Some(t) = Float::with_val(prec, &h[i][j] / &h[j][j])
                .round()
                .to_integer()
            else {
                continue;
            };
            if t == 0 {
                continue;
            }
            let shift = Float::with_val(prec, &y[i] * &t);
            y[j] += shift;
            for k in 0..=j {
                let d = Float::with_val(prec, &h[j][k] * &t);
                h[i][k] -= d;
            }
            for k in 0..n {
                let da = Integer::from(&a[j][k] * &t);
                a[i][k] -= da;
                let db = Integer::from(&b[k][i] * &t);
                b[k][j] += db;
            }
        }
    }
}

/// Reduce the two 3-coefficient groups of a relation vector to lowest terms
/// and normalize the sign, so scalar multiples of one relation collapse to a
/// single canonical form.
pub fn reduce_fraction(top: &[Integer], bot: &[Integer]) -> (Vec<Integer>, Vec<Integer>) {
    let mut gcd = Integer::new();
    for c in top.iter().chain(bot) {
        gcd.gcd_mut(c);
    }
    if gcd == 0 {
        return (top.to_vec(), bot.to_vec());
    }

    let mut top: Vec<Integer> = top.iter().map(|c| Integer::from(c / &gcd)).collect();
    let mut bot: Vec<Integer> = bot.iter().map(|c| Integer::from(c / &gcd)).collect();

    let negative_lead = top
        .iter()
        .chain(&bot)
        .find(|c| **c != 0)
        .map(|c| *c < 0)
        .unwrap_or(false);
    if negative_lead {
        for c in top.iter_mut().chain(bot.iter_mut()) {
            *c = Integer::from(-&*c);
        }
    }
    (top, bot)
}
