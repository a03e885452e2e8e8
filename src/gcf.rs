//! High-depth GCF evaluation for confirmed candidates
//!
//! Once the FR pass confirms a candidate, its limiting value is needed to
//! feed the relation search. The convergent `p/q` is computed with unbounded
//! integers and only converted to a float at the end; the achieved precision
//! is measured empirically, as the number of significant digits on which two
//! convergents at successive depths agree. Depth is escalated by doubling
//! until the agreement reaches the requested digit count or the depth ceiling
//! is hit.

use log::debug;
use rug::{Float, Integer};

use crate::series::poly_terms;

/// Depth/precision escalation policy for the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Working precision (bits) of the float conversion.
    pub precision_bits: u32,
    /// Significant digits of agreement to aim for.
    pub target_digits: u32,
    pub initial_depth: u64,
    pub max_depth: u64,
}

impl Default for EvalOptions {
    fn default() -> EvalOptions {
        EvalOptions {
            precision_bits: 512,
            target_digits: 50,
            initial_depth: 2_000,
            max_depth: 32_000,
        }
    }
}

/// Result of evaluating one candidate.
#[derive(Debug, Clone)]
pub enum GcfEval {
    Value {
        value: Float,
        /// Significant digits two successive convergents agreed on.
        precision: u32,
    },
    /// The recursion hit a zero `b` term or a zero denominator; the fraction
    /// has no value at the requested depth.
    Degenerate { step: u64 },
}

/// Run the recursion for `depth` steps and return the convergent `(p, q)`.
pub fn convergent(a_coefs: &[i64], b_coefs: &[i64], depth: u64) -> Result<(Integer, Integer), u64> {
    let mut a_terms = poly_terms(a_coefs, depth + 1);
    let mut b_terms = poly_terms(b_coefs, depth + 1);

    let mut prev_q = Integer::new();
    let mut q = Integer::from(1);
    let mut prev_p = Integer::from(1);
    let mut p = a_terms.next().ok_or(0u64)?;
    let _ = b_terms.next();

    for (i, (a_i, b_i)) in a_terms.zip(b_terms).enumerate() {
        if b_i == 0 {
            return Err(i as u64);
        }
        let new_q = Integer::from(&a_i * &q) + Integer::from(&b_i * &prev_q);
        let new_p = Integer::from(&a_i * &p) + Integer::from(&b_i * &prev_p);
        prev_q = std::mem::replace(&mut q, new_q);
        prev_p = std::mem::replace(&mut p, new_p);
    }

    Ok((p, q))
}

fn convergent_value(a_coefs: &[i64], b_coefs: &[i64], depth: u64, prec: u32) -> GcfEval {
    match convergent(a_coefs, b_coefs, depth) {
        Err(step) => GcfEval::Degenerate { step },
        Ok((_, q)) if q == 0 => GcfEval::Degenerate { step: depth },
        Ok((p, q)) => {
            let value = Float::with_val(prec, &p) / Float::with_val(prec, &q);
            GcfEval::Value {
                value,
                precision: 0,
            }
        }
    }
}

/// Evaluate the candidate's limiting value, doubling the depth until two
/// successive convergents agree to `target_digits` (or the ceiling stops us),
/// and report the value together with the digits actually achieved.
pub fn evaluate_with_escalation(a_coefs: &[i64], b_coefs: &[i64], opts: &EvalOptions) -> GcfEval {
    let prec = opts.precision_bits;
    let digit_cap = precision_digit_cap(prec);

    let mut depth = opts.initial_depth;
    let mut prev = match convergent_value(a_coefs, b_coefs, depth, prec) {
        GcfEval::Value { value, .. } => value,
        degenerate => return degenerate,
    };

    loop {
        depth *= 2;
        let current = match convergent_value(a_coefs, b_coefs, depth, prec) {
            GcfEval::Value { value, .. } => value,
            degenerate => return degenerate,
        };
        let digits = agreement_digits(&prev, &current, digit_cap, prec);
        debug!("depth {} agrees with depth {} to {} digits", depth / 2, depth, digits);
        if digits >= opts.target_digits || depth * 2 > opts.max_depth {
            return GcfEval::Value {
                value: current,
                precision: digits,
            };
        }
        prev = current;
    }
}

/// Digits the working precision can meaningfully certify. Agreement is capped
/// below the full mantissa so downstream tolerances keep numerical headroom.
fn precision_digit_cap(precision_bits: u32) -> u32 {
    let digits = f64::from(precision_bits) * std::f64::consts::LOG10_2;
    (digits * 0.75) as u32
}

/// Significant digits on which `v1` and `v2` agree, clamped to `[0, cap]`.
fn agreement_digits(v1: &Float, v2: &Float, cap: u32, prec: u32) -> u32 {
    let diff = Float::with_val(prec, v1 - v2).abs();
    if diff == 0 {
        return cap;
    }
    let scale = Float::with_val(prec, v2.abs_ref());
    let relative = if scale == 0 { diff } else { diff / scale };
    let digits = -(relative.ln() / std::f64::consts::LN_10);
    match digits.to_f64() {
        d if d.is_finite() && d > 0.0 => (d as u32).min(cap),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_the_e_fraction() {
        // a(n) = n + 1, b(n) = n converges to 1 / (e - 2).
        let opts = EvalOptions {
            precision_bits: 256,
            target_digits: 30,
            initial_depth: 100,
            max_depth: 1_600,
        };
        let eval = evaluate_with_escalation(&[1, 1], &[1, 0], &opts);
        let GcfEval::Value { value, precision } = eval else {
            panic!("expected a value");
        };
        assert!(precision >= 30);

        let e = Float::with_val(256, 1).exp();
        let expected = Float::with_val(256, 1) / (e - 2u32);
        let error = Float::with_val(256, &value - &expected).abs();
        assert!(error < 1e-25, "value {value} too far from {expected}");
    }

    #[test]
    fn zero_b_term_is_degenerate() {
        // b(n) = n - 5 crosses zero inside the evaluated range.
        let opts = EvalOptions {
            initial_depth: 50,
            max_depth: 200,
            ..EvalOptions::default()
        };
        let eval = evaluate_with_escalation(&[1, 1], &[1, -5], &opts);
        assert!(matches!(eval, GcfEval::Degenerate { step: 4 }));
    }

    #[test]
    fn convergent_matches_hand_computed_values() {
        // a(n) = n + 1, b(n) = n by hand: p/q after three steps is 53/38.
        let (p, q) = convergent(&[1, 1], &[1, 0], 3).unwrap();
        assert_eq!(p, 53);
        assert_eq!(q, 38);
    }

    #[test]
    fn agreement_is_capped_when_values_coincide() {
        let v = Float::with_val(128, 1.5);
        let cap = precision_digit_cap(128);
        assert_eq!(agreement_digits(&v, &v.clone(), cap, 128), cap);
    }

    #[test]
    fn agreement_counts_matching_digits() {
        let v1 = Float::with_val(128, 1.234_567_89);
        let v2 = Float::with_val(128, 1.234_567_11);
        let digits = agreement_digits(&v1, &v2, precision_digit_cap(128), 128);
        assert!((6..=8).contains(&digits), "got {digits}");
    }
}
