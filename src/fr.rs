//! Factorial reduction detection
//!
//! As the three-term recursion for a GCF's numerator `p` and denominator `q`
//! runs, the two share an ever-growing common divisor. For the fractions we
//! are hunting, that GCD grows super-exponentially (we call the property
//! factorial reduction), which makes the quantity
//!
//! ```text
//! ln(gcd(p_i, q_i)) / i + deg(a) * (1 - ln(i))
//! ```
//!
//! stabilize with depth. The detector samples that estimate once every
//! [`BURST_NUMBER`] steps to smooth out short-range fluctuation and decides
//! from the sample gaps: shrinking gaps below [`CONVERGENCE_THRESHOLD`] mean
//! factorial reduction, a gap that grows again means the estimate is drifting
//! and the candidate is rejected early. Most of the population fails within a
//! few samples, which is what makes the first enumeration pass affordable.
//!
//! `p` and `q` are unbounded integers and the estimate is computed in
//! arbitrary-precision floats; fixed-width arithmetic overflows long before
//! the decision point and silently corrupts the verdict.

use rug::{Float, Integer};

/// Steps between GCD samples.
pub const BURST_NUMBER: usize = 200;

/// Sample gap under which the estimate counts as converged.
pub const CONVERGENCE_THRESHOLD: f64 = 0.1;

/// Depth of the term streams during the first enumeration pass.
pub const FIRST_ENUMERATION_MAX_DEPTH: u64 = 1_000;

/// Tuning knobs for [`check_for_fr`].
#[derive(Debug, Clone, Copy)]
pub struct FrOptions {
    pub burst_number: usize,
    /// Earliest step at which the first sample may be taken.
    pub min_iters: usize,
    pub convergence_threshold: f64,
    /// Working precision (bits) of the log-GCD estimates.
    pub precision_bits: u32,
}

impl Default for FrOptions {
    fn default() -> FrOptions {
        FrOptions {
            burst_number: BURST_NUMBER,
            min_iters: 1,
            convergence_threshold: CONVERGENCE_THRESHOLD,
            precision_bits: 256,
        }
    }
}

/// Outcome of one FR test: the verdict and the step at which it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrReport {
    pub has_fr: bool,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Converged,
    Diverging,
    Undecided,
}

/// Rolling decision state over the sampled estimates.
pub(crate) struct SampleTrack {
    threshold: f64,
    precision_bits: u32,
    samples: Vec<Float>,
}

impl SampleTrack {
    pub(crate) fn new(threshold: f64, precision_bits: u32) -> SampleTrack {
        SampleTrack {
            threshold,
            precision_bits,
            samples: Vec::new(),
        }
    }

    fn gap(&self, i: usize, j: usize) -> Float {
        Float::with_val(self.precision_bits, &self.samples[i] - &self.samples[j]).abs()
    }

    pub(crate) fn push(&mut self, sample: Float) -> Verdict {
        self.samples.push(sample);
        let n = self.samples.len();

        // A sample sequence that stops approaching its predecessor is
        // drifting, not converging; reject before burning more depth.
        if n >= 3 && self.gap(n - 2, n - 1) > self.gap(n - 2, n - 3) {
            return Verdict::Diverging;
        }
        if n >= 2 && self.gap(n - 2, n - 1) < self.threshold {
            return Verdict::Converged;
        }
        Verdict::Undecided
    }
}

/// Decide whether the GCF given by the two term streams exhibits factorial
/// reduction.
///
/// `a_terms` supplies `a_0, a_1, …` and `b_terms` supplies `b_0, b_1, …`
/// (`b_0` is discarded; it does not participate in the recursion). A zero
/// `b_i` makes the recursion structurally degenerate and is reported as an
/// immediate negative at that step. Given identical streams the report is
/// identical on every run.
pub fn check_for_fr<A, B>(a_terms: A, b_terms: B, a_deg: usize, opts: FrOptions) -> FrReport
where
    A: IntoIterator<Item = Integer>,
    B: IntoIterator<Item = Integer>,
{
    let mut a_terms = a_terms.into_iter();
    let mut b_terms = b_terms.into_iter();
    let prec = opts.precision_bits;

    let mut prev_q = Integer::new();
    let mut q = Integer::from(1);
    let mut prev_p = Integer::from(1);
    let mut p = match a_terms.next() {
        Some(a_0) => a_0,
        None => return FrReport { has_fr: false, depth: 0 },
    };
    let _ = b_terms.next();

    let mut next_sample = opts.burst_number.max(opts.min_iters);
    let mut track = SampleTrack::new(opts.convergence_threshold, prec);
    let mut last_step = 0;

    for (i, (a_i, b_i)) in a_terms.zip(b_terms).enumerate() {
        if b_i == 0 {
            return FrReport { has_fr: false, depth: i };
        }

        let new_q = Integer::from(&a_i * &q) + Integer::from(&b_i * &prev_q);
        let new_p = Integer::from(&a_i * &p) + Integer::from(&b_i * &prev_p);
        prev_q = std::mem::replace(&mut q, new_q);
        prev_p = std::mem::replace(&mut p, new_p);
        last_step = i;

        if i == next_sample {
            next_sample += opts.burst_number;

            let gcd = Integer::from(p.gcd_ref(&q));
            let step = Float::with_val(prec, i as u64);
            let ln_step = step.clone().ln();
            let estimate = Float::with_val(prec, &gcd).ln() / step
                + (Float::with_val(prec, 1) - ln_step) * (a_deg as u32);

            match track.push(estimate) {
                Verdict::Converged => return FrReport { has_fr: true, depth: i },
                Verdict::Diverging => return FrReport { has_fr: false, depth: i },
                Verdict::Undecided => {}
            }
        }
    }

    FrReport {
        has_fr: false,
        depth: last_step,
    }
}
