//! Term streams for compact polynomials
//!
//! The recursion consumes its coefficients as plain sequences `a_0, a_1, …`;
//! this module turns a compact coefficient tuple (highest degree first) into
//! that stream by evaluating the polynomial at `n = 0, 1, 2, …` with Horner's
//! rule over unbounded integers.

use rug::Integer;

/// Iterator over `poly(0), poly(1), …, poly(max_depth - 1)`.
#[derive(Debug, Clone)]
pub struct CompactPolyTerms {
    coefs: Vec<i64>,
    n: u64,
    remaining: u64,
}

impl Iterator for CompactPolyTerms {
    type Item = Integer;

    fn next(&mut self) -> Option<Integer> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut acc = Integer::new();
        for &coef in &self.coefs {
            acc *= self.n;
            acc += coef;
        }
        self.n += 1;
        Some(acc)
    }
}

/// Stream the first `max_depth` terms of the polynomial with the given
/// compact coefficients.
pub fn poly_terms(coefs: &[i64], max_depth: u64) -> CompactPolyTerms {
    CompactPolyTerms {
        coefs: coefs.to_vec(),
        n: 0,
        remaining: max_depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(coefs: &[i64], depth: u64) -> Vec<i64> {
        poly_terms(coefs, depth)
            .map(|t| t.to_i64().unwrap())
            .collect()
    }

    #[test]
    fn linear_poly_streams_n_values() {
        assert_eq!(terms(&[1, 0], 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(terms(&[2, 1], 5), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn constant_poly_repeats() {
        assert_eq!(terms(&[7], 4), vec![7, 7, 7, 7]);
    }

    #[test]
    fn quadratic_poly() {
        // n^2 - 1
        assert_eq!(terms(&[1, 0, -1], 4), vec![-1, 0, 3, 8]);
    }

    #[test]
    fn respects_max_depth() {
        assert_eq!(poly_terms(&[1, 0], 0).count(), 0);
        assert_eq!(poly_terms(&[1, 0], 3).count(), 3);
    }
}
