//! Target constants for the relation search
//!
//! Each refined candidate value is tested against a configured set of
//! constants rather than a single hard-coded one; every constant here can be
//! evaluated to arbitrary precision on demand.

use rug::float::Constant;
use rug::Float;

/// A mathematical constant the search can relate candidate values to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetConstant {
    Pi,
    E,
    EulerGamma,
    Catalan,
    Ln2,
    Zeta3,
}

impl TargetConstant {
    /// Evaluate the constant to `precision_bits` bits.
    pub fn value(self, precision_bits: u32) -> Float {
        match self {
            TargetConstant::Pi => Float::with_val(precision_bits, Constant::Pi),
            TargetConstant::E => Float::with_val(precision_bits, 1).exp(),
            TargetConstant::EulerGamma => Float::with_val(precision_bits, Constant::Euler),
            TargetConstant::Catalan => Float::with_val(precision_bits, Constant::Catalan),
            TargetConstant::Ln2 => Float::with_val(precision_bits, Constant::Log2),
            TargetConstant::Zeta3 => Float::with_val(precision_bits, 3).zeta(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetConstant::Pi => "pi",
            TargetConstant::E => "e",
            TargetConstant::EulerGamma => "euler-gamma",
            TargetConstant::Catalan => "catalan",
            TargetConstant::Ln2 => "ln2",
            TargetConstant::Zeta3 => "zeta3",
        }
    }
}

impl std::fmt::Display for TargetConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(constant: TargetConstant, expected: f64) {
        let value = constant.value(128);
        let error = (value - expected).abs();
        assert!(error < 1e-12, "{constant} too far from {expected}");
    }

    #[test]
    fn values_match_known_digits() {
        close_to(TargetConstant::Pi, 3.141_592_653_589_793);
        close_to(TargetConstant::E, 2.718_281_828_459_045);
        close_to(TargetConstant::EulerGamma, 0.577_215_664_901_532_9);
        close_to(TargetConstant::Catalan, 0.915_965_594_177_219);
        close_to(TargetConstant::Ln2, 0.693_147_180_559_945_3);
        close_to(TargetConstant::Zeta3, 1.202_056_903_159_594_2);
    }
}
