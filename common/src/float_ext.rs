pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;
    fn approximately_eq_eps(self, other: Self, epsilon: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        self.approximately_eq_eps(other, crate::EPSILON as f32)
    }

    fn approximately_eq_eps(self, other: Self, epsilon: Self) -> bool {
        (self - other).abs() < epsilon
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        self.approximately_eq_eps(other, crate::EPSILON)
    }

    fn approximately_eq_eps(self, other: Self, epsilon: Self) -> bool {
        (self - other).abs() < epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_approximately_eq() {
        assert!(1.0_f64.approximately_eq(1.0));
        assert!((0.1_f64 + 0.2_f64).approximately_eq(0.3));
        assert!(!1.0_f64.approximately_eq(1.0001));
    }

    #[test]
    fn custom_epsilon() {
        assert!(std::f64::consts::PI.approximately_eq_eps(3.14, 0.01));
        assert!(!std::f64::consts::PI.approximately_eq_eps(3.14, 0.001));
    }

    #[test]
    fn nan_is_never_equal() {
        assert!(!f64::NAN.approximately_eq(f64::NAN));
        assert!(!f32::NAN.approximately_eq(0.0));
    }
}
