/// Round a coordinate to 3 decimal places (about 100m), the only precision
/// NearNest ever stores. Ties round toward positive infinity, so `-0.0005`
/// lands on the (0, 0) sentinel rather than at `-0.001`.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0 + 0.5).floor() / 1000.0
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn rounded(self) -> Self {
        Self {
            lat: round3(self.lat),
            lon: round3(self.lon),
        }
    }

    /// (0, 0) doubles as "no location yet", so a user standing exactly there
    /// is treated as unset.
    pub fn is_unset(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round3_examples() {
        assert_eq!(round3(37.422_06), 37.422);
        assert_eq!(round3(-122.084_49), -122.084);
        assert_eq!(round3(51.5007), 51.501);
        assert_eq!(round3(0.0), 0.0);
    }

    #[test]
    fn test_round3_ties_round_up() {
        assert_eq!(round3(-122.0845), -122.084);
        assert_eq!(round3(-0.0005), 0.0);
        assert_eq!(round3(-0.0006), -0.001);
        assert!(Coordinates::new(-0.0005, -0.0005).rounded().is_unset());
    }

    #[test]
    fn test_round3_error_bound_and_idempotent() {
        let mut x = -180.0;
        while x <= 180.0 {
            let r = round3(x);
            assert!((r - x).abs() <= 0.0005 + 1e-12, "{} -> {}", x, r);
            assert_eq!(round3(r), r, "not idempotent at {}", x);
            x += 0.012_345_6;
        }
    }

    #[test]
    fn test_unset_sentinel() {
        assert!(Coordinates::new(0.0, 0.0).is_unset());
        assert!(Coordinates::new(0.0004, -0.0004).rounded().is_unset());
        assert!(!Coordinates::new(37.422, -122.084).is_unset());
        assert!(!Coordinates::new(0.0, 12.5).is_unset());
    }
}
