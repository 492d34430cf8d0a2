//! I-V curves and current interpolation.

use crate::error::{CurveError, CurveResult};
use lib_types::units::{Amps, Volts};
use serde::{Deserialize, Serialize};

/// A single current/voltage sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IVPoint {
    voltage: Volts,
    current: Amps,
}

impl IVPoint {
    pub fn new(voltage: Volts, current: Amps) -> Self {
        Self { voltage, current }
    }

    #[inline]
    pub fn voltage(&self) -> Volts {
        self.voltage
    }

    #[inline]
    pub fn current(&self) -> Amps {
        self.current
    }
}

/// A tabulated I-V characteristic.
///
/// Points are kept sorted by ascending voltage with no two points sharing a
/// voltage. Every way of adding points maintains that ordering, so lookups
/// never see an unsorted table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IVCurve {
    points: Vec<IVPoint>,
}

impl IVCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from points in any order.
    ///
    /// Points are sorted by voltage. When several points share a voltage the
    /// one appearing last in `points` is kept.
    pub fn from_points(points: impl IntoIterator<Item = IVPoint>) -> Self {
        let mut curve = Self::new();
        for point in points {
            curve.insert(point);
        }
        curve
    }

    /// Insert a point at its sorted position.
    ///
    /// Returns the point previously stored at the same voltage, if any.
    pub fn insert(&mut self, mut point: IVPoint) -> Option<IVPoint> {
        point.voltage = positive_zero(point.voltage);
        match self.search(point.voltage) {
            Ok(idx) => Some(std::mem::replace(&mut self.points[idx], point)),
            Err(idx) => {
                self.points.insert(idx, point);
                None
            }
        }
    }

    pub fn points(&self) -> &[IVPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest and highest sampled voltage.
    pub fn voltage_range(&self) -> Option<(Volts, Volts)> {
        match (self.points.first(), self.points.last()) {
            (Some(lo), Some(hi)) => Some((lo.voltage, hi.voltage)),
            _ => None,
        }
    }

    /// Current at an arbitrary voltage.
    ///
    /// An exact sample match returns the stored current untouched. Between
    /// samples the two bracketing points are interpolated linearly; outside
    /// the sampled range the nearest end segment is extended (no clamping).
    /// A single-point curve is treated as constant.
    ///
    /// # Errors
    ///
    /// [`CurveError::InsufficientData`] if the curve has no points.
    pub fn interpolate_current(&self, voltage: Volts) -> CurveResult<Amps> {
        let n = self.points.len();
        match n {
            0 => return Err(CurveError::InsufficientData { needed: 1, got: 0 }),
            1 => return Ok(self.points[0].current),
            _ => {}
        }

        let lower = match self.search(voltage) {
            Ok(idx) => return Ok(self.points[idx].current),
            // Below the first sample or above the last: reuse the end segment
            Err(0) => 0,
            Err(idx) if idx >= n => n - 2,
            Err(idx) => idx - 1,
        };

        let p0 = &self.points[lower];
        let p1 = &self.points[lower + 1];
        let frac = (voltage - p0.voltage) / (p1.voltage - p0.voltage);

        Ok(p0.current + (p1.current - p0.current) * frac)
    }

    fn search(&self, voltage: Volts) -> Result<usize, usize> {
        let target = positive_zero(voltage).0;
        self.points
            .binary_search_by(|p| p.voltage.0.total_cmp(&target))
    }
}

/// `total_cmp` orders -0.0 before 0.0; fold them together.
#[inline]
fn positive_zero(v: Volts) -> Volts {
    Volts(v.0 + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(f64, f64)]) -> IVCurve {
        IVCurve::from_points(
            points
                .iter()
                .map(|&(v, i)| IVPoint::new(Volts(v), Amps(i))),
        )
    }

    #[test]
    fn test_interpolate_between_samples() {
        let c = curve(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]);
        assert_eq!(c.interpolate_current(Volts(0.5)), Ok(Amps(0.5)));
        assert_eq!(c.interpolate_current(Volts(1.5)), Ok(Amps(2.5)));
    }

    #[test]
    fn test_extrapolate_past_both_ends() {
        let c = curve(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]);
        // Last segment has slope 3, first has slope 1
        assert_eq!(c.interpolate_current(Volts(3.0)), Ok(Amps(7.0)));
        assert_eq!(c.interpolate_current(Volts(-1.0)), Ok(Amps(-1.0)));
    }

    #[test]
    fn test_exact_samples_return_stored_current() {
        let c = curve(&[(-1.2, -0.071), (0.0, 0.0), (0.33, 0.0123), (1.7, 0.0581), (3.3, 0.0612)]);
        for p in c.points() {
            assert_eq!(c.interpolate_current(p.voltage()), Ok(p.current()));
        }
    }

    #[test]
    fn test_single_point_is_constant() {
        let c = curve(&[(1.0, 0.25)]);
        for v in [-10.0, 0.0, 1.0, 42.0] {
            assert_eq!(c.interpolate_current(Volts(v)), Ok(Amps(0.25)));
        }
    }

    #[test]
    fn test_empty_curve_errors() {
        let c = IVCurve::new();
        assert_eq!(
            c.interpolate_current(Volts(0.0)),
            Err(CurveError::InsufficientData { needed: 1, got: 0 })
        );
    }

    #[test]
    fn test_from_points_sorts_and_keeps_last_duplicate() {
        let c = curve(&[(2.0, 4.0), (0.0, 0.0), (1.0, 9.0), (1.0, 1.0)]);
        let voltages: Vec<f64> = c.points().iter().map(|p| p.voltage().0).collect();
        assert_eq!(voltages, vec![0.0, 1.0, 2.0]);
        assert_eq!(c.interpolate_current(Volts(1.0)), Ok(Amps(1.0)));
    }

    #[test]
    fn test_insert_reports_replaced_point() {
        let mut c = IVCurve::new();
        assert_eq!(c.insert(IVPoint::new(Volts(0.5), Amps(1.0))), None);
        let old = c.insert(IVPoint::new(Volts(0.5), Amps(2.0)));
        assert_eq!(old.map(|p| p.current()), Some(Amps(1.0)));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_negative_zero_matches_zero_sample() {
        let c = curve(&[(-0.0, 0.5), (1.0, 1.0)]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.interpolate_current(Volts(0.0)), Ok(Amps(0.5)));
        assert_eq!(c.interpolate_current(Volts(-0.0)), Ok(Amps(0.5)));
    }

    #[test]
    fn test_voltage_range() {
        assert_eq!(IVCurve::new().voltage_range(), None);
        let c = curve(&[(3.3, 0.0), (-3.3, 0.0), (0.0, 0.0)]);
        assert_eq!(c.voltage_range(), Some((Volts(-3.3), Volts(3.3))));
    }
}
