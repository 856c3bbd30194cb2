//! The servo array: N units built from one broadcast configuration.

use std::ops::Index;

use tracing::{debug, info};

use crate::bounded::{Bounds, BoundedSequence};
use crate::config::ServoArrayConfig;
use crate::error::{ConfigError, ServoError, ServoResult};
use crate::param::ParamSpec;
use crate::types::{PositionDomain, ServoField};
use crate::unit::ServoUnit;

/// Fixed-length, exclusively owned sequence of servos.
#[derive(Debug, Clone, PartialEq)]
pub struct ServoArray {
    units: Vec<ServoUnit>,
}

fn check_deltas(deltas: &[f64]) -> ServoResult<()> {
    match deltas.iter().position(|d| d.is_nan()) {
        Some(i) => Err(ConfigError::InvalidValue(format!("delta for servo {} is NaN", i)).into()),
        None => Ok(()),
    }
}

impl ServoArray {
    /// Builds `n` servos. Every field is broadcast and checked for length
    /// before the first unit is constructed.
    pub fn new(n: usize, config: &ServoArrayConfig) -> Result<Self, ConfigError> {
        let units = config
            .resolve(n)?
            .into_iter()
            .enumerate()
            .map(|(i, unit)| ServoUnit::new(i, unit))
            .collect::<Result<Vec<_>, _>>()?;
        info!(servos = n, format = %config.angle_format, "servo array built");
        Ok(Self { units })
    }

    /// Wraps already constructed units; unit `i` must have been built with
    /// index `i`.
    pub fn from_units(units: Vec<ServoUnit>) -> Result<Self, ConfigError> {
        if let Some((position, unit)) = units.iter().enumerate().find(|(i, u)| u.index() != *i) {
            return Err(ConfigError::ConstraintViolation(format!(
                "unit at position {} has index {}",
                position,
                unit.index()
            )));
        }
        Ok(Self { units })
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ServoUnit> {
        self.units.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ServoUnit> {
        self.units.get_mut(index)
    }

    pub fn unit(&self, index: usize) -> ServoResult<&ServoUnit> {
        let len = self.len();
        self.units
            .get(index)
            .ok_or(ServoError::IndexOutOfRange { index, len })
    }

    pub fn unit_mut(&mut self, index: usize) -> ServoResult<&mut ServoUnit> {
        let len = self.len();
        self.units
            .get_mut(index)
            .ok_or(ServoError::IndexOutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServoUnit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ServoUnit> {
        self.units.iter_mut()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Projections
    // ─────────────────────────────────────────────────────────────────────

    /// Applies `f` to every unit in index order.
    pub fn project<T>(&self, f: impl Fn(&ServoUnit) -> T) -> Vec<T> {
        self.units.iter().map(f).collect()
    }

    /// One field of every unit
    pub fn show(&self, field: ServoField) -> Vec<f64> {
        self.project(|unit| unit.field(field))
    }

    pub fn angles(&self) -> Vec<f64> {
        self.project(ServoUnit::angle)
    }

    pub fn values(&self) -> Vec<f64> {
        self.project(ServoUnit::value)
    }

    pub fn pulse_widths(&self) -> Vec<f64> {
        self.project(ServoUnit::pulse_width)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bulk writes
    // ─────────────────────────────────────────────────────────────────────

    /// Current positions in `domain`, each clamped to the unit's angle
    /// bounds expressed in that domain.
    pub fn bounded(&self, domain: PositionDomain) -> BoundedSequence {
        let mut values = Vec::with_capacity(self.len());
        let mut bounds = Vec::with_capacity(self.len());
        for unit in &self.units {
            let lo = unit.convert(unit.min_angle(), PositionDomain::Angle, domain);
            let hi = unit.convert(unit.max_angle(), PositionDomain::Angle, domain);
            values.push(unit.convert(unit.angle(), PositionDomain::Angle, domain));
            bounds.push(Bounds::new(lo.min(hi), lo.max(hi)));
        }
        BoundedSequence::from_parts(values, bounds)
    }

    fn set_domain(&mut self, domain: PositionDomain, spec: &ParamSpec<f64>) -> ServoResult<()> {
        let mut seq = self.bounded(domain);
        seq.apply(spec)?;
        for (unit, value) in self.units.iter_mut().zip(seq.iter()) {
            unit.set_angle(unit.convert(value, domain, PositionDomain::Angle))?;
        }
        Ok(())
    }

    /// Sets every angle from any broadcastable shape; index pairs copy
    /// between the current angles.
    pub fn set_angles(&mut self, spec: &ParamSpec<f64>) -> ServoResult<()> {
        self.set_domain(PositionDomain::Angle, spec)
    }

    pub fn set_values(&mut self, spec: &ParamSpec<f64>) -> ServoResult<()> {
        self.set_domain(PositionDomain::Value, spec)
    }

    pub fn set_pulse_widths(&mut self, spec: &ParamSpec<f64>) -> ServoResult<()> {
        self.set_domain(PositionDomain::PulseWidth, spec)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Movement
    // ─────────────────────────────────────────────────────────────────────

    /// Adds one delta per servo (reversed for flipped servos). The whole
    /// vector is validated first; on error no servo moves.
    pub fn move_by(&mut self, deltas: &[f64]) -> ServoResult<()> {
        ServoError::check_len(self.len(), deltas.len())?;
        check_deltas(deltas)?;
        for (unit, &delta) in self.units.iter_mut().zip(deltas) {
            unit.move_by(delta)?;
        }
        Ok(())
    }

    /// Moves by `steps[i] * step_size[i]` degrees.
    pub fn step_by(&mut self, steps: &[f64]) -> ServoResult<()> {
        ServoError::check_len(self.len(), steps.len())?;
        let deltas: Vec<f64> = self
            .units
            .iter()
            .zip(steps)
            .map(|(unit, step)| step * unit.step_size())
            .collect();
        self.move_by(&deltas)
    }

    pub fn reset_all(&mut self) {
        for unit in &mut self.units {
            unit.reset();
        }
    }

    /// Broadcasts `offsets` (index pairs copy between current offsets) and
    /// recenters every servo. Nothing changes if any offset is invalid.
    pub fn recenter_all(&mut self, offsets: &ParamSpec<f64>) -> ServoResult<()> {
        if let ParamSpec::Dense(values) = offsets {
            ServoError::check_len(self.len(), values.len())?;
        }
        let current = self.project(ServoUnit::center_angle_offset);
        let offsets = offsets.expand(self.len(), Some(&current))?;
        if let Some(i) = offsets.iter().position(|o| !o.is_finite()) {
            return Err(ConfigError::InvalidValue(format!(
                "center offset for servo {} is {}",
                i, offsets[i]
            ))
            .into());
        }
        for (unit, offset) in self.units.iter_mut().zip(offsets) {
            unit.recenter(offset)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Driver support
    // ─────────────────────────────────────────────────────────────────────

    /// Indices of servos whose latest position has not been written
    pub fn dirty_indices(&self) -> Vec<usize> {
        self.units
            .iter()
            .filter(|unit| !unit.is_written())
            .map(ServoUnit::index)
            .collect()
    }

    pub fn mark_all_written(&mut self) {
        for unit in &mut self.units {
            unit.mark_written();
        }
        debug!(servos = self.len(), "all servos marked written");
    }

    /// Pulse widths rounded to whole microseconds
    pub fn pulse_width_payload(&self) -> Vec<i64> {
        self.project(|unit| unit.pulse_width().round() as i64)
    }

    /// `(index, level)` pairs with each value quantized to `0..=levels`.
    pub fn level_payload(&self, levels: u16) -> Vec<(usize, u16)> {
        let scale = f64::from(levels);
        self.project(|unit| {
            let value = unit.value().clamp(-1.0, 1.0);
            let level = ((value + 1.0) / 2.0 * scale).round();
            (unit.index(), level as u16)
        })
    }
}

impl Index<usize> for ServoArray {
    type Output = ServoUnit;

    fn index(&self, index: usize) -> &ServoUnit {
        &self.units[index]
    }
}

impl<'a> IntoIterator for &'a ServoArray {
    type Item = &'a ServoUnit;
    type IntoIter = std::slice::Iter<'a, ServoUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AngleFormat;

    fn pair() -> ServoArray {
        ServoArray::new(2, &ServoArrayConfig::default()).unwrap()
    }

    #[test]
    fn test_new_broadcasts_dense_fields() {
        let config = ServoArrayConfig {
            max_angle: vec![45.0, 90.0, 60.0].into(),
            ..Default::default()
        };
        let array = ServoArray::new(3, &config).unwrap();
        assert_eq!(array.show(ServoField::MaxAngle), vec![45.0, 90.0, 60.0]);
        assert_eq!(array.show(ServoField::Index), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_from_units_keeps_positions_and_indices_aligned() {
        let units = (0..2)
            .map(|i| ServoUnit::new(i, Default::default()).unwrap())
            .collect();
        let mut array = ServoArray::from_units(units).unwrap();
        array.unit_mut(1).unwrap().set_angle(10.0).unwrap();
        assert_eq!(array.dirty_indices(), vec![1]);
        let indices: Vec<usize> = array.level_payload(31).iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1]);

        let misplaced = vec![
            ServoUnit::new(5, Default::default()).unwrap(),
            ServoUnit::new(5, Default::default()).unwrap(),
        ];
        assert!(matches!(
            ServoArray::from_units(misplaced),
            Err(ConfigError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_new_rejects_short_field() {
        let config = ServoArrayConfig {
            max_pulse_width: vec![2000.0].into(),
            ..Default::default()
        };
        assert!(matches!(
            ServoArray::new(2, &config),
            Err(ConfigError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_new_reports_failing_unit() {
        let config = ServoArrayConfig {
            min_angle: ParamSpec::sparse(-90.0, [(1, -120.0)]),
            ..Default::default()
        };
        match ServoArray::new(2, &config) {
            Err(ConfigError::ConstraintViolation(msg)) => assert!(msg.contains("servo 1")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_move_by_clamps() {
        let mut array = pair();
        array.move_by(&[200.0, -5.0]).unwrap();
        assert_eq!(array.angles(), vec![90.0, -5.0]);
    }

    #[test]
    fn test_move_by_length_mismatch_is_atomic() {
        let mut array = pair();
        assert_eq!(
            array.move_by(&[1.0]),
            Err(ServoError::LengthMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(array.angles(), vec![0.0, 0.0]);
        assert!(array.dirty_indices().is_empty());
    }

    #[test]
    fn test_dense_bulk_write_wrong_length() {
        let mut array = pair();
        assert_eq!(
            array.set_angles(&vec![10.0, 20.0, 30.0].into()),
            Err(ServoError::LengthMismatch { expected: 2, actual: 3 })
        );
        assert_eq!(
            array.recenter_all(&vec![5.0].into()),
            Err(ServoError::LengthMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(array.angles(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_move_by_nan_is_atomic() {
        let mut array = pair();
        assert!(array.move_by(&[10.0, f64::NAN]).is_err());
        assert_eq!(array.angles(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_step_by_uses_step_size() {
        let config = ServoArrayConfig {
            step_size: vec![2.0, 5.0].into(),
            ..Default::default()
        };
        let mut array = ServoArray::new(2, &config).unwrap();
        array.step_by(&[1.0, -3.0]).unwrap();
        assert_eq!(array.angles(), vec![2.0, -15.0]);
    }

    #[test]
    fn test_set_angles_sparse_and_remap() {
        let mut array = ServoArray::new(3, &ServoArrayConfig::default()).unwrap();
        array.set_angles(&ParamSpec::sparse(10.0, [(2, 500.0)])).unwrap();
        assert_eq!(array.angles(), vec![10.0, 10.0, 90.0]);
        array.set_angles(&ParamSpec::Remap(vec![(0, 2)])).unwrap();
        assert_eq!(array.angles(), vec![90.0, 10.0, 90.0]);
    }

    #[test]
    fn test_set_values_and_pulse_widths() {
        let mut array = pair();
        array.set_values(&vec![1.0, -0.5].into()).unwrap();
        assert_eq!(array.angles(), vec![90.0, -45.0]);
        array.set_pulse_widths(&ParamSpec::Scalar(9999.0)).unwrap();
        assert_eq!(array.angles(), vec![90.0, 90.0]);
    }

    #[test]
    fn test_set_values_flipped() {
        let config = ServoArrayConfig {
            min_angle: 0.0.into(),
            max_angle: 180.0.into(),
            flip: true.into(),
            angle_format: AngleFormat::ZeroToRange,
            ..Default::default()
        };
        let mut array = ServoArray::new(1, &config).unwrap();
        array.set_values(&ParamSpec::Scalar(-1.0)).unwrap();
        assert_eq!(array.angles(), vec![180.0]);
    }

    #[test]
    fn test_recenter_all_remap() {
        let mut array = pair();
        array.recenter_all(&ParamSpec::sparse(0.0, [(1, 15.0)])).unwrap();
        assert_eq!(array.show(ServoField::CenterAngleOffset), vec![0.0, 15.0]);
        array.recenter_all(&ParamSpec::Remap(vec![(0, 1)])).unwrap();
        assert_eq!(array.show(ServoField::MinAngle), vec![-105.0, -105.0]);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut array = ServoArray::new(3, &ServoArrayConfig::default()).unwrap();
        array.unit_mut(1).unwrap().set_angle(5.0).unwrap();
        assert_eq!(array.dirty_indices(), vec![1]);
        array.mark_all_written();
        assert!(array.dirty_indices().is_empty());
    }

    #[test]
    fn test_unit_out_of_range() {
        let array = pair();
        assert_eq!(
            array.unit(4).err(),
            Some(ServoError::IndexOutOfRange { index: 4, len: 2 })
        );
    }

    #[test]
    fn test_payloads() {
        let mut array = ServoArray::new(3, &ServoArrayConfig::default()).unwrap();
        array.set_angles(&vec![-90.0, 0.0, 90.0].into()).unwrap();
        assert_eq!(array.pulse_width_payload(), vec![1000, 1500, 2000]);
        assert_eq!(array.level_payload(31), vec![(0, 0), (1, 16), (2, 31)]);
    }
}
