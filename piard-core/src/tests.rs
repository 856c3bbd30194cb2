//! Integration tests for piard-core

use std::sync::{Arc, Mutex};

use crate::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ═══════════════════════════════════════════════════════════════════════════
// RECORDING DRIVER
// ═══════════════════════════════════════════════════════════════════════════

type History = Arc<Mutex<Vec<Vec<f64>>>>;

#[derive(Debug, Default)]
struct Recorder {
    open: bool,
    fail: bool,
    writes: History,
}

impl Driver for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn connect(&mut self, _servos: &ServoArray) -> DriverResult<()> {
        self.open = true;
        Ok(())
    }

    fn write(&mut self, servos: &mut ServoArray) -> DriverResult<()> {
        if !self.open {
            return Err(DriverError::NotOpen);
        }
        if self.fail {
            return Err(DriverError::WriteFailed("link down".into()));
        }
        self.writes.lock().unwrap().push(servos.angles());
        servos.mark_all_written();
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

fn controller(n: usize, write_on_update: bool, fail: bool) -> (ServoController, History) {
    let servos = ServoArray::new(n, &ServoArrayConfig::default()).unwrap();
    let writes = History::default();
    let driver = Recorder {
        fail,
        writes: Arc::clone(&writes),
        ..Default::default()
    };
    let options = ControllerOptions {
        write_on_update,
        ..Default::default()
    };
    let controller = ServoController::new(servos, Box::new(driver), options).unwrap();
    (controller, writes)
}

// ═══════════════════════════════════════════════════════════════════════════
// SERVO MODEL PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_set_angle_stays_in_bounds() {
    let config = ServoArrayConfig {
        min_angle: vec![-30.0, 0.0, -90.0].into(),
        max_angle: vec![30.0, 45.0, 90.0].into(),
        ..Default::default()
    };
    let mut servos = ServoArray::new(3, &config).unwrap();
    for x in [-1e6, -91.0, -30.0, 0.0, 12.5, 44.9, 200.0, f64::INFINITY] {
        for i in 0..3 {
            let unit = servos.unit_mut(i).unwrap();
            unit.set_angle(x).unwrap();
            assert!(unit.min_angle() <= unit.angle() && unit.angle() <= unit.max_angle());
        }
    }
}

#[test]
fn test_domain_round_trips_keep_angle() {
    let config = ServoArrayConfig {
        flip: ParamSpec::sparse(false, [(1, true)]),
        min_pulse_width: vec![500.0, 1000.0].into(),
        max_pulse_width: vec![2500.0, 2000.0].into(),
        ..Default::default()
    };
    let mut servos = ServoArray::new(2, &config).unwrap();
    for angle in [-90.0, -33.3, 0.0, 17.0, 89.99] {
        for i in 0..2 {
            let unit = servos.unit_mut(i).unwrap();
            unit.set_angle(angle).unwrap();
            let pw = unit.pulse_width();
            unit.set_pulse_width(pw).unwrap();
            assert!(close(unit.angle(), angle), "pulse width round trip at {}", angle);
            let value = unit.value();
            unit.set_value(value).unwrap();
            assert!(close(unit.angle(), angle), "value round trip at {}", angle);
        }
    }
}

#[test]
fn test_recenter_restores_bounds_exactly() {
    let mut servos = ServoArray::new(3, &ServoArrayConfig::default()).unwrap();
    let before: Vec<Vec<f64>> = [ServoField::MinAngle, ServoField::MaxAngle, ServoField::ServoMin]
        .iter()
        .map(|f| servos.show(*f))
        .collect();
    servos.recenter_all(&vec![0.3, -12.7, 45.1].into()).unwrap();
    servos.recenter_all(&ParamSpec::Scalar(0.0)).unwrap();
    let after: Vec<Vec<f64>> = [ServoField::MinAngle, ServoField::MaxAngle, ServoField::ServoMin]
        .iter()
        .map(|f| servos.show(*f))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_broadcast_shapes() {
    assert_eq!(expand(3, &ParamSpec::Scalar(5.0), None), Ok(vec![5.0, 5.0, 5.0]));
    assert_eq!(
        expand(3, &ParamSpec::sparse(5.0, [(1, 9.0)]), None),
        Ok(vec![5.0, 9.0, 5.0])
    );
    assert_eq!(
        expand(3, &ParamSpec::Dense(vec![1.0, 2.0, 4.0]), None),
        Ok(vec![1.0, 2.0, 4.0])
    );
    assert!(matches!(
        expand(3, &ParamSpec::Dense(vec![1.0, 2.0]), None),
        Err(ConfigError::InvalidShape(_))
    ));
}

#[test]
fn test_flip_maps_ends_to_opposite_values() {
    let config = ServoArrayConfig {
        min_angle: 0.0.into(),
        max_angle: 180.0.into(),
        initial_angle: 0.0.into(),
        flip: true.into(),
        angle_format: AngleFormat::ZeroToRange,
        ..Default::default()
    };
    let mut servos = ServoArray::new(1, &config).unwrap();
    assert!(close(servos.values()[0], 1.0));
    servos.set_angles(&ParamSpec::Scalar(180.0)).unwrap();
    assert!(close(servos.values()[0], -1.0));
}

#[test]
fn test_mismatched_move_by_touches_nothing() {
    let mut servos = ServoArray::new(3, &ServoArrayConfig::default()).unwrap();
    servos.move_by(&[10.0, 20.0, 30.0]).unwrap();
    let before = servos.clone();
    assert!(matches!(
        servos.move_by(&[1.0, 1.0]),
        Err(ServoError::LengthMismatch { expected: 3, actual: 2 })
    ));
    assert_eq!(servos, before);
}

#[test]
fn test_end_to_end_move() {
    let config = ServoArrayConfig {
        min_angle: (-90.0).into(),
        max_angle: 90.0.into(),
        servo_range: 180.0.into(),
        angle_format: AngleFormat::MinusToPlus,
        ..Default::default()
    };
    let mut servos = ServoArray::new(2, &config).unwrap();
    servos.move_by(&[200.0, -5.0]).unwrap();
    assert_eq!(servos.angles(), vec![90.0, -5.0]);
    assert_eq!(servos.dirty_indices(), vec![0, 1]);
}

#[test]
fn test_show_by_field_name() {
    let servos = ServoArray::new(2, &ServoArrayConfig::default()).unwrap();
    let field: ServoField = "min_pulse_width".parse().unwrap();
    assert_eq!(servos.show(field), vec![1000.0, 1000.0]);
}

// ═══════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_controller_connects_on_new() {
    let (controller, writes) = controller(2, false, false);
    assert!(controller.is_open());
    assert_eq!(controller.driver_name(), "recorder");
    assert!(writes.lock().unwrap().is_empty());
}

#[test]
fn test_controller_skips_connect() {
    let servos = ServoArray::new(1, &ServoArrayConfig::default()).unwrap();
    let options = ControllerOptions {
        connect: false,
        ..Default::default()
    };
    let mut controller = ServoController::new(servos, Box::new(Recorder::default()), options).unwrap();
    assert!(!controller.is_open());
    assert_eq!(controller.write(), Err(ServoError::Driver(DriverError::NotOpen)));
    controller.connect().unwrap();
    controller.write().unwrap();
}

#[test]
fn test_write_on_update_writes_once_per_setter() {
    let (mut controller, writes) = controller(2, true, false);
    {
        let mut servo = controller.servo(1).unwrap();
        servo.set_angle(45.0).unwrap();
        assert_eq!(servo.angle(), 45.0);
        servo.set_value(1.0).unwrap();
        servo.max().unwrap();
    }
    assert_eq!(
        *writes.lock().unwrap(),
        vec![vec![0.0, 45.0], vec![0.0, 90.0], vec![0.0, 90.0]]
    );
    // the recorder acknowledged every write
    assert!(controller.servos().dirty_indices().is_empty());
}

#[test]
fn test_without_write_on_update_servos_stay_dirty() {
    let (mut controller, writes) = controller(2, false, false);
    controller.servo(0).unwrap().set_angle(10.0).unwrap();
    assert!(writes.lock().unwrap().is_empty());
    assert_eq!(controller.servos().dirty_indices(), vec![0]);
    controller.write().unwrap();
    assert!(controller.servos().dirty_indices().is_empty());
    assert_eq!(writes.lock().unwrap().len(), 1);
}

#[test]
fn test_handle_reset_does_not_write() {
    let (mut controller, writes) = controller(1, true, false);
    controller.servo(0).unwrap().set_angle(20.0).unwrap();
    controller.servo(0).unwrap().reset();
    assert_eq!(controller.servos().angles(), vec![0.0]);
    assert_eq!(controller.servos().dirty_indices(), vec![0]);
    assert_eq!(writes.lock().unwrap().len(), 1);
}

#[test]
fn test_write_failure_propagates_after_clamp() {
    let (mut controller, writes) = controller(1, true, true);
    let result = controller.servo(0).unwrap().set_angle(500.0);
    assert_eq!(
        result,
        Err(ServoError::Driver(DriverError::WriteFailed("link down".into())))
    );
    // the position change itself was applied
    assert_eq!(controller.servos().angles(), vec![90.0]);
    assert!(writes.lock().unwrap().is_empty());
}

#[test]
fn test_servo_handle_out_of_range() {
    let (mut controller, _) = controller(2, false, false);
    assert!(matches!(
        controller.servo(2),
        Err(ServoError::IndexOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn test_controller_bulk_operations() {
    let (mut controller, writes) = controller(2, false, false);
    controller.step_by(&[3.0, -2.0], true).unwrap();
    assert_eq!(controller.servos().angles(), vec![3.0, -2.0]);
    assert!(controller.servos().dirty_indices().is_empty());

    controller.move_by(&[1.0, 1.0], false).unwrap();
    assert_eq!(controller.servos().dirty_indices(), vec![0, 1]);

    controller.reset(true).unwrap();
    assert_eq!(controller.servos().angles(), vec![0.0, 0.0]);
    assert_eq!(writes.lock().unwrap().len(), 2);

    controller.recenter_all(&ParamSpec::Scalar(10.0)).unwrap();
    assert_eq!(controller.servos().show(ServoField::MaxAngle), vec![80.0, 80.0]);

    controller.close().unwrap();
    assert!(!controller.is_open());
}
