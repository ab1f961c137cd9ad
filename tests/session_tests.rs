//! Integration tests for the experiment session
//!
//! Tests verify that:
//! - Rejected optics leave the ring table and parameters untouched
//! - Microscope readings sync into the left/right edge maps
//! - Best pairs from the analysis feed the curvature fit
//! - The two reset levels clear what they should

use newton_rings_sim::config::Parameters;
use newton_rings_sim::geometry::WavelengthPreset;
use newton_rings_sim::instrument::{
    Direction, ManualClock, MeasurementQuality, Side, TriangularNoise, UniformNoise, ZeroNoise,
};
use newton_rings_sim::state::ExperimentSession;
use newton_rings_sim::SimulationError;

fn quiet_session() -> (ExperimentSession, ManualClock) {
    let clock = ManualClock::new();
    let session = ExperimentSession::with_sources(
        &Parameters::default(),
        Box::new(clock.clone()),
        Box::new(ZeroNoise),
        Box::new(ZeroNoise),
    );
    (session, clock)
}

/// Drive right until the stage is past `position_mm`
fn move_past(session: &mut ExperimentSession, clock: &ManualClock, position_mm: f64) {
    while session.microscope().position_mm() < position_mm {
        clock.advance(0.05);
        session.move_microscope(Direction::Right, 1.0);
    }
}

#[test]
fn test_out_of_range_optics_keep_previous_values() {
    let (mut session, _clock) = quiet_session();
    let table = session.ring_table().clone();

    for (wavelength, radius) in [
        (Some(750.0), None),
        (Some(400.0), None),
        (None, Some(49.9)),
        (None, Some(200.5)),
        (Some(546.1), Some(10.0)),
    ] {
        let result = session.set_physical_parameters(wavelength, radius);
        assert!(
            matches!(result, Err(SimulationError::InputOutOfRange { .. })),
            "{:?}/{:?} should be rejected",
            wavelength,
            radius
        );
        assert_eq!(session.optics().wavelength_nm, 589.3);
        assert_eq!(session.optics().radius_of_curvature_cm, 100.0);
        assert_eq!(session.ring_table(), &table);
    }
}

#[test]
fn test_valid_optics_recompute_rings() {
    let (mut session, _clock) = quiet_session();
    let r1_before = session.ring_table().radius_mm(1).unwrap();

    let r1_after = session
        .set_physical_parameters(Some(700.0), Some(200.0))
        .unwrap()
        .radius_mm(1)
        .unwrap();
    assert!(r1_after > r1_before);
    assert_eq!(session.optics().wavelength_nm, 700.0);

    session.set_wavelength_preset(WavelengthPreset::MercuryGreen);
    assert_eq!(session.optics().wavelength_nm, WavelengthPreset::MercuryGreen.wavelength_nm());
    assert_eq!(session.optics().radius_of_curvature_cm, 200.0);
}

#[test]
fn test_reading_syncs_to_side_map() {
    let (mut session, clock) = quiet_session();
    move_past(&mut session, &clock, 0.75);

    let first = session.take_measurement();
    assert_eq!(first.closest_ring, 1);
    assert_eq!(session.sides().get(Side::Right, 1), Some(first.position_mm));
    assert_eq!(session.sides().get(Side::Left, 1), None);

    // Last write wins
    clock.advance(0.05);
    session.move_microscope(Direction::Right, 0.1);
    let second = session.take_measurement();
    assert_eq!(second.closest_ring, 1);
    assert_ne!(second.position_mm, first.position_mm);
    assert_eq!(session.sides().get(Side::Right, 1), Some(second.position_mm));
}

#[test]
fn test_regression_from_entered_edges() {
    let (mut session, _clock) = quiet_session();
    for ring in [5, 10] {
        let r = session.ring_table().radius_mm(ring).unwrap();
        session.enter_measurement(Side::Left, ring, -r).unwrap();
        session.enter_measurement(Side::Right, ring, r).unwrap();
    }

    let fit = session.regress_radius_of_curvature().unwrap();
    assert_eq!(fit.rings, vec![5, 10]);
    assert!(fit.error_percent < 0.1, "Fitted R = {} cm", fit.radius_cm);
    assert_eq!(fit.actual_radius_cm, 100.0);
    assert!((fit.diameters_squared_mm2[0] - fit.diameters_mm[0].powi(2)).abs() < 1e-12);
}

#[test]
fn test_regression_needs_two_complete_rings() {
    let (mut session, _clock) = quiet_session();
    assert_eq!(
        session.regress_radius_of_curvature(),
        Err(SimulationError::InsufficientData {
            required: 2,
            available: 0
        })
    );

    session.measure_left_side(3).unwrap();
    session.measure_right_side(3).unwrap();
    session.measure_left_side(7).unwrap();
    assert_eq!(
        session.regress_radius_of_curvature(),
        Err(SimulationError::InsufficientData {
            required: 2,
            available: 1
        })
    );
}

#[test]
fn test_noisy_direct_entry_stays_close() {
    let clock = ManualClock::new();
    let mut session = ExperimentSession::with_sources(
        &Parameters::default(),
        Box::new(clock),
        Box::new(TriangularNoise::seeded(5)),
        Box::new(UniformNoise::seeded(6)),
    );
    for ring in 1..=15 {
        let r = session.ring_table().radius_mm(ring).unwrap();
        let left = session.measure_left_side(ring).unwrap();
        let right = session.measure_right_side(ring).unwrap();
        assert!((left + r).abs() <= 0.01);
        assert!((right - r).abs() <= 0.01);
    }
    let fit = session.regress_radius_of_curvature().unwrap();
    assert!(fit.error_percent < 3.0, "Fitted R = {} cm", fit.radius_cm);
}

#[test]
fn test_direct_entry_rejects_ring_zero() {
    let (mut session, _clock) = quiet_session();
    assert!(session.enter_measurement(Side::Left, 0, -0.1).is_err());
    assert!(session.measure_right_side(16).is_err());
    assert!(session.sides().is_empty());
}

#[test]
fn test_analysis_and_best_pairs_drive_fit() {
    let (mut session, clock) = quiet_session();

    // Ring 1 right edge, then back across the center to its left edge
    move_past(&mut session, &clock, 0.75);
    session.take_measurement();
    while session.microscope().position_mm() > -0.75 {
        clock.advance(0.05);
        session.move_microscope(Direction::Left, 1.0);
    }
    session.take_measurement();
    // Ring 2 left edge
    while session.microscope().position_mm() > -1.06 {
        clock.advance(0.05);
        session.move_microscope(Direction::Left, 1.0);
    }
    session.take_measurement();

    let analysis = session.analyze();
    assert_eq!(analysis.rings.len(), 1);
    let ring1 = analysis.ring(1).unwrap();
    assert!(ring1.left_position_mm < 0.0 && ring1.right_position_mm > 0.0);
    assert!((ring1.diameter_mm - (ring1.right_position_mm - ring1.left_position_mm)).abs() < 1e-12);
    assert_eq!(ring1.quality, MeasurementQuality::Standard);
    assert!(analysis.statistics.is_some());

    session.apply_best_pairs(&analysis);
    assert_eq!(session.sides().get(Side::Left, 1), Some(ring1.left_position_mm));
    assert_eq!(session.sides().get(Side::Right, 1), Some(ring1.right_position_mm));
}

#[test]
fn test_reset_levels() {
    let (mut session, clock) = quiet_session();
    move_past(&mut session, &clock, 0.75);
    session.take_measurement();
    session.measure_left_side(4).unwrap();

    session.reset_instrument();
    assert!(session.microscope().measurements().is_empty());
    assert!(!session.sides().is_empty());

    session.take_measurement();
    session.reset_all_measurements();
    assert!(session.microscope().measurements().is_empty());
    assert!(session.sides().is_empty());
}
