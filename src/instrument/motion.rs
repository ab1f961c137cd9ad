//! Stage motion model.
//!
//! Each move request nudges a smoothed velocity toward a target and
//! integrates it over the elapsed clock time:
//!
//! 1. dt = min(t − t_last, dt_max)
//! 2. v_target = ±step·factor·10 (step ÷ 10 again in precision mode)
//! 3. v = v·s + v_target·(1 − s)
//! 4. x = clamp(x + v·dt, −x_max, x_max); v = 0 when clamped
//!
//! The smoothing coefficient s gives the stage its inertia: 0.8 normally,
//! 0.9 in precision mode.

use serde::{Deserialize, Serialize};

use super::microscope::{InstrumentMode, Microscope};

/// Target velocity per millimetre of effective step (1/s)
const VELOCITY_PER_STEP: f64 = 10.0;
/// Step and speed reduction applied in precision mode
const PRECISION_DIVISOR: f64 = 10.0;
/// Step sizes are kept on a 1 μm grid
const STEP_RESOLUTION_MM: f64 = 0.001;
const STEPS_PER_MM: f64 = 1000.0;

/// Movements younger than this drive the motion indicator (s)
const INDICATOR_WINDOW_SEC: f64 = 0.5;

/// Upper limit of the hold-to-move speed multiplier
const MAX_HOLD_ACCELERATION: f64 = 4.0;
/// Multiplier growth per held tick
const HOLD_RAMP_RATE: f64 = 1.05;
/// Multiplier decay per released tick
const RELEASE_DECAY: f64 = 0.95;
/// A hold within this window of the previous one keeps ramping (s)
const HOLD_WINDOW_SEC: f64 = 1.0;

/// Direction of stage travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Toward negative positions
    Left,
    /// Toward positive positions
    Right,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Result of a move request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveOutcome {
    /// False when the stage was already at the travel limit
    pub moved: bool,
    /// Stage position after the request (mm)
    pub position_mm: f64,
}

/// One entry of the movement history
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovementSample {
    pub direction: Direction,
    /// Distance actually travelled (mm)
    pub distance_mm: f64,
    pub time_sec: f64,
}

/// One entry of the position history
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    pub position_mm: f64,
    pub time_sec: f64,
}

/// Coarse speed bucket for the direction indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SpeedClass {
    /// |v| < 0.01 mm/s
    Creeping,
    /// |v| < 0.1 mm/s
    Slow,
    /// |v| < 1 mm/s
    Medium,
    Fast,
}

impl SpeedClass {
    pub fn from_speed(speed_mm_per_sec: f64) -> Self {
        let speed = speed_mm_per_sec.abs();
        if speed < 0.01 {
            SpeedClass::Creeping
        } else if speed < 0.1 {
            SpeedClass::Slow
        } else if speed < 1.0 {
            SpeedClass::Medium
        } else {
            SpeedClass::Fast
        }
    }
}

/// Direction and speed of recent travel, for the position scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionIndicator {
    pub direction: Direction,
    pub speed: SpeedClass,
}

/// Speed multiplier that grows while a direction key is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldRamp {
    acceleration: f64,
    continuous: bool,
    last_hold_sec: f64,
}

impl Default for HoldRamp {
    fn default() -> Self {
        Self {
            acceleration: 1.0,
            continuous: false,
            last_hold_sec: f64::NEG_INFINITY,
        }
    }
}

impl HoldRamp {
    /// Register a held tick at `now_sec` and return the speed factor for it
    pub fn engage(&mut self, now_sec: f64) -> f64 {
        if self.continuous && now_sec - self.last_hold_sec < HOLD_WINDOW_SEC {
            self.acceleration = (self.acceleration * HOLD_RAMP_RATE).min(MAX_HOLD_ACCELERATION);
        } else {
            self.acceleration = 1.0;
            self.continuous = true;
        }
        self.last_hold_sec = now_sec;
        self.acceleration
    }

    /// Register a tick with no direction held
    pub fn release(&mut self) {
        if self.continuous {
            self.acceleration = (self.acceleration * RELEASE_DECAY).max(1.0);
            if self.acceleration < 1.05 {
                self.continuous = false;
                self.acceleration = 1.0;
            }
        }
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }
}

/// Round to the 1 μm step grid
pub(crate) fn round_step_mm(step_mm: f64) -> f64 {
    (step_mm * STEPS_PER_MM).round() / STEPS_PER_MM
}

/// Next larger step; coarser ratios at larger steps
pub fn step_up_mm(step_mm: f64) -> f64 {
    let ratio = if step_mm < 0.1 {
        1.25
    } else if step_mm < 0.5 {
        1.2
    } else {
        1.15
    };
    let mut next = round_step_mm(step_mm * ratio);
    // Below ~4 μm the ratio is lost to rounding
    if next <= step_mm {
        next = round_step_mm(step_mm + STEP_RESOLUTION_MM);
    }
    next
}

/// Next smaller step; finer ratios at smaller steps
pub fn step_down_mm(step_mm: f64) -> f64 {
    let ratio = if step_mm <= 0.1 {
        0.8
    } else if step_mm <= 0.5 {
        0.85
    } else {
        0.9
    };
    let mut next = round_step_mm(step_mm * ratio);
    if next >= step_mm {
        next = round_step_mm(step_mm - STEP_RESOLUTION_MM);
    }
    next
}

impl Microscope {
    /// Move the stage one tick in `direction`
    ///
    /// `factor` scales the step size (negative values count as 0). At the
    /// travel limit the request is refused, velocity is damped, and
    /// `moved` is false.
    pub fn move_toward(&mut self, direction: Direction, factor: f64) -> MoveOutcome {
        let limit = self.params.max_position_mm;
        let at_limit = match direction {
            Direction::Left => self.position_mm <= -limit,
            Direction::Right => self.position_mm >= limit,
        };
        if at_limit {
            self.velocity_mm_per_sec *= self.params.boundary_damping;
            log::debug!("Stage at {:?} travel limit, move refused", direction);
            return MoveOutcome {
                moved: false,
                position_mm: self.position_mm,
            };
        }

        let now = self.clock.now_secs();
        let dt = (now - self.last_update_sec).min(self.params.max_dt_sec).max(0.0);
        self.last_update_sec = now;

        let mut effective_step = self.step_mm * factor.max(0.0);
        if self.mode == InstrumentMode::Precision {
            effective_step /= PRECISION_DIVISOR;
        }

        let target_velocity = direction.sign() * effective_step * VELOCITY_PER_STEP;
        self.velocity_mm_per_sec =
            self.velocity_mm_per_sec * self.smoothing + target_velocity * (1.0 - self.smoothing);

        let mut new_position = self.position_mm + self.velocity_mm_per_sec * dt;
        if new_position.abs() > limit {
            new_position = limit.copysign(new_position);
            self.velocity_mm_per_sec = 0.0;
            log::debug!("Stage stopped at travel limit {:.3} mm", new_position);
        }

        let distance_mm = (new_position - self.position_mm).abs();
        self.position_mm = new_position;

        self.position_history.push(PositionSample {
            position_mm: new_position,
            time_sec: now,
        });
        self.movement_history.push(MovementSample {
            direction,
            distance_mm,
            time_sec: now,
        });

        MoveOutcome {
            moved: true,
            position_mm: new_position,
        }
    }

    pub fn move_left(&mut self, factor: f64) -> MoveOutcome {
        self.move_toward(Direction::Left, factor)
    }

    pub fn move_right(&mut self, factor: f64) -> MoveOutcome {
        self.move_toward(Direction::Right, factor)
    }

    /// Move while a direction is held, ramping up speed on repeated calls
    pub fn hold(&mut self, direction: Direction) -> MoveOutcome {
        let factor = self.hold.engage(self.clock.now_secs());
        self.move_toward(direction, factor)
    }

    /// Let the hold ramp decay; call on ticks where no direction is held
    pub fn release(&mut self) {
        self.hold.release();
    }

    pub fn hold_acceleration(&self) -> f64 {
        self.hold.acceleration()
    }

    /// Increase the step size; returns the new step (mm)
    pub fn increase_step_size(&mut self) -> f64 {
        if self.step_mm < self.params.max_step_mm {
            self.step_mm = step_up_mm(self.step_mm).min(self.params.max_step_mm);
        }
        self.step_mm
    }

    /// Decrease the step size; returns the new step (mm)
    pub fn decrease_step_size(&mut self) -> f64 {
        if self.step_mm > self.params.min_step_mm {
            self.step_mm = step_down_mm(self.step_mm).max(self.params.min_step_mm);
        }
        self.step_mm
    }

    /// Switch between normal and precision mode; returns true in precision mode
    pub fn toggle_precision_mode(&mut self) -> bool {
        match self.mode {
            InstrumentMode::Normal => {
                self.normal_step_mm = Some(self.step_mm);
                self.step_mm = round_step_mm(
                    (self.step_mm / PRECISION_DIVISOR).max(self.params.min_step_mm),
                );
                self.smoothing = self.params.precision_smoothing;
                self.mode = InstrumentMode::Precision;
            }
            InstrumentMode::Precision => {
                if let Some(step) = self.normal_step_mm.take() {
                    self.step_mm = step;
                }
                self.smoothing = self.params.normal_smoothing;
                self.mode = InstrumentMode::Normal;
            }
        }
        self.velocity_mm_per_sec = 0.0;
        log::info!(
            "Precision mode {}, step {:.3} mm",
            if self.is_precision_mode() { "on" } else { "off" },
            self.step_mm
        );
        self.is_precision_mode()
    }

    /// Direction and speed of travel if the stage moved recently
    pub fn motion_indicator(&self) -> Option<MotionIndicator> {
        let last = self.movement_history.back()?;
        if self.clock.now_secs() - last.time_sec >= INDICATOR_WINDOW_SEC {
            return None;
        }
        Some(MotionIndicator {
            direction: last.direction,
            speed: SpeedClass::from_speed(self.velocity_mm_per_sec),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_tiers() {
        assert!((step_up_mm(0.04) - 0.05).abs() < 1e-12);
        assert!((step_up_mm(0.2) - 0.24).abs() < 1e-12);
        assert!((step_up_mm(1.0) - 1.15).abs() < 1e-12);
        assert!((step_down_mm(0.1) - 0.08).abs() < 1e-12);
        assert!((step_down_mm(0.4) - 0.34).abs() < 1e-12);
        assert!((step_down_mm(1.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_steps_still_change() {
        assert!((step_up_mm(0.001) - 0.002).abs() < 1e-12);
        assert!((step_down_mm(0.002) - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_speed_classes() {
        assert_eq!(SpeedClass::from_speed(0.005), SpeedClass::Creeping);
        assert_eq!(SpeedClass::from_speed(-0.05), SpeedClass::Slow);
        assert_eq!(SpeedClass::from_speed(0.5), SpeedClass::Medium);
        assert_eq!(SpeedClass::from_speed(3.0), SpeedClass::Fast);
    }

    #[test]
    fn test_hold_ramp_grows_and_caps() {
        let mut ramp = HoldRamp::default();
        assert!((ramp.engage(0.0) - 1.0).abs() < 1e-12);
        assert!((ramp.engage(0.05) - 1.05).abs() < 1e-12);

        let mut t = 0.05;
        for _ in 0..100 {
            t += 0.05;
            ramp.engage(t);
        }
        assert!((ramp.acceleration() - MAX_HOLD_ACCELERATION).abs() < 1e-12);
        assert!((ramp.engage(t + 0.05) - MAX_HOLD_ACCELERATION).abs() < 1e-12);
    }

    #[test]
    fn test_hold_ramp_restarts_after_pause() {
        let mut ramp = HoldRamp::default();
        ramp.engage(0.0);
        ramp.engage(0.1);
        assert!(ramp.acceleration() > 1.0);
        ramp.engage(5.0);
        assert!((ramp.acceleration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_release_ends_hold() {
        let mut ramp = HoldRamp::default();
        let mut t = 0.0;
        for _ in 0..20 {
            ramp.engage(t);
            t += 0.05;
        }
        assert!(ramp.is_continuous());
        for _ in 0..100 {
            ramp.release();
        }
        assert!(!ramp.is_continuous());
        assert!((ramp.acceleration() - 1.0).abs() < 1e-12);
    }
}
