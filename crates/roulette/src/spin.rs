use derive_more::Display;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;
use wheelkit::selection::{self, SelectionError};
use wheelkit::{Label, WheelConfiguration};

/// Extra rotation added per spin, in degrees (about 16 to 25 turns).
pub const EXTRA_ROTATION: RangeInclusive<f64> = 6000.0..=9000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("spin #{_0}")]
pub struct SpinId(u64);

#[derive(Debug, Error, PartialEq)]
pub enum SpinError {
    #[error("the wheel is already spinning")]
    AlreadySpinning,
    #[error("the wheel is not spinning")]
    NotSpinning,
    #[error("{0} is not the running spin")]
    StaleSpin(SpinId),
    #[error("cannot spin: {0}")]
    NotSelectable(#[from] SelectionError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinPhase {
    Idle,
    Spinning(SpinId),
}

/// Handed out by `start`; the holder must call `finish` once `duration` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTicket {
    pub id: SpinId,
    pub duration: Duration,
    pub extra_rotation: f64,
    pub final_angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub id: SpinId,
    pub index: usize,
    pub label: Label,
    pub final_angle: f64,
}

pub struct SpinController {
    cumulative_angle: f64,
    phase: SpinPhase,
    last_result: Option<Label>,
    has_spun: bool,
    next_id: u64,
}

impl Default for SpinController {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinController {
    pub fn new() -> Self {
        Self {
            cumulative_angle: 0.0,
            phase: SpinPhase::Idle,
            last_result: None,
            has_spun: false,
            next_id: 1,
        }
    }

    pub fn cumulative_angle(&self) -> f64 {
        self.cumulative_angle
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, SpinPhase::Spinning(_))
    }

    pub fn last_result(&self) -> Option<&Label> {
        self.last_result.as_ref()
    }

    pub fn has_spun(&self) -> bool {
        self.has_spun
    }

    pub fn start<R: Rng>(
        &mut self,
        wheel: &WheelConfiguration,
        duration: Duration,
        rng: &mut R,
    ) -> Result<SpinTicket, SpinError> {
        if self.is_spinning() {
            return Err(SpinError::AlreadySpinning);
        }
        selection::ensure_selectable(wheel.entries())?;

        let extra_rotation = rng.random_range(EXTRA_ROTATION);
        self.cumulative_angle += extra_rotation;

        let id = SpinId(self.next_id);
        self.next_id += 1;
        self.phase = SpinPhase::Spinning(id);
        log::debug!("{} started: +{:.1} deg over {:?}", id, extra_rotation, duration);

        Ok(SpinTicket {
            id,
            duration,
            extra_rotation,
            final_angle: self.cumulative_angle,
        })
    }

    /// Settles the running spin against `wheel` and records the result.
    pub fn finish(
        &mut self,
        id: SpinId,
        wheel: &WheelConfiguration,
    ) -> Result<SpinOutcome, SpinError> {
        match self.phase {
            SpinPhase::Idle => return Err(SpinError::NotSpinning),
            SpinPhase::Spinning(current) if current != id => {
                return Err(SpinError::StaleSpin(id));
            }
            SpinPhase::Spinning(_) => {}
        }
        self.phase = SpinPhase::Idle;

        let index = selection::select_index(wheel.entries(), self.cumulative_angle)?;
        let label = wheel.entries()[index].label.clone();
        self.last_result = Some(label.clone());
        self.has_spun = true;

        Ok(SpinOutcome {
            id,
            index,
            label,
            final_angle: self.cumulative_angle,
        })
    }
}
