use crate::entry::{Entry, Label};
use thiserror::Error;

pub const FULL_TURN: f64 = 360.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("the wheel has no entries")]
    Empty,
    #[error("no entry has a positive weight")]
    NoSelectableEntries,
    #[error("rotation angle is not a finite number: {0}")]
    InvalidAngle(f64),
}

/// Angular span `[start, end)` of one entry, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
    pub index: usize,
    pub label: &'a Label,
    pub start: f64,
    pub end: f64,
}

impl Segment<'_> {
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, angle: f64) -> bool {
        self.start <= angle && angle < self.end
    }
}

/// Reduces an unbounded rotation into `[0, 360)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(FULL_TURN);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if reduced >= FULL_TURN { 0.0 } else { reduced }
}

pub fn ensure_selectable(entries: &[Entry]) -> Result<(), SelectionError> {
    if entries.is_empty() {
        return Err(SelectionError::Empty);
    }
    if entries.iter().any(|e| e.weight.is_selectable()) {
        Ok(())
    } else {
        Err(SelectionError::NoSelectableEntries)
    }
}

/// Returns `(divisor, total)` such that every `weight / divisor` sums to a finite `total`.
fn weight_scale(entries: &[Entry]) -> (f64, f64) {
    let total: f64 = entries.iter().map(|e| e.weight.get()).sum();
    if total.is_finite() {
        return (1.0, total);
    }
    // finite weights whose sum overflows
    let largest = entries.iter().map(|e| e.weight.get()).fold(0.0, f64::max);
    let scaled = entries.iter().map(|e| e.weight.get() / largest).sum();
    (largest, scaled)
}

/// Lays entries out clockwise from 0 in stored order. Ends are derived from the
/// running weight sum so the final segment closes at exactly 360.
pub fn segments(entries: &[Entry]) -> Result<Vec<Segment<'_>>, SelectionError> {
    ensure_selectable(entries)?;
    let (divisor, total) = weight_scale(entries);

    let mut running = 0.0;
    let mut start = 0.0;
    Ok(entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            running += entry.weight.get() / divisor;
            let end = FULL_TURN * (running / total);
            let segment = Segment {
                index,
                label: &entry.label,
                start,
                end,
            };
            start = end;
            segment
        })
        .collect())
}

/// Index of the entry under the fixed pointer after the wheel rotated by `angle`.
/// A boundary angle belongs to the segment that starts there.
pub fn select_index(entries: &[Entry], angle: f64) -> Result<usize, SelectionError> {
    if !angle.is_finite() {
        return Err(SelectionError::InvalidAngle(angle));
    }
    let pointer = normalize_angle(angle);

    segments(entries)?
        .iter()
        .find(|s| s.contains(pointer))
        .map(|s| s.index)
        .ok_or(SelectionError::NoSelectableEntries)
}

pub fn select(entries: &[Entry], angle: f64) -> Result<&Entry, SelectionError> {
    select_index(entries, angle).map(|i| &entries[i])
}
