use crate::entry::{Entry, InvalidWeight, Label, Weight};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WheelError {
    #[error("no entry at index {index} (wheel has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    InvalidWeight(#[from] InvalidWeight),
}

/// Ordered entries of the wheel. Position decides the angular segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WheelConfiguration {
    entries: Vec<Entry>,
}

impl WheelConfiguration {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Pairs labels with weights in order. Extra items on either side are dropped.
    pub fn from_parts(labels: Vec<String>, weights: Vec<f64>) -> Result<Self, WheelError> {
        let entries = labels
            .into_iter()
            .zip(weights)
            .map(|(label, weight)| Ok(Entry::new(label, Weight::new(weight)?)))
            .collect::<Result<Vec<_>, WheelError>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.to_string()).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight.get()).collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight.get()).sum()
    }

    pub fn append(&mut self, label: impl Into<String>, weight: f64) -> Result<&Entry, WheelError> {
        let weight = Weight::new(weight)?;
        self.entries.push(Entry::new(label, weight));
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Entry, WheelError> {
        self.check_index(index)?;
        Ok(self.entries.remove(index))
    }

    pub fn update_label(&mut self, index: usize, label: impl Into<String>) -> Result<(), WheelError> {
        self.check_index(index)?;
        self.entries[index].label = Label::new(label);
        Ok(())
    }

    pub fn update_weight(&mut self, index: usize, weight: f64) -> Result<(), WheelError> {
        self.check_index(index)?;
        self.entries[index].weight = Weight::new(weight)?;
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    fn check_index(&self, index: usize) -> Result<(), WheelError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(WheelError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel(items: &[(&str, f64)]) -> WheelConfiguration {
        let mut wheel = WheelConfiguration::default();
        for (label, weight) in items {
            wheel.append(*label, *weight).unwrap();
        }
        wheel
    }

    #[test]
    fn test_mutations_keep_labels_and_weights_in_step() {
        let mut w = wheel(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        w.remove_at(1).unwrap();
        w.update_label(1, "z").unwrap();
        w.update_weight(0, 0.5).unwrap();

        assert_eq!(w.labels(), vec!["a", "z"]);
        assert_eq!(w.weights(), vec![0.5, 3.0]);
    }

    #[test]
    fn test_out_of_range_leaves_wheel_untouched() {
        let mut w = wheel(&[("a", 1.0), ("b", 2.0)]);
        let before = w.clone();

        assert_eq!(
            w.remove_at(2),
            Err(WheelError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(w.update_label(5, "x").is_err());
        assert!(w.update_weight(9, 1.0).is_err());
        assert_eq!(w, before);
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let mut w = wheel(&[("a", 1.0)]);
        assert!(matches!(
            w.append("b", -1.0),
            Err(WheelError::InvalidWeight(_))
        ));
        assert!(w.update_weight(0, f64::NAN).is_err());
        assert_eq!(w.weights(), vec![1.0]);
    }

    #[test]
    fn test_from_parts_truncates_to_shorter_list() {
        let w = WheelConfiguration::from_parts(
            vec!["a".into(), "b".into(), "c".into()],
            vec![1.0, 2.0],
        )
        .unwrap();
        assert_eq!(w.labels(), vec!["a", "b"]);
        assert_eq!(w.weights(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_clear_all() {
        let mut w = wheel(&[("a", 1.0), ("b", 2.0)]);
        w.clear_all();
        assert!(w.is_empty());
        assert_eq!(w.total_weight(), 0.0);
    }
}
