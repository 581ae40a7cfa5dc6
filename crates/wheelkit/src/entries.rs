use crate::entry::Entry;
use crate::storage::{self, KEY_ENTRIES, KEY_WEIGHTS, KeyValueStore};
use crate::wheel::{WheelConfiguration, WheelError};
use std::rc::Rc;

/// The live wheel, its per-row removal flags and the persisted copy of both lists.
pub struct EntryStore {
    store: Rc<dyn KeyValueStore>,
    wheel: WheelConfiguration,
    marked: Vec<bool>,
}

impl EntryStore {
    pub fn load(store: Rc<dyn KeyValueStore>) -> Self {
        let labels: Vec<String> = storage::load_or_default(store.as_ref(), KEY_ENTRIES);
        let weights: Vec<f64> = storage::load_or_default(store.as_ref(), KEY_WEIGHTS);

        if labels.len() != weights.len() {
            log::warn!(
                "Persisted entries ({}) and weights ({}) differ in length, truncating",
                labels.len(),
                weights.len()
            );
        }

        let wheel = WheelConfiguration::from_parts(labels, weights).unwrap_or_else(|e| {
            log::warn!("Discarding persisted entries: {}", e);
            WheelConfiguration::default()
        });
        let marked = vec![false; wheel.len()];

        Self {
            store,
            wheel,
            marked,
        }
    }

    pub fn wheel(&self) -> &WheelConfiguration {
        &self.wheel
    }

    pub fn append(&mut self, label: impl Into<String>, weight: f64) -> Result<&Entry, WheelError> {
        self.wheel.append(label, weight)?;
        self.marked.push(false);
        self.persist();
        Ok(&self.wheel.entries()[self.wheel.len() - 1])
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Entry, WheelError> {
        let removed = self.wheel.remove_at(index)?;
        self.marked.remove(index);
        self.persist();
        Ok(removed)
    }

    pub fn update_label(&mut self, index: usize, label: impl Into<String>) -> Result<(), WheelError> {
        self.wheel.update_label(index, label)?;
        self.persist();
        Ok(())
    }

    pub fn update_weight(&mut self, index: usize, weight: f64) -> Result<(), WheelError> {
        self.wheel.update_weight(index, weight)?;
        self.persist();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.wheel.clear_all();
        self.marked.clear();
        self.persist();
    }

    pub fn replace(&mut self, wheel: WheelConfiguration) {
        self.marked = vec![false; wheel.len()];
        self.wheel = wheel;
        self.persist();
    }

    pub fn request_removal(&mut self, index: usize) -> Result<(), WheelError> {
        self.flag_mut(index).map(|flag| *flag = true)
    }

    pub fn cancel_removal(&mut self, index: usize) -> Result<(), WheelError> {
        self.flag_mut(index).map(|flag| *flag = false)
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.get(index).copied().unwrap_or(false)
    }

    fn flag_mut(&mut self, index: usize) -> Result<&mut bool, WheelError> {
        let len = self.marked.len();
        self.marked
            .get_mut(index)
            .ok_or(WheelError::IndexOutOfRange { index, len })
    }

    fn persist(&self) {
        storage::save(self.store.as_ref(), KEY_ENTRIES, &self.wheel.labels());
        storage::save(self.store.as_ref(), KEY_WEIGHTS, &self.wheel.weights());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn store() -> Rc<MemoryStore> {
        Rc::new(MemoryStore::new())
    }

    #[test]
    fn test_mutations_are_persisted() {
        let backing = store();
        let mut entries = EntryStore::load(backing.clone());
        entries.append("pizza", 2.0).unwrap();
        entries.append("sushi", 1.0).unwrap();
        entries.update_label(1, "ramen").unwrap();

        assert_eq!(backing.get(KEY_ENTRIES), Some(json!(["pizza", "ramen"])));
        assert_eq!(backing.get(KEY_WEIGHTS), Some(json!([2.0, 1.0])));

        let reloaded = EntryStore::load(backing);
        assert_eq!(reloaded.wheel().labels(), vec!["pizza", "ramen"]);
    }

    #[test]
    fn test_removal_flags_follow_rows() {
        let mut entries = EntryStore::load(store());
        for label in ["a", "b", "c"] {
            entries.append(label, 1.0).unwrap();
        }
        entries.request_removal(2).unwrap();
        entries.remove_at(0).unwrap();

        assert!(!entries.is_marked(0));
        assert!(entries.is_marked(1));

        entries.clear_all();
        assert!(!entries.is_marked(0));
        assert!(entries.request_removal(0).is_err());
    }

    #[test]
    fn test_remove_out_of_range_is_harmless() {
        let backing = store();
        let mut entries = EntryStore::load(backing.clone());
        entries.append("only", 1.0).unwrap();

        assert!(entries.remove_at(3).is_err());
        assert_eq!(entries.wheel().len(), 1);
        assert_eq!(backing.get(KEY_WEIGHTS), Some(json!([1.0])));
    }

    #[test]
    fn test_load_repairs_mismatched_lists() {
        let backing = Rc::new(MemoryStore::with_values([
            (KEY_ENTRIES, json!(["a", "b", "c"])),
            (KEY_WEIGHTS, json!([1.0, 4.0])),
        ]));
        let entries = EntryStore::load(backing);
        assert_eq!(entries.wheel().labels(), vec!["a", "b"]);
        assert_eq!(entries.wheel().weights(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_load_negative_weight_discards_entries() {
        let backing = Rc::new(MemoryStore::with_values([
            (KEY_ENTRIES, json!(["a"])),
            (KEY_WEIGHTS, json!([-3.0])),
        ]));
        assert!(EntryStore::load(backing).wheel().is_empty());
    }
}
