use crate::entry::Entry;
use crate::storage::{self, KEY_TEMPLATES, KeyValueStore};
use crate::wheel::WheelConfiguration;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct TemplateId(u64);

crate::impl_random_id!(TemplateId);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct TemplateName(String);

crate::impl_string_newtype!(TemplateName);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: TemplateName,
    pub entries: Vec<Entry>,
}

impl Template {
    /// Fresh copy of the stored entries, ready to become the live wheel.
    pub fn to_wheel(&self) -> WheelConfiguration {
        WheelConfiguration::new(self.entries.clone())
    }
}

/// Named snapshots, persisted as one list after every change.
pub struct TemplateStore {
    store: Rc<dyn KeyValueStore>,
    templates: Vec<Template>,
}

impl TemplateStore {
    pub fn load(store: Rc<dyn KeyValueStore>) -> Self {
        let templates: Vec<Template> = storage::load_or_default(store.as_ref(), KEY_TEMPLATES);
        log::debug!("Loaded {} templates", templates.len());
        Self { store, templates }
    }

    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, index: usize) -> Option<&Template> {
        self.templates.get(index)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Stores a copy of `wheel` under `name`. A blank name becomes "Template N".
    pub fn save(&mut self, name: &str, wheel: &WheelConfiguration) -> &Template {
        let name = match name.trim() {
            "" => format!("Template {}", self.templates.len() + 1),
            trimmed => trimmed.to_string(),
        };

        self.templates.push(Template {
            id: TemplateId::random(),
            name: TemplateName::new(name),
            entries: wheel.entries().to_vec(),
        });
        self.persist();

        let index = self.templates.len() - 1;
        &self.templates[index]
    }

    pub fn delete(&mut self, index: usize) -> Option<Template> {
        if index >= self.templates.len() {
            log::warn!(
                "Ignoring delete of template {} ({} stored)",
                index,
                self.templates.len()
            );
            return None;
        }
        let removed = self.templates.remove(index);
        self.persist();
        Some(removed)
    }

    pub fn append_entry(&mut self, index: usize, entry: Entry) -> Option<&Template> {
        let template = self.templates.get_mut(index)?;
        template.entries.push(entry);
        self.persist();
        self.templates.get(index)
    }

    pub fn apply(&self, index: usize) -> Option<WheelConfiguration> {
        self.templates.get(index).map(Template::to_wheel)
    }

    fn persist(&self) {
        storage::save(self.store.as_ref(), KEY_TEMPLATES, &self.templates);
    }
}
