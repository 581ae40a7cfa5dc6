use serde::Serialize;
use serde_with::DeserializeFromStr;
use std::rc::Rc;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};
use wheelkit::KeyValueStore;
use wheelkit::storage::{self, KEY_SOUND_ENABLED, KEY_SPIN_DURATION};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SpinSpeed {
    #[strum(to_string = "slow", serialize = "s")]
    Slow,
    #[default]
    #[strum(to_string = "normal", serialize = "n")]
    Normal,
    #[strum(to_string = "fast", serialize = "f")]
    Fast,
}

impl SpinSpeed {
    pub fn seconds(self) -> f64 {
        match self {
            SpinSpeed::Slow => 8.0,
            SpinSpeed::Normal => 6.0,
            SpinSpeed::Fast => 4.0,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs_f64(self.seconds())
    }

    pub fn from_seconds(seconds: f64) -> Option<Self> {
        Self::iter().find(|s| s.seconds() == seconds)
    }
}

/// User preferences, written through the store as soon as they change.
pub struct Settings {
    store: Rc<dyn KeyValueStore>,
    sound_enabled: bool,
    speed: SpinSpeed,
    // false until a speed is persisted; the configured default applies until then
    speed_chosen: bool,
}

impl Settings {
    pub fn load(store: Rc<dyn KeyValueStore>, default_speed: SpinSpeed) -> Self {
        let sound_enabled = match storage::load::<bool>(store.as_ref(), KEY_SOUND_ENABLED) {
            Some(v) => v,
            None => {
                storage::save(store.as_ref(), KEY_SOUND_ENABLED, &true);
                true
            }
        };

        let stored = storage::load::<f64>(store.as_ref(), KEY_SPIN_DURATION).and_then(|secs| {
            let preset = SpinSpeed::from_seconds(secs);
            if preset.is_none() {
                log::warn!(
                    "Stored spin duration {}s is not a preset, using {}",
                    secs,
                    default_speed
                );
            }
            preset
        });

        Self {
            store,
            sound_enabled,
            speed: stored.unwrap_or(default_speed),
            speed_chosen: stored.is_some(),
        }
    }

    /// Adopts a new configured default unless a speed was already chosen.
    pub fn apply_default_speed(&mut self, default_speed: SpinSpeed) {
        if !self.speed_chosen && self.speed != default_speed {
            log::info!("Spin speed follows config: {}", default_speed);
            self.speed = default_speed;
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn speed(&self) -> SpinSpeed {
        self.speed
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        storage::save(self.store.as_ref(), KEY_SOUND_ENABLED, &enabled);
    }

    pub fn set_speed(&mut self, speed: SpinSpeed) {
        self.speed = speed;
        self.speed_chosen = true;
        storage::save(self.store.as_ref(), KEY_SPIN_DURATION, &speed.seconds());
    }
}
