use crate::audio::{AudioBackend, Cue, SoundPlayer};
use crate::command::{Action, HELP};
use crate::config::{AudioConfig, Config, StorageConfig};
use crate::settings::Settings;
use crate::spin::{SpinController, SpinError, SpinId, SpinTicket};
use rand::rngs::StdRng;
use std::fmt::Write as _;
use std::rc::Rc;
use wheelkit::selection;
use wheelkit::{EntryStore, KeyValueStore, TemplateStore, WheelError};

#[derive(Debug)]
pub enum AppMsg {
    Action(Action),
    SpinFinished(SpinId),
    ConfigReload(Config),
}

/// What the runtime has to do after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Say(String),
    Schedule(SpinTicket),
    Quit,
}

/// Builds the audio backend for the current `[audio]` section.
pub type BackendFactory = Box<dyn Fn(&AudioConfig) -> Box<dyn AudioBackend>>;

const BUSY: &str = "the wheel is spinning, wait for the result";

pub struct Session {
    entries: EntryStore,
    templates: TemplateStore,
    settings: Settings,
    spin: SpinController,
    sound: SoundPlayer,
    rng: StdRng,
    storage: StorageConfig,
    make_backend: BackendFactory,
}

impl Session {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        config: &Config,
        make_backend: BackendFactory,
        rng: StdRng,
    ) -> Self {
        let settings = Settings::load(store.clone(), config.spin.default_speed);
        let sound = SoundPlayer::new(make_backend(&config.audio), settings.sound_enabled());

        Self {
            entries: EntryStore::load(store.clone()),
            templates: TemplateStore::load(store),
            settings,
            spin: SpinController::new(),
            sound,
            rng,
            storage: config.storage.clone(),
            make_backend,
        }
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn spin(&self) -> &SpinController {
        &self.spin
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_spinning()
    }

    /// Whether a start-spin action should be offered right now.
    pub fn can_spin(&self) -> bool {
        !self.spin.is_spinning()
            && selection::ensure_selectable(self.entries.wheel().entries()).is_ok()
    }

    pub fn update(&mut self, msg: AppMsg) -> Vec<Effect> {
        match msg {
            AppMsg::Action(action) => self.handle_action(action),
            AppMsg::SpinFinished(id) => self.finish_spin(id),
            AppMsg::ConfigReload(config) => {
                self.reload(config);
                Vec::new()
            }
        }
    }

    fn handle_action(&mut self, action: Action) -> Vec<Effect> {
        if self.spin.is_spinning() && Self::edits_wheel(&action) {
            return say(BUSY);
        }

        match action {
            Action::Add { label, weight } => match self.entries.append(label, weight) {
                Ok(entry) => say(format!("added '{}' (weight {})", entry.label, entry.weight)),
                Err(e) => say(e),
            },
            Action::Remove(index) => self.remove(index),
            Action::Keep(index) => match self.entries.cancel_removal(index) {
                Ok(()) => say(format!("kept entry {}", index)),
                Err(e) => say(e),
            },
            Action::Rename { index, label } => {
                let result = self.entries.update_label(index, label);
                self.report(result)
            }
            Action::Reweight { index, weight } => {
                let result = self.entries.update_weight(index, weight);
                self.report(result)
            }
            Action::Clear => {
                self.entries.clear_all();
                say("cleared the wheel")
            }
            Action::List => say(self.render_wheel()),
            Action::Spin => self.start_spin(),
            Action::SaveTemplate(name) => {
                let saved = self.templates.save(&name, self.entries.wheel());
                say(format!(
                    "saved template '{}' ({} entries)",
                    saved.name,
                    saved.entries.len()
                ))
            }
            Action::ListTemplates => say(self.render_templates()),
            Action::LoadTemplate(index) => match self.templates.apply(index) {
                Some(wheel) => {
                    self.entries.replace(wheel);
                    say(self.render_wheel())
                }
                None => say(format!("no template at index {}", index)),
            },
            Action::DeleteTemplate(index) => match self.templates.delete(index) {
                Some(t) => say(format!("deleted template '{}'", t.name)),
                None => say(format!("no template at index {}", index)),
            },
            Action::Speed(speed) => {
                self.settings.set_speed(speed);
                say(format!("spin speed: {} ({}s)", speed, speed.seconds()))
            }
            Action::Sound(enabled) => {
                self.settings.set_sound_enabled(enabled);
                self.sound.set_enabled(enabled);
                say(format!("sound {}", on_off(enabled)))
            }
            Action::Settings => say(format!(
                "spin speed: {} ({}s)\nsound: {}",
                self.settings.speed(),
                self.settings.speed().seconds(),
                on_off(self.settings.sound_enabled())
            )),
            Action::Help => say(HELP),
            Action::Quit => vec![Effect::Quit],
        }
    }

    fn reload(&mut self, config: Config) {
        self.sound.set_backend((self.make_backend)(&config.audio));
        if self.spin.is_spinning() {
            self.sound.play_loop(Cue::SpinLoop);
        }
        self.settings.apply_default_speed(config.spin.default_speed);
        if config.storage != self.storage {
            log::warn!("Storage settings changed; restart to use them");
            self.storage = config.storage;
        }
        log::info!("Configuration reloaded");
    }

    fn edits_wheel(action: &Action) -> bool {
        matches!(
            action,
            Action::Add { .. }
                | Action::Remove(_)
                | Action::Rename { .. }
                | Action::Reweight { .. }
                | Action::Clear
                | Action::LoadTemplate(_)
        )
    }

    fn remove(&mut self, index: usize) -> Vec<Effect> {
        if self.entries.is_marked(index) {
            return match self.entries.remove_at(index) {
                Ok(removed) => say(format!("removed '{}'", removed.label)),
                Err(e) => say(e),
            };
        }

        match self.entries.request_removal(index) {
            Ok(()) => {
                let label = self
                    .entries
                    .wheel()
                    .get(index)
                    .map(|e| e.label.to_string())
                    .unwrap_or_default();
                say(format!(
                    "remove '{}'? repeat `rm {}` to confirm or `keep {}` to cancel",
                    label, index, index
                ))
            }
            Err(e) => say(e),
        }
    }

    fn report(&self, result: Result<(), WheelError>) -> Vec<Effect> {
        match result {
            Ok(()) => say(self.render_wheel()),
            Err(e) => say(e),
        }
    }

    fn start_spin(&mut self) -> Vec<Effect> {
        let duration = self.settings.speed().duration();
        match self.spin.start(self.entries.wheel(), duration, &mut self.rng) {
            Ok(ticket) => {
                self.sound.play_loop(Cue::SpinLoop);
                vec![
                    Effect::Say(format!("spinning... ({}s)", duration.as_secs_f64())),
                    Effect::Schedule(ticket),
                ]
            }
            Err(SpinError::AlreadySpinning) => {
                log::debug!("Ignoring spin request while spinning");
                say(BUSY)
            }
            Err(e) => say(e),
        }
    }

    fn finish_spin(&mut self, id: SpinId) -> Vec<Effect> {
        match self.spin.finish(id, self.entries.wheel()) {
            Ok(outcome) => {
                self.sound.stop();
                self.sound.play_once(Cue::Reveal);
                log::debug!("{} landed at {:.1} deg", outcome.id, outcome.final_angle);
                say(format!("result: {}", outcome.label))
            }
            Err(e @ (SpinError::StaleSpin(_) | SpinError::NotSpinning)) => {
                log::debug!("Dropping completion for {}: {}", id, e);
                Vec::new()
            }
            Err(e) => {
                self.sound.stop();
                log::error!("Spin finished without a result: {}", e);
                say(e)
            }
        }
    }

    fn render_wheel(&self) -> String {
        let wheel = self.entries.wheel();
        if wheel.is_empty() {
            return "(no entries, `add <label>` to start)".to_string();
        }

        let spans = selection::segments(wheel.entries()).ok();
        let mut out = String::new();
        for (i, entry) in wheel.entries().iter().enumerate() {
            let share = spans
                .as_ref()
                .map(|s| format!("{:>5.1}%", s[i].span() / selection::FULL_TURN * 100.0))
                .unwrap_or_else(|| "    -".to_string());
            let mark = if self.entries.is_marked(i) { "  (remove?)" } else { "" };
            let _ = writeln!(
                out,
                "{:>3}  {:<24} {:>6} {}{}",
                i, entry.label, entry.weight, share, mark
            );
        }
        if let Some(last) = self.spin.last_result() {
            let _ = write!(out, "last result: {}", last);
        }
        out.trim_end().to_string()
    }

    fn render_templates(&self) -> String {
        if self.templates.is_empty() {
            return "(no templates, `save <name>` to create one)".to_string();
        }
        self.templates
            .list()
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{:>3}  {} ({} entries)", i, t.name, t.entries.len()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn say(text: impl ToString) -> Vec<Effect> {
    vec![Effect::Say(text.to_string())]
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingBackend};
    use crate::settings::SpinSpeed;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use wheelkit::MemoryStore;
    use wheelkit::storage::{KEY_ENTRIES, KEY_TEMPLATES};

    struct Harness {
        session: Session,
        calls: Rc<RefCell<Vec<Call>>>,
        store: Rc<MemoryStore>,
    }

    fn harness() -> Harness {
        let store = Rc::new(MemoryStore::new());
        let backend = RecordingBackend::default();
        let calls = backend.calls.clone();
        let session = Session::new(
            store.clone(),
            &Config::default(),
            Box::new(move |_: &AudioConfig| Box::new(backend.clone()) as Box<dyn AudioBackend>),
            StdRng::seed_from_u64(42),
        );
        Harness {
            session,
            calls,
            store,
        }
    }

    fn run(session: &mut Session, line: &str) -> Vec<Effect> {
        session.update(AppMsg::Action(line.parse().unwrap()))
    }

    fn ticket(effects: &[Effect]) -> SpinTicket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Schedule(t) => Some(*t),
                _ => None,
            })
            .expect("spin was not scheduled")
    }

    fn said(effects: &[Effect]) -> String {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Say(s) => Some(s.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_full_spin_flow() {
        let mut h = harness();
        run(&mut h.session, "add pizza 2");
        run(&mut h.session, "add sushi");
        assert!(h.session.can_spin());

        let effects = run(&mut h.session, "spin");
        let t = ticket(&effects);
        assert_eq!(t.duration, SpinSpeed::Normal.duration());
        assert!(!h.session.can_spin());

        let done = h.session.update(AppMsg::SpinFinished(t.id));
        let expected = selection::select(h.session.entries().wheel().entries(), t.final_angle)
            .unwrap()
            .label
            .clone();
        assert_eq!(said(&done), format!("result: {}", expected));
        assert_eq!(h.session.spin().last_result(), Some(&expected));
        assert_eq!(
            *h.calls.borrow(),
            vec![Call::Loop(Cue::SpinLoop), Call::Stop, Call::Once(Cue::Reveal)]
        );
    }

    #[test]
    fn test_spin_refused_after_clearing() {
        let mut h = harness();
        run(&mut h.session, "add a");
        run(&mut h.session, "clear");

        assert!(!h.session.can_spin());
        let effects = run(&mut h.session, "spin");
        assert!(!effects.iter().any(|e| matches!(e, Effect::Schedule(_))));
        assert!(h.session.spin().last_result().is_none());
        assert!(h.calls.borrow().is_empty());
    }

    #[test]
    fn test_edits_locked_while_spinning() {
        let mut h = harness();
        run(&mut h.session, "add a");
        let t = ticket(&run(&mut h.session, "spin"));

        assert_eq!(said(&run(&mut h.session, "clear")), BUSY);
        assert_eq!(said(&run(&mut h.session, "add b")), BUSY);
        assert_eq!(said(&run(&mut h.session, "spin")), BUSY);
        assert_eq!(h.session.entries().wheel().len(), 1);

        let done = h.session.update(AppMsg::SpinFinished(t.id));
        assert_eq!(said(&done), "result: a");
        assert!(h.session.update(AppMsg::SpinFinished(t.id)).is_empty());
    }

    #[test]
    fn test_remove_needs_confirmation() {
        let mut h = harness();
        run(&mut h.session, "add a");
        run(&mut h.session, "add b");

        run(&mut h.session, "rm 0");
        assert!(h.session.entries().is_marked(0));
        assert_eq!(h.session.entries().wheel().len(), 2);

        run(&mut h.session, "keep 0");
        run(&mut h.session, "rm 0");
        run(&mut h.session, "rm 0");
        assert_eq!(h.session.entries().wheel().labels(), vec!["b"]);

        let out = said(&run(&mut h.session, "rm 5"));
        assert!(out.contains("no entry at index 5"), "{out}");
    }

    #[test]
    fn test_templates_round_trip_through_session() {
        let mut h = harness();
        run(&mut h.session, "add ramen 3");
        run(&mut h.session, "add 'pad thai' 0.5");
        run(&mut h.session, "save noodles");
        run(&mut h.session, "clear");
        run(&mut h.session, "load 0");

        assert_eq!(h.session.entries().wheel().labels(), vec!["ramen", "pad thai"]);
        assert_eq!(h.session.entries().wheel().weights(), vec![3.0, 0.5]);
        assert!(h.store.get(KEY_TEMPLATES).is_some());
        assert_eq!(
            h.store.get(KEY_ENTRIES),
            Some(serde_json::json!(["ramen", "pad thai"]))
        );

        assert!(said(&run(&mut h.session, "load 4")).contains("no template"));
        run(&mut h.session, "delete 0");
        assert!(h.session.templates().is_empty());
    }

    #[test]
    fn test_zero_weight_entry_never_wins() {
        let mut h = harness();
        run(&mut h.session, "add never 0");
        run(&mut h.session, "add always 1");

        for _ in 0..20 {
            let t = ticket(&run(&mut h.session, "spin"));
            let done = h.session.update(AppMsg::SpinFinished(t.id));
            assert_eq!(said(&done), "result: always");
        }
    }

    #[test]
    fn test_sound_toggle_gates_playback() {
        let mut h = harness();
        run(&mut h.session, "sound off");
        run(&mut h.session, "add a");
        let t = ticket(&run(&mut h.session, "spin"));
        h.session.update(AppMsg::SpinFinished(t.id));

        assert!(
            !h.calls
                .borrow()
                .iter()
                .any(|c| matches!(c, Call::Loop(_) | Call::Once(_)))
        );
    }

    #[test]
    fn test_speed_setting_drives_duration() {
        let mut h = harness();
        run(&mut h.session, "speed fast");
        run(&mut h.session, "add a");
        let t = ticket(&run(&mut h.session, "spin"));
        assert_eq!(t.duration.as_secs(), 4);
    }

    #[test]
    fn test_config_reload_mid_spin() {
        let mut h = harness();
        run(&mut h.session, "add a");
        let t = ticket(&run(&mut h.session, "spin"));
        h.calls.borrow_mut().clear();

        let mut config = Config::default();
        config.spin.default_speed = SpinSpeed::Fast;
        assert!(h.session.update(AppMsg::ConfigReload(config)).is_empty());
        assert_eq!(
            *h.calls.borrow(),
            vec![Call::Stop, Call::Loop(Cue::SpinLoop)]
        );

        h.session.update(AppMsg::SpinFinished(t.id));
        let next = ticket(&run(&mut h.session, "spin"));
        assert_eq!(next.duration, SpinSpeed::Fast.duration());
    }

    #[test]
    fn test_config_reload_keeps_chosen_speed() {
        let mut h = harness();
        run(&mut h.session, "speed slow");
        run(&mut h.session, "add a");

        let mut config = Config::default();
        config.spin.default_speed = SpinSpeed::Fast;
        h.session.update(AppMsg::ConfigReload(config));

        assert_eq!(*h.calls.borrow(), vec![Call::Stop]);
        let t = ticket(&run(&mut h.session, "spin"));
        assert_eq!(t.duration, SpinSpeed::Slow.duration());
    }
}
