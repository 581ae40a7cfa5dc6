use crate::config::AudioConfig;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use strum::Display as StrumDisplay;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum Cue {
    SpinLoop,
    Reveal,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no sound file configured for {0}")]
    NoSound(Cue),
    #[error("player command '{0}' is empty or badly quoted")]
    BadPlayer(String),
    #[error("sound playback needs a running tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait AudioBackend {
    /// start `cue` and keep repeating it until `stop`
    fn play_loop(&mut self, cue: Cue) -> Result<(), AudioError>;

    /// end a running loop; no-op when nothing plays
    fn stop(&mut self) -> Result<(), AudioError>;

    /// play `cue` once without waiting for it
    fn play_once(&mut self, cue: Cue) -> Result<(), AudioError>;
}

pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn play_loop(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_once(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Plays files through an external player program, run directly as a child
/// process. A loop restarts the player each time it exits cleanly; `stop`
/// drops the loop task, which kills the player it owns.
pub struct CommandBackend {
    player: String,
    spin_sound: Option<PathBuf>,
    result_sound: Option<PathBuf>,
    looping: Option<JoinHandle<()>>,
}

impl CommandBackend {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            player: config.player.clone(),
            spin_sound: config.spin_sound.clone(),
            result_sound: config.result_sound.clone(),
            looping: None,
        }
    }

    fn sound_for(&self, cue: Cue) -> Result<&Path, AudioError> {
        match cue {
            Cue::SpinLoop => self.spin_sound.as_deref(),
            Cue::Reveal => self.result_sound.as_deref(),
        }
        .ok_or(AudioError::NoSound(cue))
    }

    /// Player words followed by the sound file.
    fn argv(&self, cue: Cue) -> Result<Vec<String>, AudioError> {
        let file = self.sound_for(cue)?;
        let mut argv = shell_words::split(&self.player)
            .map_err(|_| AudioError::BadPlayer(self.player.clone()))?;
        if argv.is_empty() {
            return Err(AudioError::BadPlayer(self.player.clone()));
        }
        argv.push(file.to_string_lossy().into_owned());
        Ok(argv)
    }

    fn command(&self, cue: Cue) -> Result<Command, AudioError> {
        let argv = self.argv(cue)?;
        let Some((program, args)) = argv.split_first() else {
            return Err(AudioError::BadPlayer(self.player.clone()));
        };
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(command)
    }
}

async fn repeat(mut command: Command, mut child: Child, cue: Cue) {
    loop {
        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                log::warn!("Player for {} exited with {}, not restarting", cue, status);
                return;
            }
            Err(e) => {
                log::warn!("Lost player for {}: {}", cue, e);
                return;
            }
        }
        child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::warn!("Could not restart player for {}: {}", cue, e);
                return;
            }
        };
    }
}

impl AudioBackend for CommandBackend {
    fn play_loop(&mut self, cue: Cue) -> Result<(), AudioError> {
        self.stop()?;
        let mut command = self.command(cue)?;
        command.kill_on_drop(true);
        let runtime = Handle::try_current().map_err(|_| AudioError::NoRuntime)?;

        let child = command.spawn()?;
        self.looping = Some(runtime.spawn(repeat(command, child, cue)));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(task) = self.looping.take() {
            task.abort();
        }
        Ok(())
    }

    fn play_once(&mut self, cue: Cue) -> Result<(), AudioError> {
        let mut command = self.command(cue)?;
        let runtime = Handle::try_current().map_err(|_| AudioError::NoRuntime)?;

        let mut child = command.spawn()?;
        runtime.spawn(async move {
            if let Err(e) = child.wait().await {
                log::warn!("Lost player for {}: {}", cue, e);
            }
        });
        Ok(())
    }
}

impl Drop for CommandBackend {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop spin sound: {}", e);
        }
    }
}

pub fn backend_from_config(config: &AudioConfig) -> Box<dyn AudioBackend> {
    if config.spin_sound.is_none() && config.result_sound.is_none() {
        log::debug!("No sound files configured, audio is silent");
        Box::new(SilentBackend)
    } else {
        Box::new(CommandBackend::new(config))
    }
}

/// Gates a backend behind the sound preference and swallows its failures.
pub struct SoundPlayer {
    backend: Box<dyn AudioBackend>,
    enabled: bool,
}

impl SoundPlayer {
    pub fn new(backend: Box<dyn AudioBackend>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop();
        }
    }

    pub fn set_backend(&mut self, backend: Box<dyn AudioBackend>) {
        self.stop();
        self.backend = backend;
    }

    pub fn play_loop(&mut self, cue: Cue) {
        if !self.enabled {
            log::debug!("Sound is off, skipping {}", cue);
            return;
        }
        if let Err(e) = self.backend.play_loop(cue) {
            log::warn!("Could not play {}: {}", cue, e);
        }
    }

    pub fn stop(&mut self) {
        if let Err(e) = self.backend.stop() {
            log::warn!("Could not stop sound: {}", e);
        }
    }

    pub fn play_once(&mut self, cue: Cue) {
        if !self.enabled {
            log::debug!("Sound is off, skipping {}", cue);
            return;
        }
        if let Err(e) = self.backend.play_once(cue) {
            log::warn!("Could not play {}: {}", cue, e);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Loop(Cue),
        Stop,
        Once(Cue),
    }

    /// Records calls; optionally fails every play.
    #[derive(Clone, Default)]
    pub struct RecordingBackend {
        pub calls: Rc<RefCell<Vec<Call>>>,
        pub fail: bool,
    }

    impl AudioBackend for RecordingBackend {
        fn play_loop(&mut self, cue: Cue) -> Result<(), AudioError> {
            self.calls.borrow_mut().push(Call::Loop(cue));
            if self.fail {
                return Err(AudioError::NoSound(cue));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), AudioError> {
            self.calls.borrow_mut().push(Call::Stop);
            Ok(())
        }

        fn play_once(&mut self, cue: Cue) -> Result<(), AudioError> {
            self.calls.borrow_mut().push(Call::Once(cue));
            if self.fail {
                return Err(AudioError::NoSound(cue));
            }
            Ok(())
        }
    }
}
