use crate::command::Action;
use crate::events::AppEvent;
use crate::session::{AppMsg, Effect, Session};
use crate::sys::timer::SpinTimer;
use async_channel::{Receiver, Sender};
use std::io::{BufRead, Write};
use std::thread;

/// Reads stdin on its own thread so shutdown never waits on a blocking read.
pub fn spawn_input_reader(tx: Sender<AppEvent>) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send_blocking(AppEvent::Input(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send_blocking(AppEvent::InputClosed);
    });
}

pub fn start_background_services(tx: Sender<AppEvent>) {
    spawn_input_reader(tx.clone());
    tokio::spawn(async move {
        crate::config::run_async_watcher(tx).await;
    });
}

/// Builds a single-threaded runtime and drives `session` until the user leaves.
pub fn run(session: Session) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let (tx, rx) = async_channel::bounded(32);
        start_background_services(tx.clone());
        EventLoop::new(session, tx, rx, std::io::stdout()).run().await?;
        Ok(())
    })
}

pub struct EventLoop<W> {
    session: Session,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    out: W,
    timer: Option<SpinTimer>,
    closing: bool,
}

impl<W: Write> EventLoop<W> {
    pub fn new(session: Session, tx: Sender<AppEvent>, rx: Receiver<AppEvent>, out: W) -> Self {
        Self {
            session,
            tx,
            rx,
            out,
            timer: None,
            closing: false,
        }
    }

    /// Runs until quit or end of input. A spin in flight is allowed to land first.
    pub async fn run(mut self) -> std::io::Result<(Session, W)> {
        while let Ok(event) = self.rx.recv().await {
            let effects = self.handle_event(event);
            self.apply(effects)?;

            if self.closing && !self.session.is_spinning() {
                break;
            }
        }

        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.out.flush()?;
        Ok((self.session, self.out))
    }

    fn handle_event(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::Input(line) => {
                let line = line.trim();
                if line.is_empty() {
                    return Vec::new();
                }
                match line.parse::<Action>() {
                    Ok(action) => self.session.update(AppMsg::Action(action)),
                    Err(e) => vec![Effect::Say(e.to_string())],
                }
            }
            AppEvent::InputClosed => {
                log::debug!("Input closed");
                self.closing = true;
                Vec::new()
            }
            AppEvent::SpinFinished(id) => {
                if self.timer.as_ref().is_some_and(|t| t.id() == id) {
                    self.timer = None;
                }
                self.session.update(AppMsg::SpinFinished(id))
            }
            AppEvent::ConfigReload => match crate::config::load_config() {
                Ok(config) => self.session.update(AppMsg::ConfigReload(config)),
                Err(e) => {
                    log::error!("Failed to reload config: {}", e);
                    Vec::new()
                }
            },
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) -> std::io::Result<()> {
        for effect in effects {
            match effect {
                Effect::Say(text) => writeln!(self.out, "{}", text)?,
                Effect::Schedule(ticket) => {
                    let timer = SpinTimer::schedule(&ticket, self.tx.clone());
                    if let Some(old) = self.timer.replace(timer) {
                        old.cancel();
                    }
                }
                Effect::Quit => self.closing = true,
            }
        }
        self.out.flush()
    }
}
