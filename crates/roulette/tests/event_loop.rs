use rand::SeedableRng;
use rand::rngs::StdRng;
use roulette::audio::{AudioBackend, SilentBackend};
use roulette::config::{AudioConfig, Config};
use roulette::events::AppEvent;
use roulette::session::Session;
use roulette::sys::EventLoop;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;
use wheelkit::MemoryStore;

fn session() -> Session {
    Session::new(
        Rc::new(MemoryStore::new()),
        &Config::default(),
        Box::new(|_: &AudioConfig| Box::new(SilentBackend) as Box<dyn AudioBackend>),
        StdRng::seed_from_u64(9),
    )
}

async fn drive(lines: &[&str], close: bool) -> (Session, String) {
    let (tx, rx) = async_channel::bounded(32);
    for line in lines {
        tx.send(AppEvent::Input(line.to_string())).await.unwrap();
    }
    if close {
        tx.send(AppEvent::InputClosed).await.unwrap();
    }
    let (session, out) = EventLoop::new(session(), tx, rx, Vec::new())
        .run()
        .await
        .unwrap();
    (session, String::from_utf8(out).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_spin_lands_after_its_duration() {
    let start = Instant::now();
    let (session, out) = drive(&["add pizza", "speed fast", "spin"], true).await;

    assert!(start.elapsed() >= Duration::from_secs(4));
    assert!(out.contains("spinning... (4s)"), "{out}");
    assert!(out.trim_end().ends_with("result: pizza"), "{out}");
    assert!(!session.is_spinning());
    assert!(session.spin().has_spun());
}

#[tokio::test(start_paused = true)]
async fn test_quit_waits_for_running_spin() {
    let start = Instant::now();
    let (session, out) = drive(&["add a", "add b", "spin", "clear", "quit"], false).await;

    assert!(start.elapsed() >= Duration::from_secs(6));
    assert!(out.contains("the wheel is spinning"), "{out}");
    assert!(out.contains("result: "), "{out}");
    assert_eq!(session.entries().wheel().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_bad_lines_are_reported_and_skipped() {
    let start = Instant::now();
    let (session, out) = drive(&["", "   ", "dance", "add 'open", "add x"], true).await;

    assert_eq!(start.elapsed(), Duration::ZERO);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "unknown command 'dance' (try `help`)",
            "unbalanced quotes",
            "added 'x' (weight 1)",
        ]
    );
    assert_eq!(session.entries().wheel().len(), 1);
}
