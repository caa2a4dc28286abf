use std::sync::mpsc;
use std::time::{Duration, Instant};

use chimptype::accounts::UsernameCheck;
use chimptype::app::{App, AppState, Control};
use chimptype::quotes::{QuoteLoader, QuoteSource};
use chimptype::runtime::{dispatch, AppEvent, FixedTicker, Runner, TestEventSource};
use chimptype::session::{Guidance, InputOutcome, Session, Status};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn app(prompt: &str) -> App {
    let loader = QuoteLoader::new(QuoteSource::new(Some(prompt.to_string()), None));
    App::new(loader, None, None, UsernameCheck::default())
}

// Headless integration using the runtime + App without a TTY
#[test]
fn headless_typing_flow_completes() {
    let mut app = app("hi");
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    // keys are only accepted once the text has arrived
    for _ in 0..2000u32 {
        dispatch(&mut app, runner.step(), Instant::now());
        if app.state == AppState::Typing {
            break;
        }
    }
    assert_eq!(app.state, AppState::Typing);

    tx.send(key(KeyCode::Char('h'))).unwrap();
    tx.send(key(KeyCode::Char('i'))).unwrap();
    for _ in 0..100u32 {
        dispatch(&mut app, runner.step(), Instant::now());
        if app.state == AppState::Results {
            break;
        }
    }

    assert_eq!(app.state, AppState::Results);
    let results = app.results.expect("results after finishing");
    assert_eq!(results.accuracy, 100);
    assert!(results.wpm >= 1);
    assert_eq!(app.guest.races, 1);

    tx.send(key(KeyCode::Esc)).unwrap();
    assert_eq!(
        dispatch(&mut app, runner.step(), Instant::now()),
        Control::Quit
    );
}

#[test]
fn headless_blocked_session_needs_backspace() {
    let mut s = Session::new("ab");
    s.submit_character('a');
    s.submit_character('x');

    assert_eq!(s.status(), Status::FinishedWithErrors);
    assert_eq!(s.guidance(), Guidance::FixErrors);
    assert_eq!(s.submit_character('b'), InputOutcome::Ignored);
    assert_eq!(s.guidance(), Guidance::UseBackspace);

    assert_eq!(s.submit_backspace(), InputOutcome::Accepted);
    assert!(matches!(s.submit_character('b'), InputOutcome::Finished(_)));
    assert_eq!(s.total_error_events(), 1);
    assert!(s.is_complete());
}

#[test]
fn headless_retry_after_results_restarts_same_text() {
    let mut app = app("ok");
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.state == AppState::Loading && Instant::now() < deadline {
        dispatch(&mut app, AppEvent::Tick, Instant::now());
        std::thread::sleep(Duration::from_millis(2));
    }

    for c in "ok".chars() {
        dispatch(&mut app, key(KeyCode::Char(c)), Instant::now());
    }
    assert_eq!(app.state, AppState::Results);

    dispatch(&mut app, key(KeyCode::Char('r')), Instant::now());
    assert_eq!(app.state, AppState::Typing);
    assert_eq!(app.session.prompt(), "ok");
    assert!(!app.session.has_started());

    for c in "ok".chars() {
        dispatch(&mut app, key(KeyCode::Char(c)), Instant::now());
    }
    assert_eq!(app.guest.races, 2);
}
