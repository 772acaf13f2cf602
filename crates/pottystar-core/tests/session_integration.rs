//! End-to-end session flow against a real SQLite file.

use std::time::Duration;

use pottystar_core::storage::{KvStore, STAR_COUNT_KEY};
use pottystar_core::{
    Database, Event, Outcome, RecordingOutput, Session, SessionOptions, TimerState, ToneSequencer,
};

fn open_session(path: &std::path::Path) -> (Session<Database>, RecordingOutput) {
    let recorder = RecordingOutput::new();
    let sequencer = ToneSequencer::with_output(recorder.clone()).with_seed(42);
    let db = Database::open_at(path).expect("open database");
    (
        Session::new(SessionOptions::default(), sequencer, db),
        recorder,
    )
}

#[test]
fn five_minute_countdown_to_star() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pottystar.db");
    {
        let mut db = Database::open_at(&path).unwrap();
        db.set(STAR_COUNT_KEY, "4").unwrap();
    }

    let (mut session, recorder) = open_session(&path);
    assert_eq!(session.stars(), 4);

    session.select_preset(5).unwrap();
    session.toggle();
    assert_eq!(session.engine().state(), TimerState::Running);

    let events = session.advance(Duration::from_secs(299));
    assert!(!events.iter().any(Event::is_expiry));
    assert_eq!(session.engine().remaining_secs(), 1);

    let events = session.advance(Duration::from_secs(1));
    assert!(events.iter().any(Event::is_expiry));
    assert!(session.engine().is_expired());
    assert!(!session.engine().is_running());
    assert_eq!(session.engine().remaining_secs(), 0);
    assert!(session.sequencer().is_alarm_active());

    let events = session.record_success().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::OutcomeRecorded {
            outcome: Outcome::Success,
            stars: 5,
            next_secs: 300,
            ..
        }
    )));
    assert_eq!(session.stars(), 5);
    assert_eq!(session.engine().remaining_secs(), 300);
    assert!(session.engine().is_running());

    session.advance(Duration::from_secs(2));
    assert_eq!(session.engine().remaining_secs(), 298);
    assert!(!recorder.played().is_empty());
    drop(session);

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.get(STAR_COUNT_KEY).unwrap().as_deref(), Some("5"));
}

#[test]
fn forcing_after_natural_expiry_does_not_replay_alarm() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, recorder) = open_session(&dir.path().join("pottystar.db"));

    session.apply_custom("1").unwrap();
    session.toggle();
    session.advance(Duration::from_secs(60));
    session.force_expire();
    session.advance(Duration::from_secs(10));

    let beeps = recorder
        .played()
        .iter()
        .filter(|v| v.waveform == pottystar_core::audio::Waveform::Square)
        .count();
    assert_eq!(beeps, 6);
}

#[test]
fn retry_flow_walks_presets() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _) = open_session(&dir.path().join("pottystar.db"));

    session.toggle();
    session.advance(Duration::from_secs(45 * 60));
    assert!(session.engine().is_expired());

    session.try_again().unwrap();
    assert_eq!(session.selected_minutes(), 30);
    assert_eq!(session.engine().remaining_secs(), 30 * 60);
    assert!(session.engine().is_running());
    assert_eq!(session.stars(), 0);
}
