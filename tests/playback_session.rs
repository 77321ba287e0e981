use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use screen_text_reader::playback::{

    CancellationToken, EngineState, Interrupt, SpeechBackend, SpeechConfig, SpeechEngine,

    TextDisplay,

};
use screen_text_reader::{PlaybackOutcome, PlaybackSession, PlaybackState, Token, process};

#[derive(Clone, Default)]
struct SpeechLog {
    spoken: Arc<Mutex<Vec<String>>>,
    configured: Arc<Mutex<Vec<SpeechConfig>>>,
    reinits: Arc<AtomicUsize>,
    cancel_after_speak: Arc<Mutex<Option<CancellationToken>>>,
    released: Arc<AtomicBool>,
}

impl SpeechLog {
    fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

struct FakeSpeech {
    log: SpeechLog,
    block_until_stopped: bool,
}

impl SpeechBackend for FakeSpeech {
    fn configure(&mut self, config: &SpeechConfig) -> Result<()> {
        self.log.configured.lock().unwrap().push(config.clone());
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        self.log.spoken.lock().unwrap().push(text.to_string());
        if let Some(token) = self.log.cancel_after_speak.lock().unwrap().as_ref() {
            token.cancel();
        }
        if self.block_until_stopped {
            while !self.log.released.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        Ok(())
    }

    fn interrupter(&self) -> Interrupt {
        let released = self.log.released.clone();
        Arc::new(move || released.store(true, Ordering::SeqCst))
    }

    fn reinit(&mut self) -> Result<()> {
        self.log.reinits.fetch_add(1, Ordering::SeqCst);
        self.log.released.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingDisplay {
    rendered: String,
    highlighted: Option<(usize, usize)>,
    history: Vec<(usize, usize)>,
    scrolled: Vec<usize>,
}

impl TextDisplay for RecordingDisplay {
    fn render(&mut self, text: &str) {
        self.rendered = text.to_string();
    }

    fn highlight(&mut self, start: usize, end: usize) {
        self.highlighted = Some((start, end));
        self.history.push((start, end));
    }

    fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    fn scroll_into_view(&mut self, offset: usize) {
        self.scrolled.push(offset);
    }
}

fn three_sentences() -> screen_text_reader::Reading {
    process(&[
        Token::new("One.", 0, 0, 20, 90.0),
        Token::new("Two!", 50, 0, 20, 90.0),
        Token::new("Three?", 100, 0, 20, 90.0),
    ])
}

fn session(
    log: &SpeechLog,
    block_until_stopped: bool,
) -> PlaybackSession<FakeSpeech, RecordingDisplay> {
    let backend = FakeSpeech {
        log: log.clone(),
        block_until_stopped,
    };
    let engine = SpeechEngine::new(backend, SpeechConfig::new(150, None)).unwrap();
    PlaybackSession::new(engine, RecordingDisplay::default())
}

#[tokio::test]
async fn plays_every_segment_with_highlight() {
    let log = SpeechLog::default();
    let mut session = session(&log, false);
    let reading = three_sentences();
    assert_eq!(reading.segments.len(), 3);

    session.start(&reading).await.unwrap();
    let outcome = session.wait().await.unwrap();

    assert_eq!(outcome, Some(PlaybackOutcome::Completed));
    assert_eq!(log.spoken(), vec!["One.", "Two!", "Three?"]);
    let display = session.display().unwrap();
    assert_eq!(display.rendered, "One. Two! Three? ");
    assert_eq!(display.history, vec![(0, 4), (5, 9), (10, 16)]);
    assert_eq!(display.scrolled, vec![0, 5, 10]);
    assert_eq!(display.highlighted, None);
    assert_eq!(session.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn cancelling_after_first_segment_speaks_once() {
    let log = SpeechLog::default();
    let mut session = session(&log, false);
    *log.cancel_after_speak.lock().unwrap() = Some(session.cancellation());

    session.start(&three_sentences()).await.unwrap();
    let outcome = session.wait().await.unwrap();

    assert_eq!(outcome, Some(PlaybackOutcome::Interrupted));
    assert_eq!(log.spoken(), vec!["One."]);
    assert_eq!(session.display().unwrap().highlighted, None);
    assert!(!session.is_speaking());
}

#[tokio::test]
async fn disabled_highlight_still_speaks_everything() {
    let log = SpeechLog::default();
    let mut session = session(&log, false).with_highlight(false);

    session.start(&three_sentences()).await.unwrap();
    session.wait().await.unwrap();

    assert_eq!(log.spoken().len(), 3);
    let display = session.display().unwrap();
    assert!(display.history.is_empty());
    assert!(display.scrolled.is_empty());
}

#[tokio::test]
async fn highlight_toggle_applies_to_next_playback() {
    let log = SpeechLog::default();
    let mut session = session(&log, false).with_highlight(false);

    session.start(&three_sentences()).await.unwrap();
    session.wait().await.unwrap();
    assert!(session.display().unwrap().history.is_empty());

    session.set_highlight(true);
    session.start(&three_sentences()).await.unwrap();
    session.wait().await.unwrap();
    assert_eq!(
        session.display().unwrap().history,
        vec![(0, 4), (5, 9), (10, 16)]
    );
}

#[tokio::test]
async fn cancel_after_worker_finished_stays_idle() {
    let log = SpeechLog::default();
    let mut session = session(&log, false);

    session.start(&three_sentences()).await.unwrap();
    for _ in 0..200 {
        if session.state() == PlaybackState::Idle {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(session.state(), PlaybackState::Idle);

    session.cancel();
    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(!session.is_speaking());
    assert_eq!(
        session.wait().await.unwrap(),
        Some(PlaybackOutcome::Completed)
    );
}

#[tokio::test]
async fn restart_hard_stops_and_reinitializes_engine() {
    let log = SpeechLog::default();
    let mut session = session(&log, true);

    session.start(&three_sentences()).await.unwrap();
    for _ in 0..200 {
        if !log.spoken().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(session.state(), PlaybackState::Speaking);
    assert!(session.engine().is_none());

    session.restart().await.unwrap();

    assert_eq!(log.spoken(), vec!["One."]);
    assert_eq!(session.last_outcome(), Some(&PlaybackOutcome::Interrupted));
    assert_eq!(log.reinits.load(Ordering::SeqCst), 1);
    assert_eq!(session.engine().map(|e| e.state()), Some(EngineState::Ready));
    assert_eq!(session.state(), PlaybackState::Idle);
    // initial configure plus the one replayed by reinit
    assert_eq!(log.configured.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_reading_finishes_immediately() {
    let log = SpeechLog::default();
    let mut session = session(&log, false);

    session.start(&process(&[])).await.unwrap();
    let outcome = session.wait().await.unwrap();

    assert_eq!(outcome, Some(PlaybackOutcome::Completed));
    assert!(log.spoken().is_empty());
    assert_eq!(session.display().unwrap().rendered, "");
}

#[tokio::test]
async fn speech_config_only_changes_between_playbacks() {
    let log = SpeechLog::default();
    let mut session = session(&log, false);

    session
        .set_speech_config(SpeechConfig::new(220, Some("en-us".to_string())))
        .unwrap();
    assert_eq!(session.engine().unwrap().config().rate, 220);
    assert_eq!(log.configured.lock().unwrap().len(), 2);

    session.start(&three_sentences()).await.unwrap();
    session.wait().await.unwrap();
    assert_eq!(session.wait().await.unwrap(), None);
}
