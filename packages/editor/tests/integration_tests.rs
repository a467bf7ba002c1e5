//! Integration tests for editor crate

use interspy_editor::{
    AnnotationBatch, Document, EditorError, EvaluatorRegistry, Host, Layout, Pipeline, Relevance,
    Session, SessionConfig,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
struct HostState {
    language: String,
    text: String,
    batches: Vec<AnnotationBatch>,
}

/// In-memory editor buffer that records every batch it is asked to show
#[derive(Clone)]
struct RecordingHost {
    state: Arc<Mutex<HostState>>,
}

impl RecordingHost {
    fn new(language: &str, text: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                language: language.to_string(),
                text: text.to_string(),
                batches: Vec::new(),
            })),
        }
    }

    fn set_text(&self, text: &str) {
        self.state.lock().unwrap().text = text.to_string();
    }

    fn set_language(&self, language: &str) {
        self.state.lock().unwrap().language = language.to_string();
    }

    fn passes(&self) -> usize {
        self.state.lock().unwrap().batches.len()
    }

    fn last_batch(&self) -> AnnotationBatch {
        self.state.lock().unwrap().batches.last().cloned().unwrap_or_default()
    }

    fn last_items(&self) -> Vec<Vec<String>> {
        self.last_batch().items.into_iter().map(|view| view.items).collect()
    }
}

impl Host for RecordingHost {
    fn document_text(&self) -> String {
        self.state.lock().unwrap().text.clone()
    }

    fn language_identifier(&self) -> String {
        self.state.lock().unwrap().language.clone()
    }

    fn render_annotations(&mut self, batch: &AnnotationBatch) {
        self.state.lock().unwrap().batches.push(batch.clone());
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn test_session_renders_on_first_tick() {
    let host = RecordingHost::new("source.python", "a = 1\nb = a + 1\nb");
    let handle = Session::new(host.clone(), SessionConfig::default())
        .unwrap()
        .spawn();

    sleep(ms(10)).await;
    assert_eq!(host.passes(), 1);
    assert_eq!(
        host.last_items(),
        vec![
            vec!["a: 1 :: int".to_string()],
            vec!["a: 1 :: int".to_string(), "b: 2 :: int".to_string()],
            vec!["2 :: int".to_string()],
        ]
    );

    let stats = handle.shutdown().await.unwrap();
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.edits, 0);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_runs_one_pass() {
    let host = RecordingHost::new("source.python", "n = 0");
    let handle = Session::new(host.clone(), SessionConfig::default())
        .unwrap()
        .spawn();
    sleep(ms(10)).await;

    // keep typing faster than the debounce window, across several ticks
    for i in 1..=20 {
        host.set_text(&format!("n = {}", i));
        handle.notify_edit().unwrap();
        sleep(ms(50)).await;
    }
    assert_eq!(host.passes(), 1, "no pass while edits keep arriving");

    sleep(ms(600)).await;
    assert_eq!(host.passes(), 2);
    assert_eq!(host.last_items(), vec![vec!["n: 20 :: int".to_string()]]);

    let stats = handle.shutdown().await.unwrap();
    assert_eq!(stats.edits, 20);
    assert_eq!(stats.passes, 2);
}

#[tokio::test(start_paused = true)]
async fn test_pass_waits_for_tick_after_quiet_period() {
    let config = SessionConfig {
        debounce: ms(80),
        tick_interval: ms(500),
        ..SessionConfig::default()
    };
    let host = RecordingHost::new("python", "x = 1");
    let handle = Session::new(host.clone(), config).unwrap().spawn();
    sleep(ms(10)).await;

    host.set_text("x = 2");
    handle.notify_edit().unwrap();

    // quiet period is over, next tick is at 500ms
    sleep(ms(200)).await;
    assert_eq!(host.passes(), 1);
    sleep(ms(400)).await;
    assert_eq!(host.passes(), 2);
    assert_eq!(host.last_items(), vec![vec!["x: 2 :: int".to_string()]]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_text_keeps_the_same_batch() {
    let host = RecordingHost::new("source.python", "items = [1, 2]\nlen(items)\nz = 1/0");
    let handle = Session::new(host.clone(), SessionConfig::default())
        .unwrap()
        .spawn();
    sleep(ms(10)).await;
    let first = host.last_batch();

    handle.notify_edit().unwrap();
    sleep(ms(1000)).await;

    assert_eq!(host.passes(), 2);
    assert_eq!(host.last_batch(), first);
    assert_eq!(first.len(), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_language_is_checked_on_every_pass() {
    let host = RecordingHost::new("source.python", "a = 1");
    let handle = Session::new(host.clone(), SessionConfig::default())
        .unwrap()
        .spawn();
    sleep(ms(10)).await;
    assert_eq!(host.passes(), 1);

    // buffer switched to a language nothing evaluates
    host.set_language("source.ruby");
    host.set_text("a = 2");
    handle.notify_edit().unwrap();
    sleep(ms(1000)).await;
    assert_eq!(host.passes(), 1);

    host.set_language("Python");
    handle.notify_edit().unwrap();
    sleep(ms(1000)).await;
    assert_eq!(host.passes(), 2);
    assert_eq!(host.last_items(), vec![vec!["a: 2 :: int".to_string()]]);

    let stats = handle.shutdown().await.unwrap();
    assert_eq!(stats.edits, 2);
    assert_eq!(stats.passes, 2);
}

#[tokio::test(start_paused = true)]
async fn test_edit_sender_fails_after_shutdown() {
    let host = RecordingHost::new("source.python", "");
    let handle = Session::new(host, SessionConfig::default()).unwrap().spawn();
    let sender = handle.edit_sender();
    sender.notify().unwrap();

    handle.shutdown().await.unwrap();
    assert!(matches!(sender.notify(), Err(EditorError::SessionClosed)));
}

#[test]
fn test_session_requires_an_evaluator() {
    let host = RecordingHost::new("source.ruby", "a = 1");
    let err = Session::new(host, SessionConfig::default()).err().unwrap();
    assert!(matches!(err, EditorError::NoEvaluator(ref lang) if lang == "source.ruby"));
}

#[test]
fn test_session_rejects_zero_tick() {
    let host = RecordingHost::new("source.python", "a = 1");
    let config = SessionConfig {
        tick_interval: Duration::ZERO,
        ..SessionConfig::default()
    };
    assert!(matches!(
        Session::new(host, config).err().unwrap(),
        EditorError::InvalidConfig(_)
    ));
}

#[test]
fn test_pipeline_with_identifier_relevance_and_layout() {
    let config = SessionConfig {
        relevance: Relevance::Identifier,
        layout: Layout::Inline,
        ..SessionConfig::default()
    };
    let mut pipeline =
        Pipeline::for_language(&EvaluatorRegistry::default(), "Python", &config).unwrap();
    pipeline.run(&Document::new("a = 2\ntotal = a * 10"));

    let batch = pipeline.batch();
    assert_eq!(batch.items[0].items, vec!["a: 2 :: int".to_string()]);
    assert_eq!(
        batch.items[1].items,
        vec!["a: 2 :: int".to_string(), "total: 20 :: int".to_string()]
    );
    assert!(batch.items.iter().all(|view| view.layout == Layout::Inline));
}

#[test]
fn test_markup_reaches_the_host_escaped() {
    let mut pipeline = Pipeline::for_language(
        &EvaluatorRegistry::default(),
        "python",
        &SessionConfig::default(),
    )
    .unwrap();
    pipeline.run(&Document::new("html = '<br>'"));

    let view = &pipeline.batch().items[0];
    assert_eq!(view.items, vec!["html: <br> :: str".to_string()]);
    assert!(view.content.contains("html: &lt;br&gt; :: str"));
    assert!(view.content.starts_with(r#"<ul class="interspy" style="#));
}
