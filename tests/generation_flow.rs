
use bookgen::services::session::{CREATE_FAILED_MESSAGE, TIMED_OUT_MESSAGE};
use bookgen::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tempfile::tempdir;
use test_helpers::*;

const TICK: Duration = Duration::from_millis(20);

fn poller() -> StatusPoller {
    StatusPoller::new(TICK)
}

fn session(title: &str) -> GenerationSession {
    GenerationSession::with_config(BookConfig::new(title))
}

// --- Full cycles ---

#[tokio::test]
async fn test_completed_job_is_downloaded_to_disk() {
    let backend = FakeBackend::new().with_job_id("abc").with_script(vec![
        pending(10, "Analyzing book configuration..."),
        pending(60, "Writing introduction and conclusion..."),
        completed(),
    ]);
    let api = BookApiClient::new(backend.spawn().await);
    let dir = tempdir().unwrap();
    let downloader = FileDownloader::new(api.clone(), dir.path().join("books"));

    let mut session = session("My Book!");
    let outcome = session.generate(&api, &poller(), &downloader).await.unwrap();

    let expected = dir.path().join("books").join("my_book_.docx");
    assert_eq!(outcome, SessionOutcome::Downloaded(expected.clone()));
    assert_eq!(std::fs::read(&expected).unwrap(), DOCX_BYTES);

    assert_eq!(backend.status_calls(), vec!["abc", "abc", "abc"]);
    assert_eq!(session.progress(), 100);
    assert_eq!(session.status_message(), "Book generation complete!");
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.error().is_none());
}

#[tokio::test]
async fn test_completion_triggers_exactly_one_download_and_stops_polling() {
    let backend = FakeBackend::new()
        .with_job_id("abc")
        .with_script(vec![pending(50, "Halfway"), completed()]);
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("My Book!");
    session.generate(&api, &poller(), &handler).await.unwrap();

    let requests = handler.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].job_id, "abc");
    assert_eq!(requests[0].filename, "my_book_.docx");
    assert_eq!(requests[0].url, api.download_url("abc"));

    let calls = backend.status_calls().len();
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(backend.status_calls().len(), calls);
}

#[tokio::test]
async fn test_backend_error_is_surfaced_verbatim() {
    let backend = FakeBackend::new()
        .with_job_id("abc")
        .with_script(vec![pending(10, "Starting"), failed("Out of quota")]);
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("Dune");
    let outcome = session.generate(&api, &poller(), &handler).await.unwrap();

    assert_eq!(outcome, SessionOutcome::Failed("Out of quota".into()));
    assert_eq!(session.error(), Some("Out of quota"));
    assert!(!session.is_generating());
    assert!(handler.requests.lock().unwrap().is_empty());

    let calls = backend.status_calls().len();
    assert_eq!(calls, 2);
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(backend.status_calls().len(), calls);
}

// --- Creation failures ---

#[tokio::test]
async fn test_rejected_creation_returns_to_idle() {
    let backend = FakeBackend::new().rejecting_create();
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("Dune");
    let outcome = session.generate(&api, &poller(), &handler).await.unwrap();

    assert_eq!(outcome, SessionOutcome::Failed(CREATE_FAILED_MESSAGE.into()));
    assert_eq!(session.error(), Some(CREATE_FAILED_MESSAGE));
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.job_id().is_none());
    assert!(backend.status_calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_returns_to_idle() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = BookApiClient::new(format!("http://{}", addr));
    let mut session = session("Dune");

    let err = session.submit(&api).await.unwrap_err();
    assert!(matches!(err, BookError::Network { .. }));
    assert_eq!(session.error(), Some(CREATE_FAILED_MESSAGE));
    assert!(!session.is_generating());
    assert!(session.can_submit());
}

#[tokio::test]
async fn test_empty_title_is_never_sent() {
    let backend = FakeBackend::new();
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = GenerationSession::new();
    let result = session.generate(&api, &poller(), &handler).await;

    assert!(matches!(result, Err(BookError::Validation(_))));
    assert!(backend.created().is_empty());
}

// --- Status check failures and limits ---

#[tokio::test]
async fn test_failed_status_check_halts_polling() {
    let backend = FakeBackend::new().with_job_id("abc").rejecting_status();
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("Dune");
    let outcome = session.generate(&api, &poller(), &handler).await.unwrap();

    assert_eq!(outcome, SessionOutcome::Failed("Failed to check status".into()));
    assert_eq!(backend.status_calls().len(), 1);
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(backend.status_calls().len(), 1);
}

#[tokio::test]
async fn test_max_polls_bounds_unfinished_jobs() {
    let backend = FakeBackend::new()
        .with_job_id("abc")
        .with_script(vec![pending(5, "Still working")]);
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("Dune");
    let outcome = session
        .generate(&api, &poller().with_max_polls(3), &handler)
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Failed(TIMED_OUT_MESSAGE.into()));
    assert_eq!(backend.status_calls().len(), 3);
    assert_eq!(session.progress(), 5);
}

#[tokio::test]
async fn test_poll_timeout_bounds_unfinished_jobs() {
    let backend = FakeBackend::new().with_script(vec![pending(5, "Still working")]);
    let api = BookApiClient::new(backend.spawn().await);
    let job_id = api.generate(&BookConfig::new("Dune")).await.unwrap().job_id;

    let outcome = poller()
        .with_timeout(TICK * 3)
        .watch(&api, &job_id, |_| {})
        .await
        .unwrap();

    assert_eq!(outcome, PollOutcome::TimedOut);
    assert!(!backend.status_calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let backend = FakeBackend::new().with_script(vec![pending(5, "Still working")]);
    let api = BookApiClient::new(backend.spawn().await);
    let job_id = api.generate(&BookConfig::new("Dune")).await.unwrap().job_id;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let outcome = poller()
        .with_cancellation(cancel)
        .watch(&api, &job_id, |_| flag.store(true, Ordering::Relaxed))
        .await
        .unwrap();

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(backend.status_calls().len(), 1);
}

#[tokio::test]
async fn test_malformed_status_body_is_a_json_error() {
    let backend = FakeBackend::new().with_job_id("abc").with_malformed_status();
    let api = BookApiClient::new(backend.spawn().await);
    api.generate(&BookConfig::new("Dune")).await.unwrap();

    let err = api.status("abc").await.unwrap_err();
    assert!(matches!(err, BookError::Json(_)));

    let handler = RecordingHandler::default();
    let mut session = session("Dune");
    let outcome = session.generate(&api, &poller(), &handler).await.unwrap();
    match outcome {
        SessionOutcome::Failed(message) => assert!(message.starts_with("JSON error")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!session.is_generating());
    assert!(handler.requests.lock().unwrap().is_empty());
}

// --- Polling cadence ---

#[tokio::test]
async fn test_slow_check_delays_later_ticks_instead_of_bursting() {
    let interval = Duration::from_millis(40);
    let slow = Duration::from_millis(200);
    let backend = FakeBackend::new()
        .with_job_id("abc")
        .with_slow_first_status(slow)
        .with_script(vec![
            pending(10, "One"),
            pending(20, "Two"),
            pending(30, "Three"),
            completed(),
        ]);
    let api = BookApiClient::new(backend.spawn().await);
    let job_id = api.generate(&BookConfig::new("Dune")).await.unwrap().job_id;

    let outcome = StatusPoller::new(interval)
        .watch(&api, &job_id, |_| {})
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::Completed);

    let times = backend.status_times();
    assert_eq!(times.len(), 4);
    // The second check waits for the slow first one to return.
    assert!(times[1] - times[0] >= slow);
    // After that the schedule restarts from the late tick: no catch-up burst.
    let margin = Duration::from_millis(10);
    assert!(times[2] - times[1] >= interval - margin);
    assert!(times[3] - times[2] >= interval - margin);
}

#[tokio::test]
async fn test_first_check_waits_one_interval_and_targets_job() {
    let backend = FakeBackend::new()
        .with_job_id("abc")
        .with_script(vec![completed()]);
    let api = BookApiClient::new(backend.spawn().await);

    let mut session = session("Dune");
    let job_id = session.submit(&api).await.unwrap();
    assert_eq!(job_id, "abc");
    assert_eq!(session.status_message(), "Book generation started");
    assert!(session.is_generating());

    let interval = Duration::from_millis(100);
    let start = Instant::now();
    let outcome = StatusPoller::new(interval)
        .watch(&api, &job_id, |s| session.record_status(s))
        .await
        .unwrap();

    assert!(start.elapsed() >= interval);
    assert_eq!(outcome, PollOutcome::Completed);
    assert_eq!(backend.status_calls(), vec!["abc"]);
}

// --- Resubmission ---

#[tokio::test]
async fn test_resubmit_starts_fresh_cycle() {
    let backend = FakeBackend::new().with_script(vec![pending(40, "Working"), completed()]);
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("First");
    session.generate(&api, &poller(), &handler).await.unwrap();
    let first_job = session.job_id().unwrap().to_string();
    assert_eq!(session.progress(), 100);

    session.set_field("title", "Second").unwrap();
    let second_job = session.submit(&api).await.unwrap();
    assert_ne!(first_job, second_job);
    assert_eq!(session.progress(), 0);
    assert!(session.is_generating());
    assert!(session.error().is_none());

    let outcome = poller()
        .watch(&api, &second_job, |s| session.record_status(s))
        .await;
    let request = session.finish(&api, outcome).unwrap();
    assert_eq!(request.job_id, second_job);
    assert_eq!(request.filename, "second.docx");

    let calls = backend.status_calls();
    assert!(calls.iter().filter(|id| **id == second_job).count() >= 1);
}

#[tokio::test]
async fn test_resubmit_after_error_clears_message() {
    let backend = FakeBackend::new().with_script(vec![failed("Out of quota")]);
    let api = BookApiClient::new(backend.spawn().await);
    let handler = RecordingHandler::default();

    let mut session = session("Dune");
    session.generate(&api, &poller(), &handler).await.unwrap();
    assert_eq!(session.error(), Some("Out of quota"));

    session.submit(&api).await.unwrap();
    assert!(session.error().is_none());
    assert_eq!(session.progress(), 0);
}

// --- Wire format and listing ---

#[tokio::test]
async fn test_generate_request_body() {
    let backend = FakeBackend::new();
    let api = BookApiClient::new(backend.spawn().await);

    let mut session = GenerationSession::new();
    session.set_field("title", "Star Drift").unwrap();
    session.set_field("author", "R. Vale").unwrap();
    session.set_field("genre", "sci-fi").unwrap();
    session.set_field("chapters", "8").unwrap();
    session.set_field("length", "long").unwrap();
    session.submit(&api).await.unwrap();

    let created = backend.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["title"], "Star Drift");
    assert_eq!(created[0]["author"], "R. Vale");
    assert_eq!(created[0]["genre"], "sci-fi");
    assert_eq!(created[0]["chapters"], 8);
    assert_eq!(created[0]["length"], "long");
}

#[tokio::test]
async fn test_list_jobs() {
    let backend = FakeBackend::new().with_job_id("abc");
    let api = BookApiClient::new(backend.spawn().await);
    api.generate(&BookConfig::new("Dune")).await.unwrap();

    let jobs = api.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs["abc"].status, JobStatus::Pending);
    assert_eq!(jobs["abc"].message, "Book generation queued...");
}

#[tokio::test]
async fn test_download_before_completion_fails() {
    let backend = FakeBackend::new().with_job_id("abc");
    let api = BookApiClient::new(backend.spawn().await);
    api.generate(&BookConfig::new("Dune")).await.unwrap();

    let err = api.download("abc").await.unwrap_err();
    assert!(matches!(err, BookError::Download { status: 404 }));
}
