//! End-to-end capture sequence against the in-memory window and display.
//!
//! Covers the hide → grab → write → restore ordering, every failure exit,
//! re-entrancy, and what ends up on disk.

use regex::Regex;
use screen_capture_lib::capture::mock::{EventLog, MockDisplay, MockEvent, MockWindow};
use screen_capture_lib::capture::{
    CaptureArtifact, CaptureError, CaptureOrchestrator, CaptureRegion, CaptureSettings,
    DisplayCapture, DisplayError, Feedback, RawFrame, VisibilityState, WindowGeometry,
};
use std::cell::{OnceCell, RefCell};
use std::path::Path;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};
use std::thread;

fn settings(dir: &Path) -> CaptureSettings {
    CaptureSettings {
        output_dir: dir.to_path_buf(),
        ..CaptureSettings::default()
    }
}

fn geometry(x: i32, y: i32, width: u32, height: u32) -> WindowGeometry {
    WindowGeometry { x, y, width, height }
}

fn shows(log: &EventLog) -> usize {
    log.count(|e| matches!(e, MockEvent::Show))
}

fn hides(log: &EventLog) -> usize {
    log.count(|e| matches!(e, MockEvent::Hide))
}

fn grabs(log: &EventLog) -> usize {
    log.count(|e| matches!(e, MockEvent::Grab(_)))
}

fn files_in(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

// ── Happy path ──────────────────────────────────────────────────────

#[test]
fn ten_by_ten_capture_writes_one_matching_png() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::with_geometry(log.clone(), geometry(40, 60, 10, 35)),
        MockDisplay::solid(log.clone(), [12, 34, 56]),
        settings(tmp.path()),
    );

    let artifact = orch.capture_once().unwrap();

    let files = files_in(tmp.path());
    assert_eq!(files.len(), 1);
    let pattern = Regex::new(r"^screen_\d{8}_\d{6}\.png$").unwrap();
    assert!(pattern.is_match(&files[0]), "unexpected name {}", files[0]);
    assert_eq!(artifact.filepath, tmp.path().join(&files[0]));

    let saved = image::open(&artifact.filepath).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (10, 10));
    assert_eq!(saved.get_pixel(9, 9).0, [12, 34, 56]);
}

#[test]
fn grab_uses_menu_bar_corrected_region() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::with_geometry(log.clone(), geometry(100, 200, 400, 300)),
        MockDisplay::solid(log.clone(), [0, 0, 0]),
        settings(tmp.path()),
    );

    orch.capture_once().unwrap();

    let expected = CaptureRegion {
        top: 225,
        left: 100,
        width: 400,
        height: 275,
    };
    assert!(log.events().contains(&MockEvent::Grab(expected)));
}

#[test]
fn grab_happens_only_while_hidden() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::new(log.clone()),
        MockDisplay::solid(log.clone(), [0, 0, 0]),
        settings(tmp.path()),
    );

    orch.capture_once().unwrap();

    let events = log.events();
    let hide = events.iter().position(|e| *e == MockEvent::Hide).unwrap();
    let grab = events
        .iter()
        .position(|e| matches!(e, MockEvent::Grab(_)))
        .unwrap();
    let show = events.iter().position(|e| *e == MockEvent::Show).unwrap();
    let flash = events
        .iter()
        .position(|e| *e == MockEvent::Flash(Feedback::Success))
        .unwrap();
    assert!(hide < grab && grab < show && show < flash);
    assert_eq!(events[hide + 1], MockEvent::Flush);
}

#[test]
fn scaled_backend_frame_is_saved_at_region_size() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    // 2x display: backend returns 40x30 physical pixels for a 20x15 region
    let frame = RawFrame {
        width: 40,
        height: 30,
        rgba: [90, 90, 90, 255].repeat(40 * 30),
    };
    let orch = CaptureOrchestrator::new(
        MockWindow::with_geometry(log.clone(), geometry(0, 0, 20, 40)),
        MockDisplay::fixed(log.clone(), frame),
        settings(tmp.path()),
    );

    let artifact = orch.capture_once().unwrap();
    let saved = image::open(&artifact.filepath).unwrap();
    assert_eq!((saved.width(), saved.height()), (20, 15));
}

// ── Failure exits ───────────────────────────────────────────────────

#[test]
fn short_window_is_rejected_without_hiding() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::with_geometry(log.clone(), geometry(0, 0, 300, 20)),
        MockDisplay::solid(log.clone(), [0, 0, 0]),
        settings(tmp.path()),
    );

    let result = orch.capture_once();

    assert!(matches!(result, Err(CaptureError::InvalidRegion { .. })));
    assert_eq!(hides(&log), 0);
    assert_eq!(grabs(&log), 0);
    assert_eq!(shows(&log), 0);
    assert!(orch.window().is_visible());
    assert!(files_in(tmp.path()).is_empty());
    assert_eq!(
        log.events().last(),
        Some(&MockEvent::Flash(Feedback::Failure))
    );
}

#[test]
fn failed_grab_restores_once_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::new(log.clone()),
        MockDisplay::failing(log.clone(), "screen recording not permitted"),
        settings(tmp.path()),
    );

    let result = orch.capture_once();

    assert!(matches!(result, Err(CaptureError::GrabFailed(_))));
    assert_eq!(hides(&log), 1);
    assert_eq!(shows(&log), 1);
    assert!(orch.window().is_visible());
    assert_eq!(orch.visibility().state(), VisibilityState::Visible);
    assert!(files_in(tmp.path()).is_empty());
}

#[test]
fn failed_write_restores_once() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("screenshots");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::new(log.clone()),
        MockDisplay::solid(log.clone(), [0, 0, 0]),
        settings(&blocker),
    );

    let result = orch.capture_once();

    assert!(matches!(result, Err(CaptureError::PersistenceFailed(_))));
    assert_eq!(grabs(&log), 1);
    assert_eq!(shows(&log), 1);
    assert!(orch.window().is_visible());
}

#[test]
fn refused_hide_never_grabs_but_restores() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::new(log.clone()).failing_hide(),
        MockDisplay::solid(log.clone(), [0, 0, 0]),
        settings(tmp.path()),
    );

    assert!(matches!(orch.capture_once(), Err(CaptureError::Window(_))));
    assert_eq!(grabs(&log), 0);
    assert_eq!(shows(&log), 1);
}

#[test]
fn window_recovers_for_next_capture_after_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = CaptureOrchestrator::new(
        MockWindow::with_geometry(log.clone(), geometry(0, 0, 300, 10)),
        MockDisplay::solid(log.clone(), [0, 0, 0]),
        settings(tmp.path()),
    );

    assert!(orch.capture_once().is_err());
    orch.window().set_geometry(geometry(0, 0, 300, 200));
    assert!(orch.capture_once().is_ok());
    assert!(!orch.is_in_flight());
    assert_eq!(hides(&log), shows(&log));
}

// ── Re-entrancy ─────────────────────────────────────────────────────

type ReentrantOrchestrator = CaptureOrchestrator<MockWindow, ReentrantDisplay>;

/// Fires a second capture from inside the first grab, the way a
/// double-click could if the trigger were not disabled.
struct ReentrantDisplay {
    inner: MockDisplay,
    target: OnceCell<Weak<ReentrantOrchestrator>>,
    nested: RefCell<Option<Result<CaptureArtifact, CaptureError>>>,
}

impl DisplayCapture for ReentrantDisplay {
    fn grab(&self, region: &CaptureRegion) -> Result<RawFrame, DisplayError> {
        if let Some(orch) = self.target.get().and_then(Weak::upgrade) {
            *self.nested.borrow_mut() = Some(orch.capture_once());
        }
        self.inner.grab(region)
    }

    fn probe(&self) -> Result<(), DisplayError> {
        self.inner.probe()
    }
}

#[test]
fn capture_during_capture_is_rejected_not_queued() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let display = ReentrantDisplay {
        inner: MockDisplay::solid(log.clone(), [5, 5, 5]),
        target: OnceCell::new(),
        nested: RefCell::new(None),
    };
    let orch = Rc::new(CaptureOrchestrator::new(
        MockWindow::new(log.clone()),
        display,
        settings(tmp.path()),
    ));
    orch.display().target.set(Rc::downgrade(&orch)).ok().unwrap();

    let outer = orch.capture_once();

    assert!(outer.is_ok());
    let nested = orch.display().nested.borrow_mut().take();
    assert!(matches!(nested, Some(Err(CaptureError::CaptureInProgress))));
    assert_eq!(hides(&log), 1);
    assert_eq!(shows(&log), 1);
    assert_eq!(files_in(tmp.path()).len(), 1);
    assert!(!orch.is_in_flight());
}

// ── Shared between command threads ──────────────────────────────────

type SharedOrchestrator = Arc<Mutex<CaptureOrchestrator<MockWindow, MockDisplay>>>;

fn shared(log: &EventLog, dir: &Path) -> SharedOrchestrator {
    Arc::new(Mutex::new(CaptureOrchestrator::new(
        MockWindow::new(log.clone()),
        MockDisplay::solid(log.clone(), [7, 8, 9]),
        settings(dir),
    )))
}

#[test]
fn capture_runs_on_a_worker_thread() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = shared(&log, tmp.path());

    let worker = {
        let orch = Arc::clone(&orch);
        thread::spawn(move || CaptureOrchestrator::capture_locked(&*orch))
    };
    let artifact = worker.join().unwrap().unwrap();

    assert!(artifact.filepath.is_file());
    assert_eq!((hides(&log), shows(&log)), (1, 1));
    assert!(orch.lock().unwrap().window().is_visible());
}

#[test]
fn capture_while_another_holds_the_lock_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = shared(&log, tmp.path());

    let busy = orch.lock().unwrap();
    let result = thread::scope(|s| {
        s.spawn(|| CaptureOrchestrator::capture_locked(&*orch))
            .join()
            .unwrap()
    });
    assert!(matches!(result, Err(CaptureError::CaptureInProgress)));
    assert_eq!(hides(&log), 0);
    assert!(files_in(tmp.path()).is_empty());

    drop(busy);
    assert!(CaptureOrchestrator::capture_locked(&*orch).is_ok());
}

#[test]
fn poisoned_lock_still_captures() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let orch = shared(&log, tmp.path());

    let poisoner = {
        let orch = Arc::clone(&orch);
        thread::spawn(move || {
            let _held = orch.lock().unwrap();
            panic!("command thread died holding the orchestrator");
        })
    };
    assert!(poisoner.join().is_err());
    assert!(orch.is_poisoned());

    let artifact = CaptureOrchestrator::capture_locked(&*orch).unwrap();
    assert!(artifact.filepath.is_file());
    assert_eq!(shows(&log), 1);
}
