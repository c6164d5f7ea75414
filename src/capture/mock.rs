//! In-memory window and display for exercising the capture sequence
//! without a desktop session.
//!
//! Both mocks append to a shared [`EventLog`] so tests can assert on the
//! exact order of hide, grab and restore calls.

use super::screenshot::{DisplayCapture, DisplayError, RawFrame};
use super::visibility::{Feedback, WindowError, WindowState};
use super::{CaptureRegion, WindowGeometry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Geometry,
    Hide,
    Show,
    Flush,
    Opacity(f64),
    AlwaysOnTop(bool),
    Flash(Feedback),
    Probe,
    Grab(CaptureRegion),
}

/// Shared, ordered record of calls made on the mocks.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<MockEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: MockEvent) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&MockEvent) -> bool) -> usize {
        self.lock().iter().filter(|&e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MockEvent>> {
        // A test that panicked mid-push still left a usable log.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A window that only tracks visibility and geometry.
pub struct MockWindow {
    log: EventLog,
    geometry: Mutex<WindowGeometry>,
    visible: AtomicBool,
    fail_hide: bool,
    fail_show: bool,
    fail_geometry: bool,
}

impl MockWindow {
    /// A 400x300 window at (100, 200).
    pub fn new(log: EventLog) -> Self {
        Self::with_geometry(
            log,
            WindowGeometry {
                x: 100,
                y: 200,
                width: 400,
                height: 300,
            },
        )
    }

    pub fn with_geometry(log: EventLog, geometry: WindowGeometry) -> Self {
        Self {
            log,
            geometry: Mutex::new(geometry),
            visible: AtomicBool::new(true),
            fail_hide: false,
            fail_show: false,
            fail_geometry: false,
        }
    }

    pub fn failing_hide(mut self) -> Self {
        self.fail_hide = true;
        self
    }

    pub fn failing_show(mut self) -> Self {
        self.fail_show = true;
        self
    }

    pub fn failing_geometry(mut self) -> Self {
        self.fail_geometry = true;
        self
    }

    /// Simulates the user dragging or resizing the window.
    pub fn set_geometry(&self, geometry: WindowGeometry) {
        *self.geometry.lock().unwrap_or_else(|e| e.into_inner()) = geometry;
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl WindowState for MockWindow {
    fn geometry(&self) -> Result<WindowGeometry, WindowError> {
        self.log.push(MockEvent::Geometry);
        if self.fail_geometry {
            return Err(WindowError::new("window is gone"));
        }
        Ok(*self.geometry.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn hide(&self) -> Result<(), WindowError> {
        self.log.push(MockEvent::Hide);
        if self.fail_hide {
            return Err(WindowError::new("hide refused"));
        }
        self.visible.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn show(&self) -> Result<(), WindowError> {
        self.log.push(MockEvent::Show);
        if self.fail_show {
            return Err(WindowError::new("show refused"));
        }
        self.visible.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&self) {
        self.log.push(MockEvent::Flush);
    }

    fn set_opacity(&self, opacity: f64) -> Result<(), WindowError> {
        self.log.push(MockEvent::Opacity(opacity));
        Ok(())
    }

    fn set_always_on_top(&self, on_top: bool) -> Result<(), WindowError> {
        self.log.push(MockEvent::AlwaysOnTop(on_top));
        Ok(())
    }

    fn flash(&self, feedback: Feedback) {
        self.log.push(MockEvent::Flash(feedback));
    }
}

enum Behavior {
    Fill([u8; 4]),
    Frame(RawFrame),
    Fail(String),
}

/// A display that paints every grab a single colour, returns a canned
/// frame, or fails.
pub struct MockDisplay {
    log: EventLog,
    behavior: Behavior,
}

impl MockDisplay {
    pub fn solid(log: EventLog, rgb: [u8; 3]) -> Self {
        Self {
            log,
            behavior: Behavior::Fill([rgb[0], rgb[1], rgb[2], 255]),
        }
    }

    /// Always returns `frame`, whatever region is asked for.
    pub fn fixed(log: EventLog, frame: RawFrame) -> Self {
        Self {
            log,
            behavior: Behavior::Frame(frame),
        }
    }

    pub fn failing(log: EventLog, message: &str) -> Self {
        Self {
            log,
            behavior: Behavior::Fail(message.to_string()),
        }
    }
}

impl DisplayCapture for MockDisplay {
    fn grab(&self, region: &CaptureRegion) -> Result<RawFrame, DisplayError> {
        self.log.push(MockEvent::Grab(*region));
        match &self.behavior {
            Behavior::Fill(rgba) => {
                let pixel_count = region.width as usize * region.height as usize;
                Ok(RawFrame {
                    width: region.width,
                    height: region.height,
                    rgba: rgba.repeat(pixel_count),
                })
            }
            Behavior::Frame(frame) => Ok(frame.clone()),
            Behavior::Fail(message) => Err(DisplayError::CaptureFailed(message.clone())),
        }
    }

    fn probe(&self) -> Result<(), DisplayError> {
        self.log.push(MockEvent::Probe);
        match &self.behavior {
            Behavior::Fail(message) => Err(DisplayError::CaptureFailed(message.clone())),
            _ => Ok(()),
        }
    }
}
