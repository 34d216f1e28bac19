//! Calibrated touch input
//!
//! Wraps a raw touch controller and maps every reading through the shared
//! calibration matrix, producing Down/Move/Up events in display space.

use crate::point::Point;
use crate::shared::SharedMatrix;

/// Uncalibrated reading from a touch controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawSample {
    /// Raw ADC position
    pub point: Point,
    /// Pressure (0 = no touch, higher = more pressure)
    pub pressure: u16,
}

impl RawSample {
    pub const fn new(x: i32, y: i32, pressure: u16) -> Self {
        Self {
            point: Point::new(x, y),
            pressure,
        }
    }
}

/// Touch point in display coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: i32,
    pub y: i32,
    pub pressure: u16,
}

impl TouchPoint {
    pub const fn new(x: i32, y: i32, pressure: u16) -> Self {
        Self { x, y, pressure }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Touch event types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchEvent {
    /// Finger touched the screen
    Down(TouchPoint),
    /// Finger moved while touching
    Move(TouchPoint),
    /// Finger lifted from screen
    Up,
}

impl TouchEvent {
    /// Get the touch point if this is a Down or Move event
    pub fn point(&self) -> Option<TouchPoint> {
        match self {
            TouchEvent::Down(p) | TouchEvent::Move(p) => Some(*p),
            TouchEvent::Up => None,
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, TouchEvent::Down(_))
    }

    pub fn is_move(&self) -> bool {
        matches!(self, TouchEvent::Move(_))
    }

    pub fn is_up(&self) -> bool {
        matches!(self, TouchEvent::Up)
    }
}

/// Source of raw, uncalibrated touch readings (e.g. an XPT2046 over SPI)
pub trait RawTouchSource {
    /// Current raw reading, `None` when the panel is not touched
    fn read_raw(&mut self) -> Option<RawSample>;
}

/// Touch controller adapter that applies the current calibration
pub struct CalibratedTouch<S> {
    source: S,
    matrix: SharedMatrix,
    /// Display size used to clamp mapped points, if set
    bounds: Option<(i32, i32)>,
    last_point: Option<TouchPoint>,
    was_touched: bool,
}

impl<S: RawTouchSource> CalibratedTouch<S> {
    pub fn new(source: S, matrix: SharedMatrix) -> Self {
        Self {
            source,
            matrix,
            bounds: None,
            last_point: None,
            was_touched: false,
        }
    }

    /// Clamp mapped points to `0..width` x `0..height`
    pub fn with_bounds(mut self, width: u16, height: u16) -> Self {
        self.bounds = Some((width as i32, height as i32));
        self
    }

    /// Handle to the matrix in use; replacing it recalibrates this adapter
    pub fn matrix(&self) -> &SharedMatrix {
        &self.matrix
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn last_point(&self) -> Option<TouchPoint> {
        self.last_point
    }

    /// Read and calibrate the current touch point
    pub fn read_point(&mut self) -> Option<TouchPoint> {
        let raw = self.source.read_raw()?;
        let mapped = self.matrix.transform(raw.point);

        let (x, y) = match self.bounds {
            Some((width, height)) => (
                mapped.x.clamp(0, (width - 1).max(0)),
                mapped.y.clamp(0, (height - 1).max(0)),
            ),
            None => (mapped.x, mapped.y),
        };

        Some(TouchPoint::new(x, y, raw.pressure))
    }

    /// Poll for touch events
    pub fn poll_event(&mut self) -> Option<TouchEvent> {
        let point = self.read_point();

        match (self.was_touched, point) {
            (false, Some(p)) => {
                self.was_touched = true;
                self.last_point = Some(p);
                Some(TouchEvent::Down(p))
            }
            (true, Some(p)) => {
                self.last_point = Some(p);
                Some(TouchEvent::Move(p))
            }
            (true, None) => {
                self.was_touched = false;
                self.last_point = None;
                Some(TouchEvent::Up)
            }
            (false, None) => None,
        }
    }
}
