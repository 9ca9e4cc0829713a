use crate::graphics::Surface;
use crate::page::Document;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic millisecond timestamps
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock measured from process start
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// What a frame callback wants after it has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run again on the next frame
    Again,
    /// Drop the callback
    Done,
}

/// Platform handles a frame callback may draw or write to
pub trait FrameContext {
    type Surface: Surface;

    fn surface(&mut self) -> &mut Self::Surface;
    fn document(&mut self) -> &mut Document;
}

/// Work performed once per display refresh
pub trait FrameCallback<C> {
    /// Runs one frame with the shared timestamp for this refresh
    fn on_frame(&mut self, now: f64, ctx: &mut C) -> Schedule;
}

/// Lets a callback stay reachable from event handlers while it is scheduled
impl<C, T: FrameCallback<C>> FrameCallback<C> for Rc<RefCell<T>> {
    fn on_frame(&mut self, now: f64, ctx: &mut C) -> Schedule {
        self.borrow_mut().on_frame(now, ctx)
    }
}

/// Drives frame callbacks from an injectable clock.
///
/// Every pending callback sees the same timestamp within a frame and runs in
/// the order it was requested.
pub struct FrameScheduler<C, K: Clock> {
    clock: K,
    callbacks: Vec<Box<dyn FrameCallback<C>>>,
    frames: u64,
}

impl<C, K: Clock> FrameScheduler<C, K> {
    pub fn new(clock: K) -> Self {
        FrameScheduler {
            clock,
            callbacks: Vec::new(),
            frames: 0,
        }
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Registers a callback for the next frame
    pub fn request(&mut self, callback: Box<dyn FrameCallback<C>>) {
        self.callbacks.push(callback);
    }

    pub fn pending(&self) -> usize {
        self.callbacks.len()
    }

    /// Number of frames run so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame and returns its timestamp
    pub fn run_frame(&mut self, ctx: &mut C) -> f64 {
        let now = self.clock.now();
        self.callbacks
            .retain_mut(|callback| callback.on_frame(now, ctx) == Schedule::Again);
        self.frames += 1;
        now
    }
}
