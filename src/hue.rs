use crate::page::Document;
use crate::scheduler::{FrameCallback, FrameContext, Schedule};
use crate::state::{parse_accent_hue, SharedHue};

/// Root custom property carrying the accent hue
pub const ACCENT_HUE_PROPERTY: &str = "--accent-hue";

/// Wall-clock milliseconds between hue steps
pub const HUE_INTERVAL_MS: f64 = 80.0;

/// Degrees added per step
pub const HUE_STEP: f64 = 0.4;

/// Reads the starting hue from the document root, falling back to the default
pub fn initial_hue(document: &Document) -> SharedHue {
    SharedHue::new(parse_accent_hue(document.root().style(ACCENT_HUE_PROPERTY)))
}

/// Slowly walks the accent hue around the colour wheel
pub struct HueCycler {
    hue: SharedHue,
    interval: f64,
    step: f64,
    last_update: f64,
}

impl HueCycler {
    pub fn new(hue: SharedHue) -> Self {
        Self::with_timing(hue, HUE_INTERVAL_MS, HUE_STEP)
    }

    pub fn with_timing(hue: SharedHue, interval: f64, step: f64) -> Self {
        HueCycler {
            hue,
            interval,
            step,
            last_update: 0.0,
        }
    }

    /// Steps the hue when more than one interval has passed since the last
    /// step, returning whether it did
    pub fn tick(&mut self, now: f64, document: &mut Document) -> bool {
        if now - self.last_update <= self.interval {
            return false;
        }
        self.hue.set(self.hue.get() + self.step);
        document
            .root_mut()
            .set_style(ACCENT_HUE_PROPERTY, format!("{:.1}", self.hue.get()));
        self.last_update = now;
        true
    }
}

impl<C: FrameContext> FrameCallback<C> for HueCycler {
    fn on_frame(&mut self, now: f64, ctx: &mut C) -> Schedule {
        self.tick(now, ctx.document());
        Schedule::Again
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{ManualClock, TestPage};
    use crate::scheduler::FrameScheduler;

    #[test]
    fn test_initial_hue_from_root_property() {
        let mut doc = Document::new();
        assert_eq!(initial_hue(&doc).get(), 260.0);
        doc.root_mut().set_style(ACCENT_HUE_PROPERTY, "190");
        assert_eq!(initial_hue(&doc).get(), 190.0);
    }

    #[test]
    fn test_throttled_to_interval() {
        let hue = SharedHue::new(260.0);
        let mut cycler = HueCycler::new(hue.clone());
        let mut doc = Document::new();

        assert!(!cycler.tick(16.0, &mut doc));
        assert!(!cycler.tick(80.0, &mut doc));
        assert!(cycler.tick(96.0, &mut doc));
        assert!(!cycler.tick(150.0, &mut doc));
        assert!(cycler.tick(177.0, &mut doc));
        assert!((hue.get() - 260.8).abs() < 1e-9);
        assert_eq!(doc.root().style(ACCENT_HUE_PROPERTY), Some("260.8"));
    }

    #[test]
    fn test_hue_after_many_ticks() {
        let hue = SharedHue::new(260.0);
        let mut cycler = HueCycler::new(hue.clone());
        let mut doc = Document::new();
        let ticks = 1000;
        for n in 1..=ticks {
            assert!(cycler.tick(n as f64 * 81.0, &mut doc));
            assert!((0.0..360.0).contains(&hue.get()));
        }
        let expected = (260.0 + 0.4 * ticks as f64) % 360.0;
        assert!((hue.get() - expected).abs() < 1e-6, "{} vs {}", hue.get(), expected);
    }

    #[test]
    fn test_hue_wraps_past_360() {
        let hue = SharedHue::new(359.8);
        let mut cycler = HueCycler::new(hue.clone());
        let mut doc = Document::new();
        cycler.tick(100.0, &mut doc);
        assert!((hue.get() - 0.2).abs() < 1e-9);
        assert_eq!(doc.root().style(ACCENT_HUE_PROPERTY), Some("0.2"));
    }

    #[test]
    fn test_driven_by_scheduler() {
        let clock = ManualClock::default();
        let hue = SharedHue::new(260.0);
        let mut scheduler: FrameScheduler<TestPage, _> = FrameScheduler::new(clock.clone());
        scheduler.request(Box::new(HueCycler::new(hue.clone())));
        let mut page = TestPage::default();

        // 16ms frames: a step lands every sixth frame (96ms apart)
        for _ in 0..60 {
            clock.advance(16.0);
            scheduler.run_frame(&mut page);
        }
        let steps = ((hue.get() - 260.0) / 0.4).round() as u32;
        assert_eq!(steps, 10);
        assert_eq!(scheduler.pending(), 1);
    }
}
