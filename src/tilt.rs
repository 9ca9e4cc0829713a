use crate::config::TiltConfig;
use crate::math::approach;
use crate::page::{Document, ElementId, Rect};
use crate::scheduler::{FrameCallback, FrameContext, Schedule};
use std::cell::RefCell;
use std::rc::Rc;

/// Class marking cards that tilt toward the pointer
pub const TILT_CLASS: &str = "tilt";

/// Class toggled from the keyboard
pub const ACTIVE_CLASS: &str = "active";

/// Pointer input delivered to a single card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { client_x: f64, client_y: f64 },
    Leave,
    Down,
    Up,
}

/// Keys a focused card reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other,
}

/// Card handle shared by the frame loop and the input router
pub type SharedTiltCard = Rc<RefCell<TiltCard>>;

/// Smoothed two-axis tilt for one element
#[derive(Debug, Clone)]
pub struct TiltCard {
    element: ElementId,
    config: TiltConfig,
    /// Rotation about the vertical axis, in degrees
    current_x: f64,
    /// Rotation about the horizontal axis, in degrees
    current_y: f64,
    target_x: f64,
    target_y: f64,
}

impl TiltCard {
    pub fn new(element: ElementId, config: TiltConfig) -> Self {
        TiltCard {
            element,
            config,
            current_x: 0.0,
            current_y: 0.0,
            target_x: 0.0,
            target_y: 0.0,
        }
    }

    /// Creates a card and writes its resting transform straight away
    pub fn attach(element: ElementId, config: TiltConfig, document: &mut Document) -> SharedTiltCard {
        let mut card = TiltCard::new(element, config);
        card.update(document);
        Rc::new(RefCell::new(card))
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Current `(x, y)` angles
    pub fn angles(&self) -> (f64, f64) {
        (self.current_x, self.current_y)
    }

    /// Angles the card is easing toward
    #[cfg(test)]
    pub fn targets(&self) -> (f64, f64) {
        (self.target_x, self.target_y)
    }

    pub fn on_pointer(&mut self, event: PointerEvent, rect: &Rect, document: &mut Document) {
        match event {
            PointerEvent::Move { client_x, client_y } => {
                if rect.width <= 0.0 || rect.height <= 0.0 {
                    return;
                }
                let x = (client_x - rect.left) / rect.width;
                let y = (client_y - rect.top) / rect.height;
                self.target_x = (x - 0.5) * self.config.max_deflection;
                self.target_y = -(y - 0.5) * self.config.max_deflection;
            }
            PointerEvent::Leave => {
                self.target_x = 0.0;
                self.target_y = 0.0;
            }
            PointerEvent::Down => {
                document
                    .element_mut(self.element)
                    .set_style("transition", self.config.press_transition);
            }
            PointerEvent::Up => {
                document.element_mut(self.element).set_style("transition", "");
            }
        }
    }

    /// Toggles the active marking; returns whether the key was consumed
    pub fn on_key(&mut self, key: Key, document: &mut Document) -> bool {
        match key {
            Key::Enter | Key::Space => {
                let active = document.element_mut(self.element).toggle_class(ACTIVE_CLASS);
                log::debug!("card {:?} active={}", self.element, active);
                true
            }
            Key::Other => false,
        }
    }

    /// One smoothing step (per frame, not scaled by elapsed time)
    pub fn update(&mut self, document: &mut Document) {
        self.current_x = approach(self.current_x, self.target_x, self.config.smoothing);
        self.current_y = approach(self.current_y, self.target_y, self.config.smoothing);
        let transform = self.transform();
        document.element_mut(self.element).set_style("transform", transform);
    }

    pub fn transform(&self) -> String {
        format!(
            "perspective({}px) rotateX({}deg) rotateY({}deg) translateY({}px)",
            self.config.perspective_px, self.current_y, self.current_x, self.config.lift_px
        )
    }
}

impl<C: FrameContext> FrameCallback<C> for TiltCard {
    fn on_frame(&mut self, _now: f64, ctx: &mut C) -> Schedule {
        self.update(ctx.document());
        Schedule::Again
    }
}

/// Attaches a card to every element carrying the tilt class
pub fn attach_all(document: &mut Document, config: TiltConfig) -> Vec<SharedTiltCard> {
    document
        .elements_with_class(TILT_CLASS)
        .into_iter()
        .map(|id| TiltCard::attach(id, config, document))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> (Document, TiltCard) {
        let mut doc = Document::new();
        let id = doc.create_element(None, &[TILT_CLASS]);
        (doc, TiltCard::new(id, TiltConfig::default()))
    }

    const RECT: Rect = Rect {
        left: 100.0,
        top: 50.0,
        width: 200.0,
        height: 100.0,
    };

    #[test]
    fn test_targets_follow_pointer() {
        let (mut doc, mut card) = card();
        let corner = PointerEvent::Move { client_x: 300.0, client_y: 50.0 };
        card.on_pointer(corner, &RECT, &mut doc);
        assert_eq!(card.targets(), (8.0, 8.0));

        let center = PointerEvent::Move { client_x: 200.0, client_y: 100.0 };
        card.on_pointer(center, &RECT, &mut doc);
        assert_eq!(card.targets(), (0.0, 0.0));

        let bottom_left = PointerEvent::Move { client_x: 100.0, client_y: 150.0 };
        card.on_pointer(bottom_left, &RECT, &mut doc);
        assert_eq!(card.targets(), (-8.0, -8.0));
    }

    #[test]
    fn test_smoothing_step() {
        let (mut doc, mut card) = card();
        let corner = PointerEvent::Move { client_x: 300.0, client_y: 150.0 };
        card.on_pointer(corner, &RECT, &mut doc);
        card.update(&mut doc);
        let (x, y) = card.angles();
        assert!((x - 1.2).abs() < 1e-12);
        assert!((y + 1.2).abs() < 1e-12);
        assert_eq!(
            doc.element(card.element()).style("transform"),
            Some(card.transform().as_str())
        );
    }

    #[test]
    fn test_converges_to_rest_after_leave() {
        let (mut doc, mut card) = card();
        let corner = PointerEvent::Move { client_x: 300.0, client_y: 50.0 };
        card.on_pointer(corner, &RECT, &mut doc);
        for _ in 0..30 {
            card.update(&mut doc);
        }
        card.on_pointer(PointerEvent::Leave, &RECT, &mut doc);

        let mut previous = card.angles().0.abs();
        for _ in 0..200 {
            card.update(&mut doc);
            let magnitude = card.angles().0.abs();
            // Never overshoots, never jumps by more than one smoothing step
            assert!(magnitude <= previous);
            assert!(previous - magnitude <= previous * 0.15 + 1e-12);
            previous = magnitude;
        }
        assert!(previous < 1e-6);
        assert!(card.angles().0 > 0.0, "exponential smoothing never reaches zero exactly");
    }

    #[test]
    fn test_press_sets_and_release_clears_transition() {
        let (mut doc, mut card) = card();
        card.on_pointer(PointerEvent::Down, &RECT, &mut doc);
        assert_eq!(doc.element(card.element()).style("transition"), Some("transform .25s"));
        card.on_pointer(PointerEvent::Up, &RECT, &mut doc);
        assert_eq!(doc.element(card.element()).style("transition"), None);
    }

    #[test]
    fn test_keyboard_toggles_active() {
        let (mut doc, mut card) = card();
        assert!(card.on_key(Key::Enter, &mut doc));
        assert!(doc.element(card.element()).has_class(ACTIVE_CLASS));
        assert!(card.on_key(Key::Space, &mut doc));
        assert!(!doc.element(card.element()).has_class(ACTIVE_CLASS));
        assert!(!card.on_key(Key::Other, &mut doc));
        // Tilt state is untouched by the keyboard
        assert_eq!(card.angles(), (0.0, 0.0));
    }

    #[test]
    fn test_transform_format() {
        let (_, card) = card();
        assert_eq!(
            card.transform(),
            "perspective(900px) rotateX(0deg) rotateY(0deg) translateY(-2px)"
        );
    }

    #[test]
    fn test_attach_all_writes_resting_transform() {
        let mut doc = Document::new();
        let a = doc.create_element(None, &[TILT_CLASS]);
        doc.create_element(None, &["reveal"]);
        let b = doc.create_element(None, &[TILT_CLASS, "reveal"]);
        let cards = attach_all(&mut doc, TiltConfig::default());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].borrow().element(), a);
        assert_eq!(cards[1].borrow().element(), b);
        assert!(doc.element(b).style("transform").is_some());
    }
}
