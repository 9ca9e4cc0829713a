use crate::field::ParticleField;
use crate::graphics::Surface;
use crate::page::Document;
use crate::state::Viewport;
use crate::tilt::SharedTiltCard;
use chrono::Datelike;
use rand::Rng;

/// Element whose text shows the current year
pub const YEAR_ELEMENT_ID: &str = "year";

/// Device pixel size of a surface covering the viewport
pub fn surface_size(viewport: &Viewport) -> (usize, usize) {
    let ratio = viewport.device_pixel_ratio;
    (
        (viewport.width * ratio).round().max(0.0) as usize,
        (viewport.height * ratio).round().max(0.0) as usize,
    )
}

/// Sizes the surface to the viewport and scales drawing to logical pixels.
/// Resizing drops the previous transform, so this runs after every resize.
pub fn size_surface<S: Surface>(surface: &mut S, viewport: &Viewport) {
    let (width, height) = surface_size(viewport);
    surface.resize(width, height);
    surface.scale(viewport.device_pixel_ratio);
}

/// Trades particles and tilt transitions for a calmer page
pub fn apply_reduced_motion<R: Rng>(
    field: &mut ParticleField<R>,
    cards: &[SharedTiltCard],
    document: &mut Document,
    cap: usize,
) {
    let before = field.len();
    field.truncate(cap);
    for card in cards {
        let element = card.borrow().element();
        document.element_mut(element).set_style("transition", "none");
    }
    log::info!(
        "reduced motion: {} -> {} particles, {} tilt card(s) without transitions",
        before,
        field.len(),
        cards.len()
    );
}

/// Writes `year` into the year element; returns false when there is none
pub fn inject_year(document: &mut Document, year: i32) -> bool {
    match document.get_element_by_id(YEAR_ELEMENT_ID) {
        Some(id) => {
            document.element_mut(id).set_text(year.to_string());
            true
        }
        None => false,
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, TiltConfig};
    use crate::graphics::testing::{Op, RecordingSurface};
    use crate::state::SharedHue;
    use crate::tilt::{attach_all, TILT_CLASS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_surface_scaled_for_dense_displays() {
        let viewport = Viewport::new(800.0, 600.0).with_device_pixel_ratio(2.0);
        assert_eq!(surface_size(&viewport), (1600, 1200));

        let mut surface = RecordingSurface::default();
        size_surface(&mut surface, &viewport);
        assert_eq!(surface.ops, vec![Op::Resize(1600, 1200), Op::Scale(2.0)]);
    }

    #[test]
    fn test_reduced_motion_caps_pool_and_disables_transitions() {
        let mut doc = Document::new();
        doc.create_element(None, &[TILT_CLASS]);
        doc.create_element(None, &[TILT_CLASS]);
        let cards = attach_all(&mut doc, TiltConfig::default());
        let mut field = ParticleField::new(
            FieldConfig::default(),
            Viewport::new(1920.0, 1080.0),
            SharedHue::new(260.0),
            StdRng::seed_from_u64(1),
            0.0,
        );
        assert_eq!(field.len(), 1800);

        apply_reduced_motion(&mut field, &cards, &mut doc, 400);

        assert_eq!(field.len(), 400);
        for card in &cards {
            let element = card.borrow().element();
            assert_eq!(doc.element(element).style("transition"), Some("none"));
        }
    }

    #[test]
    fn test_reduced_motion_keeps_small_pools() {
        let mut doc = Document::new();
        let mut field = ParticleField::new(
            FieldConfig::default(),
            Viewport::new(300.0, 300.0),
            SharedHue::new(260.0),
            StdRng::seed_from_u64(1),
            0.0,
        );
        apply_reduced_motion(&mut field, &[], &mut doc, 400);
        assert_eq!(field.len(), 100);
    }

    #[test]
    fn test_inject_year() {
        let mut doc = Document::new();
        assert!(!inject_year(&mut doc, 2026));
        let year = doc.create_element(Some(YEAR_ELEMENT_ID), &[]);
        assert!(inject_year(&mut doc, 2026));
        assert_eq!(doc.element(year).text(), "2026");
    }

    #[test]
    fn test_current_year_is_plausible() {
        assert!(current_year() >= 2024);
    }
}
