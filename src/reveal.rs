use crate::page::{Document, ElementId, Rect};
use std::collections::BTreeSet;

/// Class marking elements that take part in scroll reveal
pub const REVEAL_CLASS: &str = "reveal";

/// Class applied once an element has been seen
pub const VISIBLE_CLASS: &str = "visible";

/// Fraction of an element that must be on screen before it is revealed
pub const DEFAULT_THRESHOLD: f64 = 0.25;

/// Visibility report for one observed element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Visible fraction of the element's area
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn is_intersecting(&self) -> bool {
        self.ratio > 0.0
    }
}

/// Fraction of `element` lying inside `viewport`
pub fn intersection_ratio(element: &Rect, viewport: &Rect) -> f64 {
    let area = element.area();
    if area <= 0.0 {
        return 0.0;
    }
    element
        .intersection(viewport)
        .map_or(0.0, |overlap| overlap.area() / area)
}

/// Marks elements visible the first time they scroll into view
pub struct RevealObserver {
    threshold: f64,
    observed: BTreeSet<ElementId>,
}

impl Default for RevealObserver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl RevealObserver {
    pub fn new(threshold: f64) -> Self {
        RevealObserver {
            threshold,
            observed: BTreeSet::new(),
        }
    }

    /// Observes every element carrying the reveal class
    pub fn observe_all(&mut self, document: &Document) {
        for id in document.elements_with_class(REVEAL_CLASS) {
            self.observe(id);
        }
    }

    pub fn observe(&mut self, id: ElementId) {
        self.observed.insert(id);
    }

    pub fn unobserve(&mut self, id: ElementId) {
        self.observed.remove(&id);
    }

    pub fn is_observing(&self, id: ElementId) -> bool {
        self.observed.contains(&id)
    }

    /// Applies a batch of entries; returns the elements revealed by it
    pub fn on_intersections(
        &mut self,
        document: &mut Document,
        entries: &[IntersectionEntry],
    ) -> Vec<ElementId> {
        let mut revealed = Vec::new();
        for entry in entries {
            if !self.is_observing(entry.target) {
                continue;
            }
            if entry.is_intersecting() && entry.ratio >= self.threshold {
                document.element_mut(entry.target).add_class(VISIBLE_CLASS);
                self.unobserve(entry.target);
                revealed.push(entry.target);
            }
        }
        if !revealed.is_empty() {
            log::debug!(
                "revealed {} element(s), {} still observed",
                revealed.len(),
                self.observed.len()
            );
        }
        revealed
    }

    /// Measures every observed element against the viewport and applies the result
    pub fn check_layout(
        &mut self,
        document: &mut Document,
        layout: &[(ElementId, Rect)],
        viewport: &Rect,
    ) -> Vec<ElementId> {
        let entries: Vec<IntersectionEntry> = layout
            .iter()
            .filter(|(id, _)| self.is_observing(*id))
            .map(|(id, rect)| IntersectionEntry {
                target: *id,
                ratio: intersection_ratio(rect, viewport),
            })
            .collect();
        self.on_intersections(document, &entries)
    }
}
