use std::collections::{BTreeMap, BTreeSet};

/// Axis-aligned box in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Overlap of two boxes, `None` when they do not overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Same box moved by an offset
    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.width, self.height)
    }
}

/// Handle to an element owned by a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// A page element: class list, inline style, data attributes and text
#[derive(Debug, Clone, Default)]
pub struct Element {
    id: Option<String>,
    classes: BTreeSet<String>,
    style: BTreeMap<String, String>,
    dataset: BTreeMap<String, String>,
    text: String,
}

impl Element {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    /// Flips a class and returns whether it is now present
    pub fn toggle_class(&mut self, class: &str) -> bool {
        if self.classes.remove(class) {
            false
        } else {
            self.classes.insert(class.to_string());
            true
        }
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    /// Sets an inline style property; an empty value removes it
    pub fn set_style(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.style.remove(property);
        } else {
            self.style.insert(property.to_string(), value);
        }
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset.get(key).map(String::as_str)
    }

    pub fn set_data(&mut self, key: &str, value: impl Into<String>) {
        self.dataset.insert(key.to_string(), value.into());
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// Flat element arena with the document root at a fixed handle
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            elements: vec![Element::default()],
        }
    }

    pub fn root(&self) -> &Element {
        &self.elements[0]
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.elements[0]
    }

    /// Appends an element with an optional `id` attribute and initial classes
    pub fn create_element(&mut self, id: Option<&str>, classes: &[&str]) -> ElementId {
        let mut element = Element {
            id: id.map(str::to_string),
            ..Element::default()
        };
        for class in classes {
            element.add_class(class);
        }
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|element| element.id() == Some(id))
            .map(ElementId)
    }

    /// All elements carrying `class`, in document order
    pub fn elements_with_class(&self, class: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.has_class(class))
            .map(|(index, _)| ElementId(index))
            .collect()
    }
}
