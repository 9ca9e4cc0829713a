use crate::math::wrap_degrees;
use std::cell::Cell;
use std::rc::Rc;

/// Accent hue used when the stored style property is missing or unusable
pub const DEFAULT_ACCENT_HUE: f64 = 260.0;

/// Visible area in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Device pixels per logical pixel
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Current accent hue, shared between the cycler that writes it and the
/// effects that read it
#[derive(Debug, Clone)]
pub struct SharedHue(Rc<Cell<f64>>);

impl SharedHue {
    pub fn new(initial: f64) -> Self {
        SharedHue(Rc::new(Cell::new(wrap_degrees(initial))))
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }

    /// Stores a new hue, wrapped into `[0, 360)`
    pub fn set(&self, hue: f64) {
        self.0.set(wrap_degrees(hue));
    }
}

/// Parses the leading integer of a stored hue property.
///
/// Missing, unparseable and zero values all fall back to
/// [`DEFAULT_ACCENT_HUE`].
pub fn parse_accent_hue(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_ACCENT_HUE;
    };
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    match trimmed[..sign_len + digits].parse::<i64>() {
        Ok(0) | Err(_) => DEFAULT_ACCENT_HUE,
        Ok(value) => value as f64,
    }
}
