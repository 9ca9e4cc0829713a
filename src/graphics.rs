use crate::math::hsl_to_rgb;
use std::f64::consts::PI;
use std::fmt;

/// Fill colour accepted by a drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    /// 8-bit channels with a fractional alpha
    Rgba { r: u8, g: u8, b: u8, a: f64 },
    /// Hue in degrees, saturation and lightness in percent, fractional alpha
    Hsla { h: f64, s: f64, l: f64, a: f64 },
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Color::Rgba { r, g, b, a }
    }

    pub const fn hsla(h: f64, s: f64, l: f64, a: f64) -> Self {
        Color::Hsla { h, s, l, a }
    }

    /// Channels in `[0, 1]`, alpha ignored
    pub fn to_rgb(&self) -> [f64; 3] {
        match *self {
            Color::Rgba { r, g, b, .. } => {
                [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]
            }
            Color::Hsla { h, s, l, .. } => hsl_to_rgb(h, s, l),
        }
    }

    pub fn alpha(&self) -> f64 {
        match *self {
            Color::Rgba { a, .. } | Color::Hsla { a, .. } => a.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Rgba { r, g, b, a } => write!(f, "rgba({},{},{},{})", r, g, b, a),
            Color::Hsla { h, s, l, a } => write!(f, "hsla({} {}% {}% / {})", h, s, l, a),
        }
    }
}

/// Minimal 2D drawing surface
pub trait Surface {
    /// Resizes the backing store in device pixels; resets the transform
    fn resize(&mut self, width: usize, height: usize);
    fn set_fill_style(&mut self, color: Color);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64);
    fn translate(&mut self, dx: f64, dy: f64);
    fn scale(&mut self, factor: f64);
    /// Pushes the current transform
    fn save(&mut self);
    /// Pops back to the last saved transform
    fn restore(&mut self);
}

/// Uniform scale followed by translation, in device pixels
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    scale: f64,
    tx: f64,
    ty: f64,
}

impl Transform {
    const IDENTITY: Transform = Transform {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.tx, y * self.scale + self.ty)
    }
}

/// Software RGB raster with source-over blending
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<[f64; 3]>,
    fill: Color,
    transform: Transform,
    stack: Vec<Transform>,
}

impl Raster {
    /// Creates an opaque black raster
    pub fn new(width: usize, height: usize) -> Self {
        Raster {
            width,
            height,
            pixels: vec![[0.0; 3]; width * height],
            fill: Color::rgba(0, 0, 0, 1.0),
            transform: Transform::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at device coordinates as 8-bit RGB
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let [r, g, b] = self.pixels[y * self.width + x];
        [to_byte(r), to_byte(g), to_byte(b)]
    }

    /// Blends the current fill colour into one device pixel with extra coverage
    fn blend(&mut self, x: usize, y: usize, coverage: f64) {
        let alpha = self.fill.alpha() * coverage.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let src = self.fill.to_rgb();
        let dst = &mut self.pixels[y * self.width + x];
        for channel in 0..3 {
            dst[channel] = dst[channel] * (1.0 - alpha) + src[channel] * alpha;
        }
    }

    /// Device pixel range covering `[min, max)` clipped to `limit`
    fn span(min: f64, max: f64, limit: usize) -> Option<(usize, usize)> {
        let start = min.round().max(0.0);
        let end = max.round().min(limit as f64);
        if !(start < end) {
            return None;
        }
        Some((start as usize, end as usize))
    }
}

impl Surface for Raster {
    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 3]; width * height];
        self.transform = Transform::IDENTITY;
        self.stack.clear();
    }

    fn set_fill_style(&mut self, color: Color) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (x0, y0) = self.transform.apply(x, y);
        let (x1, y1) = self.transform.apply(x + width, y + height);
        let Some((min_x, max_x)) = Self::span(x0.min(x1), x0.max(x1), self.width) else {
            return;
        };
        let Some((min_y, max_y)) = Self::span(y0.min(y1), y0.max(y1), self.height) else {
            return;
        };
        for py in min_y..max_y {
            for px in min_x..max_x {
                self.blend(px, py, 1.0);
            }
        }
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64) {
        let (cx, cy) = self.transform.apply(x, y);
        let r = radius * self.transform.scale;
        if !(cx.is_finite() && cy.is_finite() && r.is_finite()) || r <= 0.0 {
            return;
        }

        // Sub-pixel circles contribute their area to the pixel they land in
        if r < 0.5 {
            if cx >= 0.0 && cy >= 0.0 && cx < self.width as f64 && cy < self.height as f64 {
                self.blend(cx as usize, cy as usize, PI * r * r);
            }
            return;
        }

        // Compute bounding box of the circle
        let Some((min_x, max_x)) = Self::span((cx - r).floor(), (cx + r).ceil(), self.width)
        else {
            return;
        };
        let Some((min_y, max_y)) = Self::span((cy - r).floor(), (cy + r).ceil(), self.height)
        else {
            return;
        };

        let r2 = r * r;
        for py in min_y..max_y {
            for px in min_x..max_x {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend(px, py, 1.0);
                }
            }
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform.tx += dx * self.transform.scale;
        self.transform.ty += dy * self.transform.scale;
    }

    fn scale(&mut self, factor: f64) {
        self.transform.scale *= factor;
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.transform = previous;
        }
    }
}

fn to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
