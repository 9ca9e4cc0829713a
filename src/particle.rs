use crate::state::Viewport;
use rand::Rng;

/// A point of light travelling toward the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Planar position in simulated space, roughly within ±width
    pub x: f64,
    /// Planar position in simulated space, roughly within ±height
    pub y: f64,
    /// Distance from the viewer
    pub z: f64,
    /// Base radius before perspective
    pub r: f64,
    /// Depth units travelled per 16 ms
    pub speed: f64,
}

impl Particle {
    /// Creates a particle at a uniformly random depth in `[0, depth)`
    pub fn random<R: Rng>(rng: &mut R, viewport: &Viewport, depth: f64) -> Self {
        Particle {
            x: (rng.gen::<f64>() - 0.5) * viewport.width * 2.0,
            y: (rng.gen::<f64>() - 0.5) * viewport.height * 2.0,
            z: rng.gen::<f64>() * depth,
            r: rng.gen::<f64>() * 2.0 + 0.2,
            speed: rng.gen::<f64>() * 4.0 + 2.0,
        }
    }

    /// Re-randomises the particle in place and parks it at the far plane
    pub fn recycle<R: Rng>(&mut self, rng: &mut R, viewport: &Viewport, depth: f64) {
        *self = Particle {
            z: depth,
            ..Particle::random(rng, viewport, depth)
        };
    }

    /// Moves toward the viewer by `speed` per 16 ms of `dt_ms`
    pub fn advance(&mut self, dt_ms: f64) {
        self.z -= self.speed * (dt_ms / 16.0);
    }

    /// Whether the particle has reached or passed the viewer
    pub fn has_passed_viewer(&self) -> bool {
        self.z <= 0.0
    }
}
