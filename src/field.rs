use crate::config::FieldConfig;
use crate::graphics::{Color, Surface};
use crate::math::{depth_hue, depth_opacity, perspective_scale, project, rotation_matrix};
use crate::particle::Particle;
use crate::scheduler::{FrameCallback, FrameContext, Schedule};
use crate::state::{SharedHue, Viewport};
use rand::Rng;

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub culled: usize,
    pub recycled: usize,
}

/// Fixed pool of particles streaming toward the viewer
pub struct ParticleField<R: Rng> {
    config: FieldConfig,
    viewport: Viewport,
    hue: SharedHue,
    rng: R,
    particles: Vec<Particle>,
    /// Timestamp of the previous frame
    last_time: f64,
    /// Accumulated simulated milliseconds
    tick: f64,
}

impl<R: Rng> ParticleField<R> {
    /// Fills a pool sized from the viewport area
    pub fn new(
        config: FieldConfig,
        viewport: Viewport,
        hue: SharedHue,
        mut rng: R,
        start: f64,
    ) -> Self {
        let count = config.pool_size(viewport.area());
        let particles = (0..count)
            .map(|_| Particle::random(&mut rng, &viewport, config.depth))
            .collect();
        log::info!(
            "particle field: {} particles for {}x{} viewport",
            count,
            viewport.width,
            viewport.height
        );
        ParticleField {
            config,
            viewport,
            hue,
            rng,
            particles,
            last_time: start,
            tick: 0.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Shrinks the pool to at most `cap` particles
    pub fn truncate(&mut self, cap: usize) {
        self.particles.truncate(cap);
    }

    /// Adopts a new viewport; the pool size is kept
    pub fn resize(&mut self, viewport: Viewport) {
        log::debug!("particle field resized to {}x{}", viewport.width, viewport.height);
        self.viewport = viewport;
    }

    /// Current oscillating rotation in radians
    pub fn rotation(&self) -> f64 {
        (self.tick * self.config.rotation_frequency).sin() * self.config.rotation_amplitude
    }

    /// Advances, projects and draws every particle
    pub fn frame<S: Surface>(&mut self, now: f64, surface: &mut S) -> FrameStats {
        let dt = (now - self.last_time).clamp(0.0, self.config.max_frame_ms);
        self.last_time = now;
        self.tick += dt;

        // Fade the previous frame instead of clearing it
        surface.set_fill_style(self.config.trail_color);
        surface.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);

        let (center_x, center_y) = self.viewport.center();
        let matrix = rotation_matrix(self.rotation());
        let base_hue = self.hue.get();
        let mut stats = FrameStats::default();

        surface.save();
        surface.translate(center_x, center_y);

        let Self {
            config,
            viewport,
            rng,
            particles,
            ..
        } = self;
        let depth = config.depth;
        let margin = config.cull_margin;

        for particle in particles.iter_mut() {
            particle.advance(dt);
            if particle.has_passed_viewer() {
                particle.recycle(rng, viewport, depth);
                stats.recycled += 1;
            }

            let scale = perspective_scale(config.focal_length, particle.z);
            let [x, y] = project(&matrix, particle.x, particle.y, scale);

            if x < -center_x - margin
                || x > center_x + margin
                || y < -center_y - margin
                || y > center_y + margin
            {
                stats.culled += 1;
                continue;
            }

            let alpha = depth_opacity(particle.z, depth, config.opacity_gain);
            let size = particle.r * scale * config.size_gain;
            let hue = depth_hue(base_hue, particle.z, depth, config.hue_span);

            surface.set_fill_style(Color::hsla(hue, config.saturation, config.lightness, alpha));
            surface.fill_circle(x, y, size);
            stats.drawn += 1;
        }

        surface.restore();
        log::trace!(
            "frame dt={:.1}ms drawn={} culled={} recycled={}",
            dt,
            stats.drawn,
            stats.culled,
            stats.recycled
        );
        stats
    }
}

impl<R: Rng, C: FrameContext> FrameCallback<C> for ParticleField<R> {
    fn on_frame(&mut self, now: f64, ctx: &mut C) -> Schedule {
        self.frame(now, ctx.surface());
        Schedule::Again
    }
}
