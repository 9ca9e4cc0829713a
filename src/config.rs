use crate::graphics::Color;
use clap::Parser;
use std::path::PathBuf;

/// Command-line options
#[derive(Parser, Debug, Clone)]
#[command(version, about = "A console-based 3D particle tunnel with page effects")]
pub struct Args {
    /// Use fewer particles and disable tilt transitions
    #[arg(long, env = "TUNNEL3D_REDUCED_MOTION")]
    pub reduced_motion: bool,

    /// Target frames per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Seed for the particle generator (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// File holding persisted preferences
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Log file (the terminal is busy drawing)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Logical pixels per half-block pixel (a cell is one wide, two tall)
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
    pub pixel_scale: u16,

    /// Upper bound on the particle pool
    #[arg(long)]
    pub max_particles: Option<usize>,
}

impl Args {
    /// Frame interval in milliseconds
    pub fn frame_interval_ms(&self) -> u64 {
        (1000 / self.fps.max(1)) as u64
    }
}

/// Tunables for the particle tunnel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConfig {
    /// Distance from the eye to the projection plane
    pub focal_length: f64,
    /// Far plane; particles are recycled here
    pub depth: f64,
    pub max_particles: usize,
    /// Viewport area per particle
    pub density_divisor: f64,
    /// Longest simulated step after a stall
    pub max_frame_ms: f64,
    pub rotation_frequency: f64,
    /// Peak rotation in radians
    pub rotation_amplitude: f64,
    /// Translucent wash painted over the previous frame
    pub trail_color: Color,
    pub cull_margin: f64,
    pub opacity_gain: f64,
    pub size_gain: f64,
    /// Hue offset between the near and far planes
    pub hue_span: f64,
    pub saturation: f64,
    pub lightness: f64,
    /// Pool cap under reduced motion
    pub reduced_motion_cap: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            focal_length: 500.0,
            depth: 1600.0,
            max_particles: 1800,
            density_divisor: 900.0,
            max_frame_ms: 60.0,
            rotation_frequency: 0.00007,
            rotation_amplitude: 0.4,
            trail_color: Color::rgba(10, 14, 22, 0.42),
            cull_margin: 100.0,
            opacity_gain: 1.3,
            size_gain: 1.2,
            hue_span: 120.0,
            saturation: 90.0,
            lightness: 60.0,
            reduced_motion_cap: 400,
        }
    }
}

impl FieldConfig {
    /// Pool size for a viewport area, capped at `max_particles`
    pub fn pool_size(&self, area: f64) -> usize {
        let by_area = (area / self.density_divisor).floor().max(0.0) as usize;
        by_area.min(self.max_particles)
    }
}

/// Tunables for card tilt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltConfig {
    /// Degrees of rotation at the card edge
    pub max_deflection: f64,
    /// Fraction of the remaining distance covered per frame
    pub smoothing: f64,
    pub perspective_px: f64,
    pub lift_px: f64,
    /// Transition applied while the pointer is pressed
    pub press_transition: &'static str,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            max_deflection: 16.0,
            smoothing: 0.15,
            perspective_px: 900.0,
            lift_px: -2.0,
            press_transition: "transform .25s",
        }
    }
}
