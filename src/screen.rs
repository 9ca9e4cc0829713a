use crate::graphics::Raster;
use crate::page::Rect;
use crate::theme::Theme;
use crossterm::style::{Color as TermColor, Print, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue};
use std::io::{self, Write};

/// Share of the panel colour painted over the tunnel
pub const PANEL_OPACITY: f64 = 0.82;

/// Tilt (degrees times offset from centre) giving full shading
const TILT_SHADE_RANGE: f64 = 32.0;

/// One character cell: glyph plus colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: [u8; 3],
    pub bg: [u8; 3],
}

/// Screen contents ready to be written to the terminal
#[derive(Debug, Clone)]
pub struct CellGrid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    /// Two raster rows per cell, upper pixel in the foreground of `▀`
    pub fn from_raster(raster: &Raster, cols: u16, rows: u16) -> Self {
        let mut cells = Vec::with_capacity(cols as usize * rows as usize);
        let sample = |x: usize, y: usize| {
            if x < raster.width() && y < raster.height() {
                raster.pixel(x, y)
            } else {
                [0, 0, 0]
            }
        };
        for row in 0..rows as usize {
            for col in 0..cols as usize {
                cells.push(Cell {
                    ch: '▀',
                    fg: sample(col, row * 2),
                    bg: sample(col, row * 2 + 1),
                });
            }
        }
        CellGrid { cols, rows, cells }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn get(&self, col: i32, row: i32) -> Option<&Cell> {
        self.index(col, row).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, col: i32, row: i32) -> Option<&mut Cell> {
        self.index(col, row).map(move |index| &mut self.cells[index])
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= i32::from(self.cols) || row >= i32::from(self.rows) {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    /// Writes text over existing backgrounds, clipped to `max_chars` and the screen
    pub fn put_text(&mut self, col: i32, row: i32, text: &str, fg: [u8; 3], max_chars: usize) {
        for (offset, ch) in text.chars().take(max_chars).enumerate() {
            if let Some(cell) = self.get_mut(col + offset as i32, row) {
                cell.ch = ch;
                cell.fg = fg;
            }
        }
    }

    /// Row contents as a string, for inspection
    #[cfg(test)]
    pub fn row_text(&self, row: u16) -> String {
        (0..i32::from(self.cols))
            .filter_map(|col| self.get(col, i32::from(row)))
            .map(|cell| cell.ch)
            .collect()
    }
}

/// Colours for one theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub panel: [u8; 3],
    pub text: [u8; 3],
    pub dim: [u8; 3],
}

impl Palette {
    pub fn for_theme(theme: Option<Theme>) -> Self {
        match theme {
            Some(Theme::Light) => Palette {
                panel: [238, 241, 248],
                text: [24, 28, 40],
                dim: [90, 98, 115],
            },
            _ => Palette {
                panel: [16, 20, 32],
                text: [220, 226, 240],
                dim: [140, 150, 170],
            },
        }
    }
}

pub fn mix(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0; 3];
    for channel in 0..3 {
        let value = f64::from(a[channel]) * (1.0 - t) + f64::from(b[channel]) * t;
        out[channel] = value.round() as u8;
    }
    out
}

/// Positive amounts lighten toward white, negative darken toward black
pub fn shade(color: [u8; 3], amount: f64) -> [u8; 3] {
    if amount >= 0.0 {
        mix(color, [255, 255, 255], amount)
    } else {
        mix(color, [0, 0, 0], -amount)
    }
}

pub fn to_bytes(rgb: [f64; 3]) -> [u8; 3] {
    rgb.map(|channel| (channel * 255.0).round().clamp(0.0, 255.0) as u8)
}

fn border_char(dx: i32, dy: i32, width: i32, height: i32, active: bool) -> Option<char> {
    let (top, bottom) = (dy == 0, dy == height - 1);
    let (left, right) = (dx == 0, dx == width - 1);
    let glyphs = if active {
        ['╔', '╗', '╚', '╝', '═', '║']
    } else {
        ['╭', '╮', '╰', '╯', '─', '│']
    };
    match (top, bottom, left, right) {
        (true, _, true, _) => Some(glyphs[0]),
        (true, _, _, true) => Some(glyphs[1]),
        (_, true, true, _) => Some(glyphs[2]),
        (_, true, _, true) => Some(glyphs[3]),
        (true, _, _, _) | (_, true, _, _) => Some(glyphs[4]),
        (_, _, true, _) | (_, _, _, true) => Some(glyphs[5]),
        _ => None,
    }
}

/// How a section frame is decorated
#[derive(Debug, Clone, Copy, Default)]
pub struct CardStyle {
    /// Toggled on from the keyboard
    pub active: bool,
    pub focused: bool,
}

/// Draws one section as a glass panel shaded by its tilt
pub fn draw_section(
    grid: &mut CellGrid,
    rect: &Rect,
    (title, body): (&str, &str),
    angles: Option<(f64, f64)>,
    style: CardStyle,
    palette: &Palette,
    accent: [u8; 3],
) {
    let (left, top) = (rect.left as i32, rect.top as i32);
    let (width, height) = (rect.width as i32, rect.height as i32);
    if width < 2 || height < 2 {
        return;
    }
    let (ax, ay) = angles.unwrap_or((0.0, 0.0));
    let border_color = if style.focused {
        accent
    } else {
        mix(accent, palette.dim, 0.5)
    };

    for dy in 0..height {
        for dx in 0..width {
            let Some(cell) = grid.get_mut(left + dx, top + dy) else {
                continue;
            };
            // The side tilted toward the viewer catches more light
            let u = (f64::from(dx) + 0.5) / f64::from(width) - 0.5;
            let v = (f64::from(dy) + 0.5) / f64::from(height) - 0.5;
            let light = (ax * u - ay * v) / TILT_SHADE_RANGE;
            let backdrop = mix(cell.fg, cell.bg, 0.5);
            cell.bg = shade(mix(backdrop, palette.panel, PANEL_OPACITY), light);
            match border_char(dx, dy, width, height, style.active) {
                Some(ch) => {
                    cell.ch = ch;
                    cell.fg = border_color;
                }
                None => {
                    cell.ch = ' ';
                    cell.fg = palette.text;
                }
            }
        }
    }

    let inner = (width - 4).max(0) as usize;
    let title = if style.active {
        format!("* {}", title)
    } else {
        title.to_string()
    };
    grid.put_text(left + 2, top + 1, &title, palette.text, inner);
    grid.put_text(left + 2, top + 3, body, palette.dim, inner);
    if angles.is_some() && height > 4 {
        let readout = format!("rotateX {:+.1}deg  rotateY {:+.1}deg", ay, ax);
        grid.put_text(left + 2, top + height - 2, &readout, palette.dim, inner);
    }
}

/// Writes the grid, switching colours only where they change
pub fn present<W: Write>(grid: &CellGrid, out: &mut W) -> io::Result<()> {
    let rgb = |[r, g, b]: [u8; 3]| TermColor::Rgb { r, g, b };
    let mut fg = None;
    let mut bg = None;
    for row in 0..grid.rows() {
        queue!(out, cursor::MoveTo(0, row))?;
        for col in 0..grid.cols() {
            let Some(cell) = grid.get(i32::from(col), i32::from(row)) else {
                continue;
            };
            if fg != Some(cell.fg) {
                queue!(out, SetForegroundColor(rgb(cell.fg)))?;
                fg = Some(cell.fg);
            }
            if bg != Some(cell.bg) {
                queue!(out, SetBackgroundColor(rgb(cell.bg)))?;
                bg = Some(cell.bg);
            }
            queue!(out, Print(cell.ch))?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Color, Surface};

    #[test]
    fn test_half_block_sampling() {
        let mut raster = Raster::new(2, 2);
        raster.set_fill_style(Color::rgba(255, 0, 0, 1.0));
        raster.fill_rect(0.0, 0.0, 2.0, 1.0);
        let grid = CellGrid::from_raster(&raster, 2, 1);
        let cell = grid.get(0, 0).copied();
        assert_eq!(
            cell,
            Some(Cell { ch: '▀', fg: [255, 0, 0], bg: [0, 0, 0] })
        );
        assert!(grid.get(2, 0).is_none());
    }

    #[test]
    fn test_present_skips_repeated_colours() {
        let raster = Raster::new(3, 2);
        let grid = CellGrid::from_raster(&raster, 3, 1);
        let mut out = Vec::new();
        present(&grid, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('▀').count(), 3);
        // One foreground and one background change for a uniform row
        assert_eq!(text.matches("38;2;").count(), 1);
        assert_eq!(text.matches("48;2;").count(), 1);
    }

    #[test]
    fn test_shading_helpers() {
        assert_eq!(mix([0, 0, 0], [200, 100, 50], 0.5), [100, 50, 25]);
        assert_eq!(shade([100, 100, 100], 0.0), [100, 100, 100]);
        assert_eq!(shade([100, 100, 100], -1.0), [0, 0, 0]);
        assert_eq!(shade([100, 100, 100], 1.0), [255, 255, 255]);
        assert_eq!(border_char(0, 0, 4, 3, false), Some('╭'));
        assert_eq!(border_char(3, 2, 4, 3, true), Some('╝'));
        assert_eq!(border_char(1, 1, 4, 3, false), None);
    }
}
