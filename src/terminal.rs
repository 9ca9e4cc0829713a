use crate::bootstrap::{self, size_surface};
use crate::config::{Args, FieldConfig, TiltConfig};
use crate::error::Result;
use crate::field::ParticleField;
use crate::graphics::Raster;
use crate::hue::{initial_hue, HueCycler};
use crate::math::hsl_to_rgb;
use crate::page::{Document, ElementId, Rect};
use crate::reveal::{RevealObserver, REVEAL_CLASS, VISIBLE_CLASS};
use crate::scheduler::{Clock, FrameContext, FrameScheduler, SystemClock};
use crate::screen::{
    draw_section, mix, present, to_bytes, CardStyle, CellGrid, Palette, PANEL_OPACITY,
};
use crate::state::{SharedHue, Viewport};
use crate::storage::KeyValueStore;
use crate::theme::{current_theme, Theme, ThemeToggle};
use crate::tilt::{self, Key, PointerEvent, SharedTiltCard, ACTIVE_CLASS, TILT_CLASS};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::{cursor, execute, terminal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::io::{self, BufWriter};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Element holding the theme switch in the header
pub const THEME_TOGGLE_ID: &str = "themeToggle";

/// Page sections; the first is a plain intro, the rest are tilt cards
const SECTIONS: [(&str, &str); 6] = [
    (
        "tunnel3d",
        "Arrows or the wheel scroll. Tab focuses a card, t switches theme.",
    ),
    (
        "Particle tunnel",
        "A fixed pool of particles streams toward you and restarts at the far plane.",
    ),
    (
        "Scroll reveal",
        "A card appears once a quarter of it has been on screen, and then stays.",
    ),
    (
        "Pointer tilt",
        "Hover to lean a card toward the pointer. Enter or Space marks it.",
    ),
    (
        "Accent hue",
        "One shared hue drifts 0.4 degrees every 80 ms and tints the tunnel.",
    ),
    ("Theme", "Light or dark, remembered between sessions."),
];

const FIRST_SECTION_ROW: f64 = 2.0;
const SECTION_HEIGHT: f64 = 6.0;
const SECTION_GAP: f64 = 2.0;
const MAX_SECTION_WIDTH: f64 = 64.0;
/// Rows below the last section, footer included
const FOOTER_ROWS: f64 = 3.0;
const SCROLL_STEP: i32 = 3;

/// Raster and element tree handed to frame callbacks
pub struct Page {
    pub document: Document,
    pub raster: Raster,
}

impl FrameContext for Page {
    type Surface = Raster;

    fn surface(&mut self) -> &mut Raster {
        &mut self.raster
    }

    fn document(&mut self) -> &mut Document {
        &mut self.document
    }
}

/// Logical viewport for a terminal of `cols` x `rows` cells
pub fn viewport_for(cols: u16, rows: u16, pixel_scale: f64) -> Viewport {
    Viewport::new(
        f64::from(cols) * pixel_scale,
        f64::from(rows) * 2.0 * pixel_scale,
    )
    .with_device_pixel_ratio(1.0 / pixel_scale)
}

/// Section boxes in document rows and columns, stacked down a centred column
pub fn layout_sections(cols: u16, count: usize) -> Vec<Rect> {
    let cols = f64::from(cols);
    let width = (cols - 4.0).min(MAX_SECTION_WIDTH).max(cols.min(10.0));
    let left = ((cols - width) / 2.0).floor();
    (0..count)
        .map(|index| {
            let top = FIRST_SECTION_ROW + index as f64 * (SECTION_HEIGHT + SECTION_GAP);
            Rect::new(left, top, width, SECTION_HEIGHT)
        })
        .collect()
}

/// A page section and where it sits in the document
struct Section {
    element: ElementId,
    title: &'static str,
    body: &'static str,
    /// Document position in cells
    rect: Rect,
    /// Index into the tilt cards, for sections that tilt
    card: Option<usize>,
}

/// What the event loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// The page effects wired to a terminal-sized raster
pub struct App<R: Rng + 'static, S: KeyValueStore, K: Clock> {
    page: Page,
    scheduler: FrameScheduler<Page, K>,
    field: Rc<RefCell<ParticleField<R>>>,
    cards: Vec<SharedTiltCard>,
    sections: Vec<Section>,
    reveal: RevealObserver,
    theme: ThemeToggle<S>,
    hue: SharedHue,
    pixel_scale: f64,
    cols: u16,
    rows: u16,
    scroll: u16,
    /// Last pointer cell
    pointer: Option<(u16, u16)>,
    hovered: Option<usize>,
    pressed: Option<usize>,
    focused: Option<usize>,
    /// Show the frame rate and pool size
    debug: bool,
    frames_since_last_update: usize,
    last_fps_calculation: f64,
    fps: f64,
}

impl<R: Rng + 'static, S: KeyValueStore, K: Clock> App<R, S, K> {
    pub fn new(args: &Args, store: S, rng: R, clock: K, cols: u16, rows: u16) -> Self {
        let pixel_scale = f64::from(args.pixel_scale.max(1));
        let viewport = viewport_for(cols, rows, pixel_scale);

        // Build the page
        let mut document = Document::new();
        document.create_element(Some(THEME_TOGGLE_ID), &[]);
        let mut sections = Vec::with_capacity(SECTIONS.len());
        for (index, (&(title, body), rect)) in SECTIONS
            .iter()
            .zip(layout_sections(cols, SECTIONS.len()))
            .enumerate()
        {
            let classes: &[&str] = if index == 0 {
                &[REVEAL_CLASS]
            } else {
                &[REVEAL_CLASS, TILT_CLASS]
            };
            let element = document.create_element(None, classes);
            document.element_mut(element).set_text(title);
            sections.push(Section {
                element,
                title,
                body,
                rect,
                card: None,
            });
        }
        document.create_element(Some(bootstrap::YEAR_ELEMENT_ID), &[]);

        let mut raster = Raster::new(0, 0);
        size_surface(&mut raster, &viewport);
        let mut page = Page { document, raster };

        let theme = ThemeToggle::new(store);
        theme.apply_stored(&mut page.document);
        let hue = initial_hue(&page.document);

        let config = FieldConfig {
            max_particles: args
                .max_particles
                .unwrap_or(FieldConfig::default().max_particles),
            ..FieldConfig::default()
        };
        let mut scheduler: FrameScheduler<Page, K> = FrameScheduler::new(clock);
        let start = scheduler.clock().now();
        let field = Rc::new(RefCell::new(ParticleField::new(
            config,
            viewport,
            hue.clone(),
            rng,
            start,
        )));
        scheduler.request(Box::new(field.clone()));

        let cards = tilt::attach_all(&mut page.document, TiltConfig::default());
        for (index, card) in cards.iter().enumerate() {
            scheduler.request(Box::new(card.clone()));
            let element = card.borrow().element();
            if let Some(section) = sections.iter_mut().find(|s| s.element == element) {
                section.card = Some(index);
            }
        }
        scheduler.request(Box::new(HueCycler::new(hue.clone())));

        bootstrap::inject_year(&mut page.document, bootstrap::current_year());
        let mut reveal = RevealObserver::default();
        reveal.observe_all(&page.document);

        if args.reduced_motion {
            bootstrap::apply_reduced_motion(
                &mut field.borrow_mut(),
                &cards,
                &mut page.document,
                config.reduced_motion_cap,
            );
        }

        let mut app = App {
            page,
            scheduler,
            field,
            cards,
            sections,
            reveal,
            theme,
            hue,
            pixel_scale,
            cols,
            rows,
            scroll: 0,
            pointer: None,
            hovered: None,
            pressed: None,
            focused: None,
            debug: false,
            frames_since_last_update: 0,
            last_fps_calculation: start,
            fps: 0.0,
        };
        app.sync_theme_label();
        app.check_reveal();
        app
    }

    /// Runs every scheduled callback once
    pub fn frame(&mut self) {
        let now = self.scheduler.run_frame(&mut self.page);

        // Calculate FPS
        self.frames_since_last_update += 1;
        let elapsed = now - self.last_fps_calculation;
        if elapsed >= 1000.0 {
            self.fps = self.frames_since_last_update as f64 * 1000.0 / elapsed;
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
    }

    pub fn handle_event(&mut self, event: Event) -> Control {
        match event {
            Event::Key(key) => return self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(cols, rows) => self.resize(cols, rows),
            _ => {}
        }
        Control::Continue
    }

    fn handle_key(&mut self, key: KeyEvent) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Control::Quit
            }
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('d') => self.debug = !self.debug,
            KeyCode::Tab => self.cycle_focus(true),
            KeyCode::BackTab => self.cycle_focus(false),
            KeyCode::Enter => self.key_to_focused(Key::Enter),
            KeyCode::Char(' ') => self.key_to_focused(Key::Space),
            KeyCode::Up => self.scroll_by(-1),
            KeyCode::Down => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-i32::from(self.rows.max(1))),
            KeyCode::PageDown => self.scroll_by(i32::from(self.rows.max(1))),
            KeyCode::Home => self.scroll_by(-i32::from(u16::MAX)),
            KeyCode::End => self.scroll_by(i32::from(u16::MAX)),
            _ => self.key_to_focused(Key::Other),
        }
        Control::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (col, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.pointer_moved(col, row),
            MouseEventKind::Down(MouseButton::Left) => {
                if self.theme_button().contains(f64::from(col) + 0.5, f64::from(row) + 0.5) {
                    self.toggle_theme();
                    return;
                }
                self.pointer_moved(col, row);
                if let Some(index) = self.hovered {
                    self.send_pointer(index, PointerEvent::Down);
                    self.pressed = Some(index);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(index) = self.pressed.take() {
                    self.send_pointer(index, PointerEvent::Up);
                }
            }
            MouseEventKind::ScrollDown => {
                self.pointer = Some((col, row));
                self.scroll_by(SCROLL_STEP);
            }
            MouseEventKind::ScrollUp => {
                self.pointer = Some((col, row));
                self.scroll_by(-SCROLL_STEP);
            }
            _ => {}
        }
    }

    fn toggle_theme(&mut self) {
        let theme = self.theme.toggle(&mut self.page.document);
        self.sync_theme_label();
        log::info!("theme switched to {}", theme);
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let viewport = viewport_for(cols, rows, self.pixel_scale);
        self.field.borrow_mut().resize(viewport);
        size_surface(&mut self.page.raster, &viewport);
        for (section, rect) in self
            .sections
            .iter_mut()
            .zip(layout_sections(cols, SECTIONS.len()))
        {
            section.rect = rect;
        }
        self.scroll = self.scroll.min(self.max_scroll());
        self.check_reveal();
    }

    /// Document height in rows
    fn content_rows(&self) -> u16 {
        self.sections
            .last()
            .map_or(0.0, |section| section.rect.bottom() + FOOTER_ROWS) as u16
    }

    fn max_scroll(&self) -> u16 {
        self.content_rows().saturating_sub(self.rows)
    }

    fn scroll_by(&mut self, delta: i32) {
        let target = (i32::from(self.scroll) + delta).clamp(0, i32::from(self.max_scroll()));
        if target as u16 == self.scroll {
            return;
        }
        self.scroll = target as u16;
        self.check_reveal();
        // Content moved under a pointer that stayed put
        if let Some((col, row)) = self.pointer {
            self.pointer_moved(col, row);
        }
    }

    fn check_reveal(&mut self) {
        let viewport = Rect::new(0.0, 0.0, f64::from(self.cols), f64::from(self.rows));
        let layout: Vec<(ElementId, Rect)> = self
            .sections
            .iter()
            .map(|section| (section.element, self.screen_rect(section)))
            .collect();
        self.reveal
            .check_layout(&mut self.page.document, &layout, &viewport);
    }

    /// Section box in screen cells
    fn screen_rect(&self, section: &Section) -> Rect {
        section.rect.offset(0.0, -f64::from(self.scroll))
    }

    /// Section box in logical pixels, the units tilt cards see
    fn client_rect(&self, section: &Section) -> Rect {
        let rect = self.screen_rect(section);
        let (cw, ch) = (self.pixel_scale, self.pixel_scale * 2.0);
        Rect::new(rect.left * cw, rect.top * ch, rect.width * cw, rect.height * ch)
    }

    fn section_for_card(&self, index: usize) -> Option<&Section> {
        self.sections.iter().find(|s| s.card == Some(index))
    }

    fn is_visible(&self, section: &Section) -> bool {
        self.page
            .document
            .element(section.element)
            .has_class(VISIBLE_CLASS)
    }

    /// Revealed card under a screen cell
    fn card_at(&self, col: u16, row: u16) -> Option<usize> {
        let (x, y) = (f64::from(col) + 0.5, f64::from(row) + 0.5);
        self.sections
            .iter()
            .filter(|section| self.is_visible(section))
            .find(|section| self.screen_rect(section).contains(x, y))
            .and_then(|section| section.card)
    }

    fn pointer_moved(&mut self, col: u16, row: u16) {
        self.pointer = Some((col, row));
        let hit = self.card_at(col, row);
        if hit != self.hovered {
            if let Some(previous) = self.hovered {
                self.send_pointer(previous, PointerEvent::Leave);
            }
            self.hovered = hit;
        }
        if let Some(index) = hit {
            let client_x = (f64::from(col) + 0.5) * self.pixel_scale;
            let client_y = (f64::from(row) + 0.5) * self.pixel_scale * 2.0;
            self.send_pointer(index, PointerEvent::Move { client_x, client_y });
        }
    }

    fn send_pointer(&mut self, index: usize, event: PointerEvent) {
        let Some(rect) = self.section_for_card(index).map(|s| self.client_rect(s)) else {
            return;
        };
        self.cards[index]
            .borrow_mut()
            .on_pointer(event, &rect, &mut self.page.document);
    }

    fn cycle_focus(&mut self, forward: bool) {
        let visible: Vec<usize> = self
            .sections
            .iter()
            .filter(|section| self.is_visible(section))
            .filter_map(|section| section.card)
            .collect();
        if visible.is_empty() {
            self.focused = None;
            return;
        }
        let position = self
            .focused
            .and_then(|focused| visible.iter().position(|&index| index == focused));
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => visible.len() - 1,
            (Some(at), true) => (at + 1) % visible.len(),
            (Some(at), false) => (at + visible.len() - 1) % visible.len(),
        };
        self.focused = Some(visible[next]);
    }

    fn key_to_focused(&mut self, key: Key) {
        if let Some(index) = self.focused {
            self.cards[index]
                .borrow_mut()
                .on_key(key, &mut self.page.document);
        }
    }

    /// Rewrites the switch label after the theme changes
    fn sync_theme_label(&mut self) {
        let theme = current_theme(&self.page.document).unwrap_or(Theme::Dark);
        if let Some(id) = self.page.document.get_element_by_id(THEME_TOGGLE_ID) {
            self.page
                .document
                .element_mut(id)
                .set_text(format!("[t] {} theme", theme));
        }
    }

    fn theme_label(&self) -> &str {
        let document = &self.page.document;
        document
            .get_element_by_id(THEME_TOGGLE_ID)
            .map_or("", |id| document.element(id).text())
    }

    /// Header cells that act as the theme switch
    fn theme_button(&self) -> Rect {
        let width = self.theme_label().chars().count() as f64;
        Rect::new(f64::from(self.cols) - width - 1.0, 0.0, width, 1.0)
    }

    /// Composes the tunnel, the revealed sections and the chrome
    pub fn compose(&self) -> CellGrid {
        let mut grid = CellGrid::from_raster(&self.page.raster, self.cols, self.rows);
        let palette = Palette::for_theme(current_theme(&self.page.document));
        let accent = to_bytes(hsl_to_rgb(self.hue.get(), 90.0, 60.0));

        for section in &self.sections {
            if !self.is_visible(section) {
                continue;
            }
            let element = self.page.document.element(section.element);
            let angles = section
                .card
                .map(|index| self.cards[index].borrow().angles());
            let style = CardStyle {
                active: element.has_class(ACTIVE_CLASS),
                focused: section.card.is_some() && section.card == self.focused,
            };
            draw_section(
                &mut grid,
                &self.screen_rect(section),
                (section.title, section.body),
                angles,
                style,
                &palette,
                accent,
            );
        }

        // Footer
        let footer_row = self.content_rows() as i32 - 2 - i32::from(self.scroll);
        let year = self
            .page
            .document
            .get_element_by_id(bootstrap::YEAR_ELEMENT_ID)
            .map(|id| self.page.document.element(id).text().to_string())
            .unwrap_or_default();
        let footer = format!("© {} tunnel3d", year);
        let footer_col = (i32::from(self.cols) - footer.chars().count() as i32) / 2;
        grid.put_text(footer_col, footer_row, &footer, palette.dim, usize::MAX);

        // Header
        for col in 0..i32::from(self.cols) {
            if let Some(cell) = grid.get_mut(col, 0) {
                cell.bg = mix(mix(cell.fg, cell.bg, 0.5), palette.panel, PANEL_OPACITY);
                cell.ch = ' ';
            }
        }
        grid.put_text(1, 0, "tunnel3d", accent, usize::MAX);
        let button = self.theme_button();
        grid.put_text(
            button.left as i32,
            0,
            self.theme_label(),
            palette.text,
            usize::MAX,
        );
        if self.debug {
            let status = format!(
                "FPS: {:.2}  particles: {}",
                self.fps,
                self.field.borrow().len()
            );
            grid.put_text(12, 0, &status, palette.dim, usize::MAX);
        }
        grid
    }
}

/// Terminal size in cells, falling back to 80x24 when it cannot be read
pub fn measure_terminal() -> (u16, u16) {
    termsize::get()
        .map(|size| (size.cols, size.rows))
        .filter(|&(cols, rows)| cols > 0 && rows > 0)
        .or_else(|| terminal::size().ok())
        .unwrap_or((80, 24))
}

/// Raw mode and the alternate screen, restored on drop
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            cursor::Show,
            event::DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Runs the page until the user quits
pub fn run<S: KeyValueStore>(args: &Args, store: S) -> Result<()> {
    let (cols, rows) = measure_terminal();
    log::info!("terminal {}x{} cells", cols, rows);
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut app = App::new(args, store, rng, SystemClock::new(), cols, rows);

    log::debug!("{} frame callbacks scheduled", app.scheduler.pending());

    let _guard = TerminalGuard::enter()?;
    let mut out = BufWriter::new(io::stdout());
    let interval = Duration::from_millis(args.frame_interval_ms());
    let mut next_frame = Instant::now();
    loop {
        let timeout = next_frame.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            if app.handle_event(event::read()?) == Control::Quit {
                break;
            }
            // Drain pending input, but never past a due frame
            if Instant::now() < next_frame {
                continue;
            }
        }
        app.frame();
        present(&app.compose(), &mut out)?;
        next_frame = Instant::now() + interval;
    }
    log::info!("quit after {} frames", app.scheduler.frames());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hue::ACCENT_HUE_PROPERTY;
    use crate::scheduler::testing::ManualClock;
    use crate::storage::MemoryStore;
    use crate::theme::THEME_KEY;
    use clap::Parser;

    type TestApp = App<StdRng, MemoryStore, ManualClock>;

    fn app_with(args: &[&str], store: MemoryStore) -> (TestApp, ManualClock) {
        let args = Args::parse_from(args);
        let clock = ManualClock::default();
        let app = App::new(
            &args,
            store,
            StdRng::seed_from_u64(3),
            clock.clone(),
            80,
            24,
        );
        (app, clock)
    }

    fn app() -> (TestApp, ManualClock) {
        app_with(&["tunnel3d"], MemoryStore::default())
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn visible(app: &TestApp) -> Vec<bool> {
        app.sections.iter().map(|s| app.is_visible(s)).collect()
    }

    #[test]
    fn test_viewport_maps_cells_to_half_blocks() {
        let viewport = viewport_for(80, 24, 8.0);
        assert_eq!((viewport.width, viewport.height), (640.0, 384.0));
        assert_eq!(bootstrap::surface_size(&viewport), (80, 48));
    }

    #[test]
    fn test_layout_is_centred_and_stacked() {
        let rects = layout_sections(80, 3);
        assert_eq!(rects[0], Rect::new(8.0, 2.0, 64.0, 6.0));
        assert_eq!(rects[1].top, 10.0);
        assert_eq!(rects[2].top, 18.0);
        let narrow = layout_sections(20, 1);
        assert_eq!(narrow[0], Rect::new(2.0, 2.0, 16.0, 6.0));
    }

    #[test]
    fn test_startup_state() {
        let (app, _) = app();
        let doc = &app.page.document;
        assert_eq!(doc.root().data(THEME_KEY), Some("dark"));
        assert_eq!(app.cards.len(), SECTIONS.len() - 1);
        assert_eq!(app.scheduler.pending(), 1 + app.cards.len() + 1);
        let year = doc.get_element_by_id(bootstrap::YEAR_ELEMENT_ID).map(|id| doc.element(id).text());
        assert_eq!(year, Some(bootstrap::current_year().to_string().as_str()));
        // 640 x 384 logical pixels
        assert_eq!(app.field.borrow().len(), 273);
        assert_eq!(visible(&app), vec![true, true, true, false, false, false]);
    }

    #[test]
    fn test_stored_theme_is_applied() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "light").unwrap();
        let (app, _) = app_with(&["tunnel3d"], store);
        assert_eq!(current_theme(&app.page.document), Some(Theme::Light));
    }

    #[test]
    fn test_scrolling_reveals_remaining_sections() {
        let (mut app, _) = app();
        assert_eq!(app.max_scroll(), 27);
        app.handle_event(key(KeyCode::End));
        assert_eq!(app.scroll, 27);
        assert!(visible(&app).iter().all(|&shown| shown));

        // Scrolling back does not hide anything
        app.handle_event(key(KeyCode::Home));
        assert_eq!(app.scroll, 0);
        assert!(visible(&app).iter().all(|&shown| shown));
    }

    #[test]
    fn test_wheel_scroll_is_clamped() {
        let (mut app, _) = app();
        app.handle_event(mouse(MouseEventKind::ScrollUp, 0, 5));
        assert_eq!(app.scroll, 0);
        for _ in 0..20 {
            app.handle_event(mouse(MouseEventKind::ScrollDown, 0, 5));
        }
        assert_eq!(app.scroll, app.max_scroll());
    }

    #[test]
    fn test_theme_key_toggles_and_persists() {
        let (mut app, _) = app();
        app.handle_event(key(KeyCode::Char('t')));
        assert_eq!(current_theme(&app.page.document), Some(Theme::Light));
        assert_eq!(app.theme.store().get(THEME_KEY).as_deref(), Some("light"));
        app.handle_event(key(KeyCode::Char('t')));
        assert_eq!(current_theme(&app.page.document), Some(Theme::Dark));
    }

    #[test]
    fn test_clicking_theme_button() {
        let (mut app, _) = app();
        let button = app.theme_button();
        app.handle_event(mouse(
            MouseEventKind::Down(MouseButton::Left),
            button.left as u16,
            0,
        ));
        assert_eq!(current_theme(&app.page.document), Some(Theme::Light));
    }

    #[test]
    fn test_hover_tilts_and_leave_releases() {
        let (mut app, _) = app();
        // Top right corner region of the first card (rows 10..16, cols 8..72)
        app.handle_event(mouse(MouseEventKind::Moved, 71, 10));
        assert_eq!(app.hovered, Some(0));
        let (tx, ty) = app.cards[0].borrow().targets();
        assert!(tx > 7.0 && ty > 6.0, "targets {} {}", tx, ty);

        app.handle_event(mouse(MouseEventKind::Moved, 0, 9));
        assert_eq!(app.hovered, None);
        assert_eq!(app.cards[0].borrow().targets(), (0.0, 0.0));
    }

    #[test]
    fn test_press_and_release_set_transition() {
        let (mut app, _) = app();
        let element = app.cards[0].borrow().element();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 40, 12));
        assert_eq!(
            app.page.document.element(element).style("transition"),
            Some("transform .25s")
        );
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 0, 0));
        assert_eq!(app.page.document.element(element).style("transition"), None);
    }

    #[test]
    fn test_hidden_cards_ignore_the_pointer() {
        let (mut app, _) = app();
        app.scroll = 10;
        // Section 3 now spans screen rows 16..22 but has not been revealed yet
        app.pointer_moved(40, 18);
        assert_eq!(app.hovered, None);
    }

    #[test]
    fn test_tab_focus_and_enter_toggle_active() {
        let (mut app, _) = app();
        app.handle_event(key(KeyCode::Enter));
        assert!(app.page.document.elements_with_class(ACTIVE_CLASS).is_empty());

        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.focused, Some(0));
        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.focused, Some(1));
        // Only two cards are revealed, so focus wraps
        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.focused, Some(0));
        app.handle_event(key(KeyCode::BackTab));
        assert_eq!(app.focused, Some(1));

        app.handle_event(key(KeyCode::Char(' ')));
        let element = app.cards[1].borrow().element();
        assert!(app.page.document.element(element).has_class(ACTIVE_CLASS));
        app.handle_event(key(KeyCode::Enter));
        assert!(!app.page.document.element(element).has_class(ACTIVE_CLASS));
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = app();
        assert_eq!(app.handle_event(key(KeyCode::Char('x'))), Control::Continue);
        assert_eq!(app.handle_event(key(KeyCode::Char('q'))), Control::Quit);
        assert_eq!(app.handle_event(key(KeyCode::Esc)), Control::Quit);
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.handle_event(ctrl_c), Control::Quit);
    }

    #[test]
    fn test_frames_advance_hue_and_tilt() {
        let (mut app, clock) = app();
        app.handle_event(mouse(MouseEventKind::Moved, 71, 10));
        // 1120 ms: eleven hue steps and one frame-rate sample
        for _ in 0..70 {
            clock.advance(16.0);
            app.frame();
        }
        let doc = &app.page.document;
        assert_eq!(doc.root().style(ACCENT_HUE_PROPERTY), Some("264.4"));
        assert!((app.hue.get() - 264.4).abs() < 1e-9);
        assert!(app.cards[0].borrow().angles().0 > 7.0);
        assert!(app.fps > 0.0);
    }

    #[test]
    fn test_reduced_motion_flag() {
        let args = ["tunnel3d", "--reduced-motion", "--pixel-scale", "10"];
        let (app, _) = app_with(&args, MemoryStore::default());
        // 800 x 480 logical pixels would hold 426 particles
        assert_eq!(app.field.borrow().len(), 400);
        let element = app.cards[0].borrow().element();
        assert_eq!(app.page.document.element(element).style("transition"), Some("none"));
    }

    #[test]
    fn test_resize_updates_field_and_raster() {
        let (mut app, _) = app();
        app.handle_event(key(KeyCode::End));
        app.handle_event(Event::Resize(120, 40));
        assert_eq!((app.page.raster.width(), app.page.raster.height()), (120, 80));
        let viewport = app.field.borrow().viewport();
        assert_eq!((viewport.width, viewport.height), (960.0, 640.0));
        assert_eq!(app.scroll, app.max_scroll());
        assert_eq!(app.sections[0].rect.left, 28.0);
    }

    #[test]
    fn test_compose_draws_chrome_and_revealed_cards() {
        let (mut app, clock) = app();
        clock.advance(16.0);
        app.frame();
        let grid = app.compose();
        assert_eq!((grid.cols(), grid.rows()), (80, 24));

        let header = grid.row_text(0);
        assert!(header.contains("tunnel3d"));
        assert!(header.contains("[t] dark theme"));

        // First card border and title
        let card_top = grid.row_text(10);
        assert_eq!(card_top.chars().nth(8), Some('╭'));
        assert!(grid.row_text(11).contains("Particle tunnel"));
        assert!(grid.row_text(14).contains("rotateX"));

        // Below the revealed sections the tunnel shows through
        assert_eq!(grid.get(8, 23).map(|cell| cell.ch), Some('╰'));
        assert_eq!(grid.get(40, 23).map(|cell| cell.ch), Some('─'));
        assert!(grid.row_text(1).chars().all(|ch| ch == '▀'));
    }

    #[test]
    fn test_active_card_uses_double_border() {
        let (mut app, _) = app();
        app.handle_event(key(KeyCode::Tab));
        app.handle_event(key(KeyCode::Enter));
        let grid = app.compose();
        assert_eq!(grid.get(8, 10).map(|cell| cell.ch), Some('╔'));
        assert!(grid.row_text(11).contains("* Particle tunnel"));
    }

    #[test]
    fn test_debug_status_line() {
        let (mut app, _) = app();
        assert!(!app.compose().row_text(0).contains("FPS"));
        app.handle_event(key(KeyCode::Char('d')));
        assert!(app.compose().row_text(0).contains("particles: 273"));
    }
}
