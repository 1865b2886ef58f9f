/// Terminal front end for the Chroma3D model preview
use chroma3d_core::material::PRESETS;
use chroma3d_core::quote::quote_message;
use chroma3d_core::{Guides, InMemoryReferences, Preset, PreviewSession, PreviewState, UploadedAsset};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Radians per arrow key press
const NUDGE: f32 = 0.15;

/// Read a model file from disk as an upload
pub fn read_asset(path: &Path) -> io::Result<UploadedAsset> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedAsset::new(file_name, bytes))
}

/// Preset after `current` in catalog order, wrapping around
pub fn next_preset(current: &Preset) -> &'static Preset {
    let index = PRESETS
        .iter()
        .position(|preset| preset.key == current.key)
        .map_or(0, |i| (i + 1) % PRESETS.len());
    &PRESETS[index]
}

/// Render one frame of `session` as text
pub fn snapshot(session: &mut PreviewSession<InMemoryReferences>, cols: usize, rows: usize) -> String {
    let mut renderer = AsciiRenderer::new(cols, rows);
    let (width, height) = renderer.viewport();
    session.resize(width, height);
    for _ in 0..120 {
        if !session.frame(1.0 / 30.0) {
            break;
        }
    }
    renderer.render(session);
    renderer.to_text()
}

/// Main application struct for the interactive preview
pub struct TerminalApp {
    session: PreviewSession<InMemoryReferences>,
    source: Option<PathBuf>,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(session: PreviewSession<InMemoryReferences>) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let mut app = Self {
            session,
            source: None,
            renderer: AsciiRenderer::new(cols as usize, rows.saturating_sub(2) as usize),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };
        app.fit_to_terminal(cols, rows);
        Ok(app)
    }

    pub fn session(&self) -> &PreviewSession<InMemoryReferences> {
        &self.session
    }

    /// Load a file; parse errors end up in the status line, not here
    pub fn open(&mut self, path: &Path) -> io::Result<()> {
        let asset = read_asset(path)?;
        self.source = Some(path.to_path_buf());
        if let Err(e) = self.session.select_and_load(asset) {
            log::warn!("{}", e);
        }
        Ok(())
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target
        let mut previous = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_input(event::read()?)?;
            }

            // Update
            let dt = (frame_start - previous).as_secs_f32();
            previous = frame_start;
            self.session.frame(dt);

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code)?,
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => {
                // one cell row covers two framebuffer rows
                let (x, y) = (column as f32, row.saturating_sub(1) as f32 * 2.0);
                match kind {
                    MouseEventKind::Down(MouseButton::Left) => self.session.pointer_down(x, y),
                    MouseEventKind::Drag(MouseButton::Left) => self.session.pointer_move(x, y),
                    MouseEventKind::Up(MouseButton::Left) => self.session.pointer_up(),
                    MouseEventKind::ScrollUp => self.session.wheel(-1.0),
                    MouseEventKind::ScrollDown => self.session.wheel(1.0),
                    _ => {}
                }
            }
            Event::Resize(cols, rows) => self.fit_to_terminal(cols, rows),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> io::Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Up => self.session.nudge(0.0, NUDGE),
            KeyCode::Down => self.session.nudge(0.0, -NUDGE),
            KeyCode::Left => self.session.nudge(NUDGE, 0.0),
            KeyCode::Right => self.session.nudge(-NUDGE, 0.0),
            KeyCode::Tab => {
                let next = next_preset(self.session.preset());
                self.set_preset(next.key);
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(preset) = PRESETS.get(index) {
                    self.set_preset(preset.key);
                }
            }
            KeyCode::Char('g') => {
                let shown = self.session.config().guides.grid.enabled;
                self.session.set_guides(if shown {
                    Guides::hidden()
                } else {
                    Guides::default()
                });
            }
            KeyCode::Char('r') => {
                if let Some(path) = self.source.clone() {
                    self.open(&path)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn set_preset(&mut self, key: &str) {
        if let Err(e) = self.session.set_preset(key) {
            log::warn!("{}", e);
        }
    }

    fn fit_to_terminal(&mut self, cols: u16, rows: u16) {
        // top and bottom lines are reserved for the overlay
        self.renderer
            .resize(cols as usize, rows.saturating_sub(2) as usize);
        let (width, height) = self.renderer.viewport();
        self.session.resize(width, height);
    }

    fn footer(&self) -> String {
        if let Some(notice) = self.session.notice() {
            return notice.to_string();
        }
        match self.session.state() {
            PreviewState::Ready { file_name, .. } => {
                let message = quote_message(file_name, self.session.preset());
                let contact = &self.session.config().contact;
                format!("Quote: {}", contact.mailto_link(Some(message.as_str())))
            }
            _ => "Drag=Orbit Arrows=Nudge Tab/1-9=Preset G=Grid R=Reload Q=Quit".to_string(),
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.render(&self.session);

        // Output to terminal
        let mut stdout = stdout();
        let (cols, _) = terminal::size()?;
        let clip = |text: String| text.chars().take(cols as usize).collect::<String>();

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(clip(format!(
                "{} | FPS: {:.1}",
                self.session.status_line(),
                self.fps
            ))),
            ResetColor,
            cursor::MoveTo(0, 1)
        )?;

        self.renderer.draw(&mut stdout)?;

        let color = if self.session.notice().is_some() {
            Color::Red
        } else {
            Color::DarkGrey
        };
        queue!(
            stdout,
            Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(clip(self.footer())),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma3d_core::material::default_preset;

    #[test]
    fn test_preset_cycle_wraps() {
        let last = &PRESETS[PRESETS.len() - 1];
        assert_eq!(next_preset(last).key, PRESETS[0].key);
        assert_ne!(next_preset(default_preset()).key, default_preset().key);
    }

    #[test]
    fn test_read_asset_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Part.OBJ");
        std::fs::write(&path, "v 0 0 0\n").unwrap();

        let asset = read_asset(&path).unwrap();
        assert_eq!(asset.file_name, "Part.OBJ");
        assert_eq!(&asset.bytes[..], b"v 0 0 0\n");
    }
}
