/// ASCII output for terminal rendering
use chroma3d_core::{Framebuffer, InMemoryReferences, PreviewSession, RenderStats};
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Drawn where the contact shadow darkens the floor
const SHADOW_CHAR: char = '.';

/// Drawn for grid lines and the axis gizmo
const GUIDE_CHAR: char = '+';

/// Renders a preview session into character cells.
///
/// Terminal cells are roughly twice as tall as they are wide, so the
/// framebuffer has two pixel rows per cell row.
pub struct AsciiRenderer {
    cols: usize,
    rows: usize,
    framebuffer: Framebuffer,
    cells: Vec<(char, Color)>,
}

impl AsciiRenderer {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            framebuffer: Framebuffer::new(cols, rows * 2),
            cells: vec![(' ', Color::Reset); cols * rows],
        }
    }

    /// Pixel size the session should render at for this grid
    pub fn viewport(&self) -> (u32, u32) {
        (self.cols as u32, (self.rows * 2) as u32)
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        *self = Self::new(cols, rows);
    }

    pub fn render(&mut self, session: &PreviewSession<InMemoryReferences>) -> RenderStats {
        let stats = session.render(&mut self.framebuffer);
        let background = session.config().lighting.background;
        let background = [background.r, background.g, background.b];

        for row in 0..self.rows {
            for col in 0..self.cols {
                let upper = (col, row * 2);
                let lower = (col, row * 2 + 1);
                let covered = [upper, lower]
                    .iter()
                    .filter(|(x, y)| self.framebuffer.is_covered(*x, *y))
                    .count();

                let cell = if covered > 0 {
                    let [r, g, b] = average(&self.framebuffer, upper, lower);
                    (ramp_char(r, g, b), Color::Rgb { r, g, b })
                } else {
                    let [upper, lower] = [upper, lower].map(|(x, y)| rgb(&self.framebuffer, x, y));
                    let (light, dark) = if brightness(upper) >= brightness(lower) {
                        (upper, lower)
                    } else {
                        (lower, upper)
                    };
                    if brightness(light) > brightness(background) {
                        let [r, g, b] = light;
                        (GUIDE_CHAR, Color::Rgb { r, g, b })
                    } else if brightness(dark) < brightness(background) {
                        (SHADOW_CHAR, Color::DarkGrey)
                    } else {
                        (' ', Color::Reset)
                    }
                };
                self.cells[row * self.cols + col] = cell;
            }
        }
        stats
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.cols.max(1)) {
            for &(c, color) in row {
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    /// The current frame as plain text, one line per row
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in self.cells.chunks(self.cols.max(1)) {
            let line: String = row.iter().map(|(c, _)| *c).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

fn average(framebuffer: &Framebuffer, a: (usize, usize), b: (usize, usize)) -> [u8; 3] {
    let [ar, ag, ab, _] = framebuffer.pixel(a.0, a.1);
    let [br, bg, bb, _] = framebuffer.pixel(b.0, b.1);
    let mix = |x: u8, y: u8| ((x as u16 + y as u16) / 2) as u8;
    [mix(ar, br), mix(ag, bg), mix(ab, bb)]
}

fn rgb(framebuffer: &Framebuffer, x: usize, y: usize) -> [u8; 3] {
    let [r, g, b, _] = framebuffer.pixel(x, y);
    [r, g, b]
}

/// Guides draw brighter than the background, the shadow darker
fn brightness([r, g, b]: [u8; 3]) -> u16 {
    r as u16 + g as u16 + b as u16
}

fn ramp_char(r: u8, g: u8, b: u8) -> char {
    let luma = (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0;
    // covered cells never use the blank
    let index = 1 + (luma * (LUMINOSITY_RAMP.len() - 2) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}
