//! Screen drawing.
//!
//! Layout, top to bottom: the status bar, the body for the current mode,
//! and the prompt line. Every frame is drawn in full.

use std::io::{self, Write};

use azyon_core::{Editor, FileBrowser, Mode, SAVE_PROMPT, Session};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};

/// Shown under the splash text.
const INSTRUCTIONS: &str = "Press ENTER to open the file browser, CTRL+Q to quit";

/// Left padding of browser entries.
const BROWSER_MARGIN: &str = "  ";

/// Draws the editor state to a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    highlight_digits: bool,
}

impl Renderer {
    pub fn new(highlight_digits: bool) -> Self {
        Self { highlight_digits }
    }

    /// Draws one frame for a terminal of `(width, height)` cells.
    pub fn draw<W: Write>(&self, out: &mut W, editor: &Editor, (width, height): (u16, u16)) -> io::Result<()> {
        queue!(out, Hide, Clear(ClearType::All), MoveTo(0, 0))?;

        let line = status_line(editor, usize::from(width));
        queue!(
            out,
            SetAttribute(Attribute::Reverse),
            Print(line),
            SetAttribute(Attribute::Reset)
        )?;

        match editor.mode() {
            Mode::Welcome { .. } => draw_welcome(out, editor.splash().unwrap_or_default(), width, height)?,
            Mode::FileBrowser(browser) => draw_browser(out, browser, width, height)?,
            Mode::Editing { confirm_save } => {
                self.draw_document(out, editor.session(), width, height)?;
                if *confirm_save {
                    let prompt = truncate(SAVE_PROMPT, usize::from(width));
                    let column = u16::try_from(prompt.len()).unwrap_or(width);
                    let row = height.saturating_sub(1);
                    queue!(out, MoveTo(0, row), Print(prompt), MoveTo(column, row), Show)?;
                } else {
                    let session = editor.session();
                    let cursor = session.cursor();
                    let row = cursor.row.saturating_sub(session.viewport().offset()) + 1;
                    queue!(out, MoveTo(to_cell(cursor.column), to_cell(row)), Show)?;
                }
            }
        }

        out.flush()
    }

    fn draw_document<W: Write>(&self, out: &mut W, session: &Session, width: u16, height: u16) -> io::Result<()> {
        let document = session.document();
        let rows = session.viewport().visible_range();
        let last_screen_row = height.saturating_sub(1).max(1);

        for (screen_row, row) in (1..last_screen_row).zip(rows) {
            queue!(out, MoveTo(0, screen_row))?;
            match document.line(row) {
                Some(line) => {
                    let visible = &line[..line.len().min(usize::from(width))];
                    self.draw_line(out, visible)?;
                }
                None => queue!(out, Print('~'))?,
            }
        }
        Ok(())
    }

    /// One cell per byte. Digit runs are colored when highlighting is on.
    fn draw_line<W: Write>(&self, out: &mut W, line: &[u8]) -> io::Result<()> {
        if !self.highlight_digits {
            return queue!(out, Print(cells(line)));
        }

        for run in line.chunk_by(|a, b| a.is_ascii_digit() == b.is_ascii_digit()) {
            if run[0].is_ascii_digit() {
                queue!(out, SetForegroundColor(Color::Yellow), Print(cells(run)), ResetColor)?;
            } else {
                queue!(out, Print(cells(run)))?;
            }
        }
        Ok(())
    }
}

/// The status bar text, padded or cut to `width` columns.
pub fn status_line(editor: &Editor, width: usize) -> String {
    let session = editor.session();
    let title = session
        .file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "Welcome!".to_string());

    let mut line = format!(" Azyon - {} {}", title, session.cursor());
    if let Some(message) = editor.status_text() {
        line.push_str(" | ");
        line.push_str(message.lines().next().unwrap_or_default());
    }

    let mut line = truncate(&line, width).to_string();
    let filled = line.chars().count();
    line.extend(std::iter::repeat_n(' ', width.saturating_sub(filled)));
    line
}

/// The welcome screen only shows while there is a splash, so it is never
/// drawn empty.
fn draw_welcome<W: Write>(out: &mut W, splash: &str, width: u16, height: u16) -> io::Result<()> {
    let mut lines: Vec<&str> = splash.lines().collect();
    lines.push("");
    lines.push(INSTRUCTIONS);

    let body_rows = usize::from(height.saturating_sub(2));
    let top = 1 + body_rows.saturating_sub(lines.len()) / 2;
    for (i, line) in lines.into_iter().take(body_rows).enumerate() {
        let line = truncate(line, usize::from(width));
        let padding = usize::from(width).saturating_sub(line.chars().count()) / 2;
        queue!(out, MoveTo(to_cell(padding), to_cell(top + i)), Print(line))?;
    }
    Ok(())
}

fn draw_browser<W: Write>(out: &mut W, browser: &FileBrowser, width: u16, height: u16) -> io::Result<()> {
    let rows = usize::from(height.saturating_sub(2)).max(1);
    let selected = browser.selected();
    let first = selected.saturating_sub(rows - 1);

    for (i, entry) in browser.entries().iter().enumerate().skip(first).take(rows) {
        let marker = if entry.is_dir { "▸ " } else { "  " };
        let name = if entry.is_dir && !entry.is_parent() {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let text = format!("{BROWSER_MARGIN}{marker}{name}");
        let text = truncate(&text, usize::from(width));

        queue!(out, MoveTo(0, to_cell(1 + i - first)))?;
        if i == selected {
            queue!(out, SetAttribute(Attribute::Reverse), Print(text), SetAttribute(Attribute::Reset))?;
        } else {
            queue!(out, Print(text))?;
        }
    }
    Ok(())
}

/// Printable ASCII as is; every other byte is one `?` cell so columns stay
/// byte-aligned.
fn cells(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..0x7f).contains(&b) { char::from(b) } else { '?' })
        .collect()
}

fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn to_cell(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
