use std::io::{Stdout, Write, stdout};

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use gc_core::frame::AsciiFrame;

/// Surface de présentation terminal.
///
/// Entre en écran alternatif + raw mode à la construction, restaure
/// TOUJOURS le terminal au drop (même en cas d'erreur en amont).
pub struct TermSurface {
    out: Stdout,
    color_enabled: bool,
    /// Scratch line pour le rendu monochrome, réutilisée chaque frame.
    line: String,
}

impl TermSurface {
    /// Bascule le terminal en mode rendu.
    ///
    /// # Errors
    /// Retourne une erreur si le terminal refuse le raw mode.
    pub fn new(color_enabled: bool) -> Result<Self> {
        let mut out = stdout();
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(Self {
            out,
            color_enabled,
            line: String::new(),
        })
    }

    /// Dessine la grille complète, un flush unique par frame.
    ///
    /// En couleur, les `SetForegroundColor` consécutifs identiques sont
    /// dédupliqués pour limiter le volume d'escape sequences.
    ///
    /// # Errors
    /// Retourne une erreur I/O si l'écriture vers stdout échoue.
    pub fn present(&mut self, frame: &AsciiFrame) -> Result<()> {
        if self.color_enabled {
            self.present_color(frame)?;
        } else {
            self.present_mono(frame)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn present_color(&mut self, frame: &AsciiFrame) -> Result<()> {
        for row in 0..frame.rows {
            queue!(self.out, MoveTo(0, row as u16))?;
            let mut last: Option<Color> = None;
            for cell in frame.row(row) {
                let color = Color::Rgb {
                    r: cell.r,
                    g: cell.g,
                    b: cell.b,
                };
                if last != Some(color) {
                    queue!(self.out, SetForegroundColor(color))?;
                    last = Some(color);
                }
                queue!(self.out, Print(cell.glyph))?;
            }
        }
        queue!(self.out, ResetColor)?;
        Ok(())
    }

    fn present_mono(&mut self, frame: &AsciiFrame) -> Result<()> {
        for row in 0..frame.rows {
            self.line.clear();
            self.line.extend(frame.row(row).iter().map(|c| c.glyph));
            queue!(self.out, MoveTo(0, row as u16), Print(&self.line))?;
        }
        Ok(())
    }
}

impl Drop for TermSurface {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}
