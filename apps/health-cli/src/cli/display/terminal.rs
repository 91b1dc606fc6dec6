//! Styled terminal lines on top of crossterm.

use std::io::{stdout, Result as IoResult, Write};

use crossterm::{
    execute,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
};

/// Width of the action column in terminal output
pub const ACTION_WIDTH: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    text: String,
    foreground: Option<Color>,
    background: Option<Color>,
    bold: bool,
}

impl StyledText {
    pub fn from_str(text: &str) -> Self {
        Self {
            text: text.to_string(),
            foreground: None,
            background: None,
            bold: false,
        }
    }

    pub fn cyan(mut self) -> Self {
        self.foreground = Some(Color::Cyan);
        self
    }

    pub fn green(mut self) -> Self {
        self.foreground = Some(Color::Green);
        self
    }

    pub fn yellow(mut self) -> Self {
        self.foreground = Some(Color::Yellow);
        self
    }

    pub fn red(mut self) -> Self {
        self.foreground = Some(Color::Red);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn on_green(mut self) -> Self {
        self.background = Some(Color::Green);
        self
    }
}

/// Writes `[action right-aligned to ACTION_WIDTH] message`. Longer actions are cut.
fn write_styled_line_to<W: Write>(
    writer: &mut W,
    styled_text: &StyledText,
    message: &str,
    no_ansi: bool,
) -> IoResult<()> {
    let action: String = styled_text.text.chars().take(ACTION_WIDTH).collect();
    let padded_action = format!("{action:>ACTION_WIDTH$}");

    if !no_ansi {
        if let Some(color) = styled_text.foreground {
            execute!(writer, SetForegroundColor(color))?;
        }
        if let Some(color) = styled_text.background {
            execute!(writer, SetBackgroundColor(color))?;
        }
        if styled_text.bold {
            execute!(writer, SetAttribute(Attribute::Bold))?;
        }
    }

    execute!(writer, Print(&padded_action))?;

    if !no_ansi {
        execute!(writer, ResetColor)?;
        if styled_text.bold {
            execute!(writer, SetAttribute(Attribute::Reset))?;
        }
    }

    execute!(writer, Print(" "), Print(message), Print("\n"))?;
    Ok(())
}

pub fn write_styled_line(styled_text: &StyledText, message: &str, no_ansi: bool) -> IoResult<()> {
    write_styled_line_to(&mut stdout(), styled_text, message, no_ansi)
}
