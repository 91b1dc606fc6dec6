//! Operator-facing output: one styled line per message, the action right-aligned in
//! a fixed-width column.

pub mod terminal;

use std::fmt;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use terminal::{write_styled_line, StyledText};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Highlight,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub action: String,
    pub details: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.details)
    }
}

fn styled_action(message_type: MessageType, action: &str) -> StyledText {
    let text = StyledText::from_str(action);
    match message_type {
        MessageType::Info => text.cyan().bold(),
        MessageType::Success => text.green().bold(),
        MessageType::Highlight => text.on_green().bold(),
        MessageType::Warning => text.yellow().bold(),
        MessageType::Error => text.red().bold(),
    }
}

pub fn show_message_wrapper(message_type: MessageType, message: Message) {
    let styled = styled_action(message_type, &message.action);
    let no_ansi = std::env::var_os("NO_COLOR").is_some();
    if let Err(e) = write_styled_line(&styled, &message.details, no_ansi) {
        eprintln!("{message}: {e}");
    }
}

macro_rules! show_message {
    ($message_type:expr, $message:expr) => {
        $crate::cli::display::show_message_wrapper($message_type, $message)
    };
}

pub fn new_table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<comfy_table::Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
