//! # Routines
//!
//! A routine is a function run by one CLI command. It returns a [`RoutineSuccess`] whose
//! message is shown to the operator, or a [`RoutineFailure`] carrying the message and,
//! when there is one, the error that caused it. `main` turns the failure into exit code 1.

use crate::cli::display::{self, Message, MessageType};

pub mod check;
pub mod list;

#[derive(Debug, Clone)]
#[must_use = "The message should be displayed."]
pub struct RoutineSuccess {
    pub message: Message,
    pub message_type: MessageType,
}

impl RoutineSuccess {
    pub fn success(message: Message) -> Self {
        Self {
            message,
            message_type: MessageType::Success,
        }
    }

    pub fn highlight(message: Message) -> Self {
        Self {
            message,
            message_type: MessageType::Highlight,
        }
    }

    /// Nothing to show. Used when the output was already printed, e.g. as JSON.
    pub fn silent() -> Self {
        Self::success(Message {
            action: String::new(),
            details: String::new(),
        })
    }

    pub fn is_silent(&self) -> bool {
        self.message.action.is_empty() && self.message.details.is_empty()
    }

    pub fn show(&self) {
        display::show_message_wrapper(self.message_type, self.message.clone());
    }
}

#[derive(Debug)]
pub struct RoutineFailure {
    pub message: Message,
    pub message_type: MessageType,
    pub error: Option<anyhow::Error>,
}

impl RoutineFailure {
    pub fn new<F: Into<anyhow::Error>>(message: Message, error: F) -> Self {
        Self {
            message,
            message_type: MessageType::Error,
            error: Some(error.into()),
        }
    }
}

impl From<RoutineFailure> for anyhow::Error {
    fn from(failure: RoutineFailure) -> Self {
        if let Some(err) = failure.error {
            err
        } else {
            anyhow::anyhow!("{}: {}", failure.message.action, failure.message.details)
        }
    }
}
