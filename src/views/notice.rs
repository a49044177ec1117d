//! Transient user notices and form feedback

use std::fmt;

use crate::error::{AppError, FieldErrors};

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// What the user was doing when the notice was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rent,
    Return,
    Add,
    LoadBooks,
    LoadBook,
}

impl Action {
    fn success_text(&self) -> Option<&'static str> {
        match self {
            Action::Rent => Some("Book rented successfully!"),
            Action::Return => Some("Book returned successfully!"),
            Action::Add => Some("Book added successfully!"),
            Action::LoadBooks | Action::LoadBook => None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Action::Rent => "Error renting book",
            Action::Return => "Error returning book",
            Action::Add => "Failed to add book",
            Action::LoadBooks => "Failed to load books",
            Action::LoadBook => "Failed to load book",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    /// Success toast; loads succeed silently
    pub fn success(action: Action) -> Option<Self> {
        action.success_text().map(|text| Self {
            level: Level::Success,
            message: text.to_string(),
        })
    }

    pub fn failure(action: Action, error: &AppError) -> Self {
        Self {
            level: Level::Error,
            message: format!("{}: {}", action.failure_prefix(), error_detail(error)),
        }
    }

    /// Notice for the outcome of `action`
    pub fn for_result<T>(action: Action, result: &Result<T, AppError>) -> Option<Self> {
        match result {
            Ok(_) => Self::success(action),
            Err(e) => Some(Self::failure(action, e)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How a failed action is shown: inline field messages or a notice
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Fields(FieldErrors),
    Notice(Notice),
}

impl Feedback {
    pub fn from_error(action: Action, error: &AppError) -> Self {
        match error.field_errors() {
            Some(fields) if !fields.is_empty() => Feedback::Fields(fields),
            _ => Feedback::Notice(Notice::failure(action, error)),
        }
    }
}

/// The server's `message`, else a generic fallback
pub fn error_detail(error: &AppError) -> String {
    match error {
        AppError::Api(e) => e.data_str("message").unwrap_or(UNKNOWN_ERROR).to_string(),
        AppError::Validation(_) => UNKNOWN_ERROR.to_string(),
        other => other.to_string(),
    }
}
