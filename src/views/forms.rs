//! Form input checked before anything is sent

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{field_errors_from, FieldErrors},
    models::NewBook,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Add-book form. Text fields are trimmed on construction.
#[derive(Debug, Clone, Default, Validate)]
pub struct AddBookForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Published date is required"))]
    pub published_date: String,
    pub description: Option<String>,
}

impl AddBookForm {
    pub fn new(
        title: &str,
        author: &str,
        published_date: &str,
        description: Option<&str>,
    ) -> Self {
        Self {
            title: title.trim().to_string(),
            author: author.trim().to_string(),
            published_date: published_date.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }

    /// The request body, or every field message at once
    pub fn submit(&self) -> Result<NewBook, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors_from(&e),
        };

        let published_date = if self.published_date.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(&self.published_date, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors
                        .entry("published_date".to_string())
                        .or_default()
                        .push("Published date must be YYYY-MM-DD".to_string());
                    None
                }
            }
        };

        match published_date {
            Some(published_date) if errors.is_empty() => Ok(NewBook {
                title: self.title.clone(),
                author: self.author.clone(),
                published_date,
                description: self.description.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// One `field: message` line per message
pub fn render_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| format!("  {}: {}", field, message))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
