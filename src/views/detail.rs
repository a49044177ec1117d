//! Book detail view

use std::fmt::Write as _;

use crate::{api::BooksApi, error::AppError, models::Book};

use super::notice::{Action, Notice};

pub const NOT_FOUND_MESSAGE: &str = "Book not found. Please try again.";

/// The one action a detail page offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookAction {
    Rent,
    Return,
}

impl BookAction {
    /// Rent is only ever offered for an available book
    pub fn for_book(book: &Book) -> Self {
        if book.availability {
            BookAction::Rent
        } else {
            BookAction::Return
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookAction::Rent => "Rent This Book",
            BookAction::Return => "Return Book",
        }
    }

    fn notice_action(&self) -> Action {
        match self {
            BookAction::Rent => Action::Rent,
            BookAction::Return => Action::Return,
        }
    }
}

pub struct BookDetailView {
    book: Book,
}

impl BookDetailView {
    pub fn new(book: Book) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn action(&self) -> BookAction {
        BookAction::for_book(&self.book)
    }

    pub fn render(&self) -> String {
        let book = &self.book;
        let mut out = String::new();
        let _ = writeln!(out, "{}", book.title);
        let _ = writeln!(out, "Author: {}", book.author);
        let _ = writeln!(out, "Published: {}", book.published_date.format("%B %-d, %Y"));
        let _ = writeln!(
            out,
            "Status: {}",
            if book.availability { "Available" } else { "Rented" }
        );
        if let Some(description) = &book.description {
            let _ = writeln!(out, "\n{}", description);
        }
        let _ = write!(out, "\n[{}]", self.action().label());
        out
    }

    /// Run the offered action
    pub async fn perform(&self, api: &BooksApi) -> Result<Book, AppError> {
        let result = match self.action() {
            BookAction::Rent => api.rent(self.book.id).await,
            BookAction::Return => api.return_book(self.book.id).await,
        };
        Ok(result?)
    }

    /// Notice for the outcome of [`perform`](Self::perform)
    pub fn notice(&self, result: &Result<Book, AppError>) -> Option<Notice> {
        Notice::for_result(self.action().notice_action(), result)
    }
}
