//! Client side of the Bookrent REST API

pub mod auth;
pub mod books;
pub mod http;
pub mod transport;

pub use auth::AuthApi;
pub use books::{list_fingerprint, BooksApi};
pub use http::HttpClient;
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport, TransportError};

use crate::{
    error::ApiError,
    models::{Book, BookPage, User},
};

/// Values held by the shared query cache
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Page(BookPage),
    Book(Book),
    User(User),
}

impl Resource {
    pub fn into_page(self) -> Result<BookPage, ApiError> {
        match self {
            Resource::Page(page) => Ok(page),
            other => Err(mismatch("page", &other)),
        }
    }

    pub fn into_book(self) -> Result<Book, ApiError> {
        match self {
            Resource::Book(book) => Ok(book),
            other => Err(mismatch("book", &other)),
        }
    }

    pub fn into_user(self) -> Result<User, ApiError> {
        match self {
            Resource::User(user) => Ok(user),
            other => Err(mismatch("user", &other)),
        }
    }
}

fn mismatch(expected: &str, found: &Resource) -> ApiError {
    tracing::error!("Cache returned {:?} where a {} was expected", found, expected);
    ApiError::unexpected()
}
