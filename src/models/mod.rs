//! Data models for the Bookrent client

pub mod book;
pub mod enums;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookEnvelope, BookPage, ListResponse, NewBook, PageMeta};
pub use enums::{Availability, SortOption};
pub use user::{Credentials, LoginResponse, MeResponse, Registration, Role, User};
