//! Plain-text presentation of client state

pub mod detail;
pub mod forms;
pub mod list;
pub mod notice;

pub use detail::{BookAction, BookDetailView, NOT_FOUND_MESSAGE};
pub use forms::{render_field_errors, AddBookForm};
pub use list::{rent_from_card, BookListView};
pub use notice::{error_detail, Action, Feedback, Level, Notice};
