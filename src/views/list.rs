//! Book list view

use std::fmt::Write as _;
use std::ops::RangeInclusive;

use crate::{
    api::BooksApi,
    error::AppError,
    models::{Book, BookPage, SortOption},
    services::ViewFilters,
};

pub struct BookListView {
    page: BookPage,
    filters: ViewFilters,
}

impl BookListView {
    pub fn new(page: BookPage, filters: ViewFilters) -> Self {
        Self { page, filters }
    }

    /// Items of the current page ordered by publication date
    pub fn items(&self) -> Vec<&Book> {
        let mut items: Vec<&Book> = self.page.items.iter().collect();
        match self.filters.sort {
            SortOption::Newest => items.sort_by(|a, b| b.published_date.cmp(&a.published_date)),
            SortOption::Oldest => items.sort_by(|a, b| a.published_date.cmp(&b.published_date)),
        }
        items
    }

    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.page.last_page
    }

    /// Shown instead of the list when nothing matched
    pub fn empty_message(&self) -> Option<String> {
        if !self.page.is_empty() {
            return None;
        }
        if self.filters.author.is_empty() {
            Some("No books found".to_string())
        } else {
            Some(format!(
                "No books found\nWe couldn't find any books matching \"{}\"",
                self.filters.author
            ))
        }
    }

    /// An empty result under an author query offers clearing that query
    pub fn offers_clear_search(&self) -> bool {
        self.page.is_empty() && !self.filters.author.is_empty()
    }

    pub fn render(&self) -> String {
        if let Some(message) = self.empty_message() {
            return message;
        }

        let mut out = String::new();
        for book in self.items() {
            let _ = writeln!(
                out,
                "#{:<5} {} by {} ({}) [{}]",
                book.id,
                book.title,
                book.author,
                book.published_date,
                if book.availability { "Available" } else { "Rented" }
            );
        }
        let pages: Vec<String> = self
            .page_numbers()
            .map(|n| {
                if n == self.page.current_page {
                    format!("[{}]", n)
                } else {
                    n.to_string()
                }
            })
            .collect();
        let _ = write!(
            out,
            "Page {} of {} ({} books) | {} | {}",
            self.page.current_page,
            self.page.last_page,
            self.page.total,
            pages.join(" "),
            self.filters.sort.label()
        );
        out
    }
}

/// Rent straight from a list card.
///
/// Does nothing for a book that is not available.
pub async fn rent_from_card(api: &BooksApi, book: &Book) -> Option<Result<Book, AppError>> {
    if !book.availability {
        return None;
    }
    Some(api.rent(book.id).await.map_err(AppError::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListResponse;
    use chrono::NaiveDate;

    fn book(id: i64, year: i32, availability: bool) -> Book {
        Book {
            id,
            title: format!("Book {}", id),
            author: "Tolkien".into(),
            published_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            availability,
            description: None,
        }
    }

    fn page(items: Vec<Book>) -> BookPage {
        BookPage {
            total: items.len() as u64,
            items,
            current_page: 2,
            last_page: 3,
        }
    }

    #[test]
    fn test_sort_by_published_date() {
        let items = vec![book(1, 1954, true), book(2, 1977, true), book(3, 1937, false)];
        let mut filters = ViewFilters::default();

        let view = BookListView::new(page(items.clone()), filters.clone());
        let ids: Vec<i64> = view.items().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        filters.sort = SortOption::Oldest;
        let view = BookListView::new(page(items), filters);
        let ids: Vec<i64> = view.items().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_page_numbers() {
        let view = BookListView::new(page(vec![book(1, 2000, true)]), ViewFilters::default());
        assert_eq!(view.page_numbers().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(view.render().contains("1 [2] 3"));
    }

    #[test]
    fn test_empty_result_with_author_query() {
        let filters = ViewFilters {
            author: "Nobody".into(),
            ..ViewFilters::default()
        };
        let view = BookListView::new(BookPage::from(ListResponse::default()), filters);
        assert!(view.offers_clear_search());
        assert!(view.empty_message().unwrap().contains("\"Nobody\""));
        assert_eq!(view.page_numbers().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_empty_result_without_query() {
        let view = BookListView::new(BookPage::from(ListResponse::default()), ViewFilters::default());
        assert!(!view.offers_clear_search());
        assert_eq!(view.render(), "No books found");
    }
}
