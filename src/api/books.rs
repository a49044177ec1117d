//! Book endpoints

use crate::{
    cache::{Fingerprint, QueryCache, Tag, BOOKS},
    error::ApiError,
    models::{Availability, Book, BookEnvelope, BookPage, ListResponse, NewBook},
    services::filters::ViewFilters,
};

use super::{http::HttpClient, transport::ApiRequest, Resource};

/// Cache key and query parameters of a list request.
///
/// `author` is left out when empty and `available` when the filter is `All`;
/// `page` is always present.
pub fn list_fingerprint(page: u32, author: &str, availability: Availability) -> Fingerprint {
    let mut fingerprint = Fingerprint::new("books");
    if !author.is_empty() {
        fingerprint = fingerprint.with_param("author", author);
    }
    if let Some(available) = availability.query_value() {
        fingerprint = fingerprint.with_param("available", available);
    }
    fingerprint.with_param("page", page.max(1))
}

fn detail_fingerprint(id: i64) -> Fingerprint {
    Fingerprint::new(format!("books/{}", id))
}

#[derive(Clone)]
pub struct BooksApi {
    http: HttpClient,
    cache: QueryCache<Resource>,
}

impl BooksApi {
    pub fn new(http: HttpClient, cache: QueryCache<Resource>) -> Self {
        Self { http, cache }
    }

    /// `GET /books`, cached per (page, author, availability)
    pub async fn list(
        &self,
        page: u32,
        author: &str,
        availability: Availability,
    ) -> Result<BookPage, ApiError> {
        let fingerprint = list_fingerprint(page, author, availability);
        let request = ApiRequest::get("/books").query(fingerprint.query_pairs());
        let http = self.http.clone();

        self.cache
            .query(fingerprint, vec![Tag::general(BOOKS)], move || async move {
                let response: ListResponse = http.send_json(request).await?;
                Ok::<_, ApiError>(Resource::Page(BookPage::from(response)))
            })
            .await?
            .into_page()
    }

    /// List for the current view filters
    pub async fn list_filtered(&self, filters: &ViewFilters) -> Result<BookPage, ApiError> {
        self.list(filters.page, &filters.author, filters.availability)
            .await
    }

    /// `GET /books/{id}`, cached per id
    pub async fn get(&self, id: i64) -> Result<Book, ApiError> {
        let request = ApiRequest::get(format!("/books/{}", id));
        let http = self.http.clone();

        self.cache
            .query(
                detail_fingerprint(id),
                vec![Tag::item(BOOKS, id)],
                move || async move {
                    let envelope: BookEnvelope = http.send_json(request).await?;
                    Ok::<_, ApiError>(Resource::Book(envelope.into_book()))
                },
            )
            .await?
            .into_book()
    }

    /// `POST /books`
    pub async fn add(&self, book: &NewBook) -> Result<Book, ApiError> {
        tracing::info!(title = %book.title, "Adding book");
        let request = ApiRequest::post("/books").json(book);
        self.book_mutation(request).await
    }

    /// `POST /books/{id}/rent`
    pub async fn rent(&self, id: i64) -> Result<Book, ApiError> {
        tracing::info!(book_id = id, "Renting book");
        let request = ApiRequest::post(format!("/books/{}/rent", id));
        self.book_mutation(request).await
    }

    /// `POST /books/{id}/return`
    pub async fn return_book(&self, id: i64) -> Result<Book, ApiError> {
        tracing::info!(book_id = id, "Returning book");
        let request = ApiRequest::post(format!("/books/{}/return", id));
        self.book_mutation(request).await
    }

    async fn book_mutation(&self, request: ApiRequest) -> Result<Book, ApiError> {
        let envelope: BookEnvelope = self
            .cache
            .mutate(&[Tag::general(BOOKS)], self.http.send_json(request))
            .await?;
        Ok(envelope.into_book())
    }
}
