//! Common test utilities: an in-memory Bookrent backend behind the `Transport` seam.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use bookrent_client::{
    api::{ApiRequest, ApiResponse, Method, Transport, TransportError},
    repository::MemoryTokenStore,
    App, AppConfig,
};

pub const PER_PAGE: usize = 2;

#[derive(Clone)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password: String,
    role: String,
}

impl UserRecord {
    fn to_json(&self) -> Value {
        json!({ "id": self.id, "name": self.name, "email": self.email, "role": self.role })
    }
}

#[derive(Default)]
struct State {
    books: BTreeMap<i64, Value>,
    users: Vec<UserRecord>,
    tokens: HashMap<String, i64>,
    issued: u32,
}

/// Fake REST backend. Records every request it answers.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
    calls: Mutex<Vec<ApiRequest>>,
    latency: Mutex<Option<Duration>>,
    offline: AtomicBool,
}

impl FakeBackend {
    /// Five books, a regular user and an admin
    pub fn seeded() -> Arc<Self> {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            for (id, title, author, date, available) in [
                (1, "The Hobbit", "J.R.R. Tolkien", "1937-09-21", true),
                (2, "The Fellowship of the Ring", "J.R.R. Tolkien", "1954-07-29", true),
                (3, "The Two Towers", "J.R.R. Tolkien", "1954-11-11", true),
                (4, "Emma", "Jane Austen", "1815-12-23", false),
                (5, "Dune", "Frank Herbert", "1965-08-01", true),
            ] {
                state.books.insert(
                    id,
                    json!({
                        "id": id,
                        "title": title,
                        "author": author,
                        "published_date": date,
                        "availability": available,
                    }),
                );
            }
            state.users.push(UserRecord {
                id: 1,
                name: "Admin".into(),
                email: "admin@x.com".into(),
                password: "secret".into(),
                role: "admin".into(),
            });
            state.users.push(UserRecord {
                id: 2,
                name: "Bob".into(),
                email: "bob@x.com".into(),
                password: "hunter2".into(),
                role: "user".into(),
            });
        }
        Arc::new(backend)
    }

    /// Hand out a token the backend accepts for `email`
    pub fn issue_token(&self, email: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let user_id = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .unwrap();
        state.issued += 1;
        let token = format!("token-{}", state.issued);
        state.tokens.insert(token.clone(), user_id);
        token
    }

    /// Invalidate every issued token, as a server-side session expiry would
    pub fn expire_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_availability(&self, id: i64, available: bool) {
        if let Some(book) = self.state.lock().unwrap().books.get_mut(&id) {
            book["availability"] = json!(available);
        }
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests to `path` with `method`
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let caller = request
            .bearer
            .as_ref()
            .and_then(|token| state.tokens.get(token).copied())
            .and_then(|id| state.users.iter().find(|u| u.id == id).cloned());
        let body = request.body.clone().unwrap_or(Value::Null);
        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["login"]) => {
                let user = state
                    .users
                    .iter()
                    .find(|u| u.email == body["email"] && u.password == body["password"])
                    .cloned();
                match user {
                    Some(user) => {
                        state.issued += 1;
                        let token = format!("token-{}", state.issued);
                        state.tokens.insert(token.clone(), user.id);
                        ApiResponse::new(200, json!({ "user": user.to_json(), "access_token": token }))
                    }
                    None => ApiResponse::new(401, json!({ "error": "Invalid credentials" })),
                }
            }
            (Method::Post, ["register"]) => {
                let email = body["email"].as_str().unwrap_or_default().to_string();
                if state.users.iter().any(|u| u.email == email) {
                    return ApiResponse::new(
                        422,
                        json!({
                            "message": "The given data was invalid.",
                            "errors": { "email": ["The email has already been taken."] }
                        }),
                    );
                }
                let id = state.users.len() as i64 + 1;
                state.users.push(UserRecord {
                    id,
                    name: body["name"].as_str().unwrap_or_default().into(),
                    email,
                    password: body["password"].as_str().unwrap_or_default().into(),
                    role: body["role"].as_str().unwrap_or("user").into(),
                });
                ApiResponse::new(201, json!({ "message": "User registered successfully" }))
            }
            (Method::Get, ["me"]) => match caller {
                Some(user) => ApiResponse::new(200, json!({ "user": user.to_json() })),
                None => unauthenticated(),
            },
            (Method::Get, ["books"]) => {
                let param = |key: &str| {
                    request
                        .query
                        .iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.clone())
                };
                let author = param("author").unwrap_or_default().to_lowercase();
                let available = param("available").map(|v| v == "true");
                let page: usize = param("page").and_then(|p| p.parse().ok()).unwrap_or(1);

                let matching: Vec<Value> = state
                    .books
                    .values()
                    .filter(|b| {
                        b["author"]
                            .as_str()
                            .unwrap_or_default()
                            .to_lowercase()
                            .contains(&author)
                    })
                    .filter(|b| available.map_or(true, |a| b["availability"] == a))
                    .cloned()
                    .collect();
                let total = matching.len();
                let last_page = total.div_ceil(PER_PAGE).max(1);
                let data: Vec<Value> = matching
                    .into_iter()
                    .skip((page - 1) * PER_PAGE)
                    .take(PER_PAGE)
                    .collect();
                ApiResponse::new(
                    200,
                    json!({
                        "data": data,
                        "meta": { "current_page": page, "last_page": last_page, "total": total }
                    }),
                )
            }
            (Method::Get, ["books", id]) => match id.parse().ok().and_then(|id: i64| state.books.get(&id)) {
                Some(book) => ApiResponse::new(200, json!({ "data": book })),
                None => not_found(),
            },
            (Method::Post, ["books"]) => {
                let Some(user) = caller else {
                    return unauthenticated();
                };
                if user.role != "admin" {
                    return ApiResponse::new(403, json!({ "message": "Forbidden" }));
                }
                if body["title"].as_str().map_or(true, |t| t.trim().is_empty()) {
                    return ApiResponse::new(
                        422,
                        json!({
                            "message": "The given data was invalid.",
                            "errors": { "title": ["The title field is required."] }
                        }),
                    );
                }
                let id = state.books.keys().max().copied().unwrap_or(0) + 1;
                let mut book = body.clone();
                book["id"] = json!(id);
                book["availability"] = json!(true);
                state.books.insert(id, book.clone());
                ApiResponse::new(201, json!({ "data": book }))
            }
            (Method::Post, ["books", id, action @ ("rent" | "return")]) => {
                if caller.is_none() {
                    return unauthenticated();
                }
                let renting = *action == "rent";
                let Some(book) = id.parse().ok().and_then(|id: i64| state.books.get_mut(&id)) else {
                    return not_found();
                };
                if book["availability"] != renting {
                    let message = if renting {
                        "Book is not available for rent"
                    } else {
                        "Book is not currently rented"
                    };
                    return ApiResponse::new(400, json!({ "message": message }));
                }
                book["availability"] = json!(!renting);
                ApiResponse::new(200, json!({ "data": book.clone() }))
            }
            _ => not_found(),
        }
    }
}

fn unauthenticated() -> ApiResponse {
    ApiResponse::new(401, json!({ "message": "Unauthenticated." }))
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({ "message": "Not found" }))
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Connection("connection refused".into()));
        }
        Ok(self.respond(&request))
    }
}

/// App wired to `backend` with an in-memory token store
pub fn test_app(backend: &Arc<FakeBackend>, tokens: &Arc<MemoryTokenStore>) -> App {
    App::with_parts(AppConfig::default(), backend.clone(), tokens.clone())
}
