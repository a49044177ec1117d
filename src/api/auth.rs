//! Authentication endpoints

use serde_json::Value;

use crate::{
    cache::{Fingerprint, QueryCache, Tag, SESSION},
    error::ApiError,
    models::{Credentials, LoginResponse, MeResponse, Registration, User},
};

use super::{http::HttpClient, transport::ApiRequest, Resource};

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
    cache: QueryCache<Resource>,
}

impl AuthApi {
    pub fn new(http: HttpClient, cache: QueryCache<Resource>) -> Self {
        Self { http, cache }
    }

    /// `POST /login`; sent without a token
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post("/login").json(credentials).anonymous();
        self.http.send_json(request).await
    }

    /// `POST /register`; sent without a token, no session side effect
    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/register").json(registration).anonymous();
        self.http.send(request).await
    }

    /// `GET /me`, cached under the `Session` tag
    pub async fn me(&self) -> Result<User, ApiError> {
        let http = self.http.clone();
        self.cache
            .query(
                Fingerprint::new("me"),
                vec![Tag::general(SESSION)],
                move || async move {
                    let response: MeResponse = http.send_json(ApiRequest::get("/me")).await?;
                    Ok::<_, ApiError>(Resource::User(response.user))
                },
            )
            .await?
            .into_user()
    }

    /// Forget the cached identity
    pub fn invalidate_identity(&self) {
        self.cache.invalidate(&[Tag::general(SESSION)]);
    }
}
