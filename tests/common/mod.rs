// In-process test harness: the real router wired to in-memory provider
// clients, driven through tower's oneshot.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

use propostas_api::auth::TokenService;
use propostas_api::clients::identity::UserMetadata;
use propostas_api::clients::{
    DataClient, DataError, IdentityClient, IdentityError, Proposal, ProviderUser,
};
use propostas_api::{app, cors_layer, AppState};

pub const TOKEN_SECRET: &str = "integration-test-secret";
pub const PERMITTED_DOMAIN: &str = "@example.com";

#[derive(Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub name: String,
    pub confirmed: bool,
}

/// In-memory identity provider: accounts start unconfirmed, and every
/// sign-up call is counted so tests can assert no call was made.
#[derive(Default)]
pub struct MockIdentity {
    pub accounts: Mutex<Vec<Account>>,
    pub sign_up_calls: AtomicUsize,
}

impl MockIdentity {
    pub fn confirm(&self, email: &str) {
        let mut accounts = self.accounts.lock().unwrap();
        for account in accounts.iter_mut().filter(|a| a.email == email) {
            account.confirmed = true;
        }
    }

    pub fn user_id(&self, email: &str) -> Uuid {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .map(|a| a.id)
            .expect("account not registered")
    }
}

#[async_trait]
impl IdentityClient for MockIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == email) {
            return Err(IdentityError::Rejected("User already registered".into()));
        }
        accounts.push(Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password: password.to_string(),
            name: display_name.to_string(),
            confirmed: false,
        });
        Ok(())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .ok_or(IdentityError::InvalidCredentials)?;

        if !account.confirmed {
            return Err(IdentityError::EmailNotConfirmed);
        }

        Ok(ProviderUser {
            id: account.id,
            email: account.email.clone(),
            user_metadata: UserMetadata {
                full_name: Some(account.name.clone()),
            },
        })
    }
}

/// In-memory `proposals` relation. `fail` flips every operation into a
/// storage error.
#[derive(Default)]
pub struct MockData {
    pub rows: Mutex<Vec<Proposal>>,
    pub next_id: AtomicI64,
    pub fail: AtomicBool,
}

impl MockData {
    fn check_available(&self) -> Result<(), DataError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DataError::StorageUnavailable("simulated outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataClient for MockData {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Proposal>, DataError> {
        self.check_available()?;
        let mut owned: Vec<Proposal> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == owner_id)
            .cloned()
            .collect();
        // created_at desc, insertion id as tiebreak
        owned.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(owned)
    }

    async fn insert(
        &self,
        owner_id: Uuid,
        title: &str,
        payload: Value,
    ) -> Result<Proposal, DataError> {
        self.check_available()?;
        let proposal = Proposal {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: owner_id,
            title: title.to_string(),
            data: payload,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(proposal.clone());
        Ok(proposal)
    }
}

pub struct TestHarness {
    pub app: Router,
    pub identity: Arc<MockIdentity>,
    pub data: Arc<MockData>,
}

pub fn harness() -> TestHarness {
    let identity = Arc::new(MockIdentity::default());
    let data = Arc::new(MockData::default());

    let state = AppState {
        identity: identity.clone(),
        data: data.clone(),
        tokens: TokenService::new(TOKEN_SECRET),
        permitted_email_domain: PERMITTED_DOMAIN.to_string(),
    };
    let app = app(state, cors_layer(None).unwrap());

    TestHarness { app, identity, data }
}

impl TestHarness {
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// Register (permitted domain), confirm, and log in; returns the session
    /// token and provider user id.
    pub async fn registered_user(&self, email: &str, password: &str, name: &str) -> (String, Uuid) {
        let (status, _) = self
            .request(
                "POST",
                "/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password, "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        self.identity.confirm(email);

        let (status, body) = self
            .request(
                "POST",
                "/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        let token = body["token"].as_str().expect("token in login body").to_string();
        (token, self.identity.user_id(email))
    }
}

pub fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("body should be JSON")
}

pub fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}
