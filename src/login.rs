//! Credentials, sessions and the authentication routes.

use crate::app::AppState;
use crate::error::ConfigError;
use crate::saving::write_atomically;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use handlebars::Handlebars;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

const LOGIN_TEMPLATE: &str = "login";

lazy_static! {
    // Unknown usernames are checked against this so they cost as much as known ones
    static ref UNKNOWN_USER_HASH: Option<String> = hash_password("unknown user").ok();
}

/// A user allowed to sign in to the gateway
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub username: String,

    /// Argon2 PHC string of the user's password
    pub password_hash: String,
}

/// Username to password hash map backed by a JSON file
///
/// The file is written by the `add_user` binary; the server only reads it.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    users: HashMap<String, User>,
}

impl CredentialStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        CredentialStore {
            path: path.into(),
            users: HashMap::new(),
        }
    }

    /// Read the credentials file
    ///
    /// # Errors
    /// * `ConfigError::Io` if the file cannot be read
    /// * `ConfigError::Parse` if it is not a username to user map
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let users = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(CredentialStore {
            path: path.to_path_buf(),
            users,
        })
    }

    /// Like [`CredentialStore::load`], but a missing file gives an empty store
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(Self::empty(path))
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Add a user, or set a new password for an existing one
    ///
    /// # Returns
    /// * `Ok(true)` if an existing user's password was replaced
    pub fn add_user(&mut self, username: &str, password: &str) -> Result<bool, ConfigError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ConfigError::Credentials(
                "Username and password cannot be empty".to_string(),
            ));
        }

        let user = User {
            username: username.to_string(),
            password_hash: hash_password(password)?,
        };
        Ok(self.users.insert(username.to_string(), user).is_some())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(&self.users).map_err(|source| {
            ConfigError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        write_atomically(&self.path, json.as_bytes()).map_err(io_error)
    }

    /// Check a username and password pair
    ///
    /// Unknown users and wrong passwords both give `false`.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(user) => verify_password(password, &user.password_hash),
            None => {
                if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                    verify_password(password, hash);
                }
                false
            }
        }
    }
}

/// Hash a password using Argon2
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Result<String, ConfigError>` - The PHC hash string
pub fn hash_password(password: &str) -> Result<String, ConfigError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::Credentials(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(e) => {
            log::warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// An authenticated browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub expires_at: SystemTime,
}

/// In-memory session table keyed by token
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for `username` and return its token
    ///
    /// Expired sessions are dropped on the way.
    pub fn create(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let now = SystemTime::now();

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at: now + self.ttl,
            },
        );

        token
    }

    /// Username of a live session; an expired one is removed
    pub fn validate(&self, token: &str) -> Option<String> {
        let now = SystemTime::now();
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(token) {
                Some(session) if session.expires_at > now => {
                    return Some(session.username.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.revoke(token);
        None
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The signed-in user, added to request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Handlebars registry holding the login page
pub fn login_templates() -> Result<Handlebars<'static>, ConfigError> {
    let mut templates = Handlebars::new();
    templates.register_template_string(LOGIN_TEMPLATE, include_str!("./static/login.html"))?;
    Ok(templates)
}

fn render_login(state: &AppState, error: Option<&str>) -> Html<String> {
    let page = state
        .templates
        .render(LOGIN_TEMPLATE, &serde_json::json!({ "error": error }))
        .unwrap_or_else(|e| {
            log::error!("Failed to render login page: {}", e);
            "<h1>Sign in unavailable</h1>".to_string()
        });
    Html(page)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn session_user(state: &AppState, jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.validate(cookie.value()))
}

pub async fn serve_login_page(State(state): State<Arc<AppState>>) -> Html<String> {
    render_login(&state, None)
}

/// Handle login form submissions
///
/// On success a session cookie is set and the browser is sent to the
/// dashboard. On failure the form is shown again with a generic message.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let verified = {
        let state = Arc::clone(&state);
        let username = form.username.clone();
        let password = form.password;
        tokio::task::spawn_blocking(move || state.credentials.verify(&username, &password))
            .await
            .unwrap_or(false)
    };

    if verified {
        let token = state.sessions.create(&form.username);
        log::info!("User '{}' signed in", form.username);
        (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
    } else {
        log::warn!("Failed sign-in for user '{}'", form.username);
        (
            StatusCode::UNAUTHORIZED,
            render_login(&state, Some(INVALID_CREDENTIALS)),
        )
            .into_response()
    }
}

/// End the session and clear the cookie
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.revoke(cookie.value()) {
            log::info!("Session ended");
        }
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/login"),
    )
}

pub async fn check_auth(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<AuthStatus> {
    let username = session_user(&state, &jar);
    Json(AuthStatus {
        authenticated: username.is_some(),
        username,
    })
}

/// Authentication middleware
///
/// Lets requests with a live session through and redirects everything else
/// to the login page.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match session_user(&state, &jar) {
        Some(username) => {
            request.extensions_mut().insert(CurrentUser(username));
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}
