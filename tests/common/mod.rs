//! Common test utilities for E2E tests

use std::sync::{Arc, Once};

use tempfile::TempDir;
use tokio::net::TcpListener;
use warbler::auth::session::{Session, create_session_token};
use warbler::data::{Message, NewMessage, User};
use warbler::{AppState, config};

static METRICS_INIT: Once = Once::new();

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // The registry is process-global; register instruments once per
        // test binary
        METRICS_INIT.call_once(warbler::metrics::init_metrics);

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                url: format!("sqlite:{}?mode=rwc", db_path.display()),
            },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-of-at-least-32-bytes!".to_string(),
                session_max_age: 604800,
                bcrypt_cost: 4, // Minimum cost keeps the suites fast
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Cookie-store client: carries the session and flash cookies
        // across redirects the way a browser does
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = warbler::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a user directly in the database, bypassing the signup form
    pub async fn create_test_user(&self, username: &str, email: &str, password: &str) -> User {
        let staged = self
            .state
            .auth
            .signup(
                Some(username.to_string()),
                Some(email.to_string()),
                Some(password),
                None,
            )
            .unwrap();
        self.state.db.insert_user(&staged).await.unwrap()
    }

    /// Insert a message directly in the database
    pub async fn post_test_message(&self, user_id: i64, text: &str) -> Message {
        self.state
            .db
            .insert_message(&NewMessage {
                text: text.to_string(),
                user_id,
            })
            .await
            .unwrap()
    }

    /// Mint a signed session token for a user id.
    ///
    /// The id is not checked here; tests use unknown ids to exercise
    /// stale-session handling.
    pub fn session_token(&self, user_id: i64) -> String {
        let session = Session::new(user_id, self.state.config.auth.session_max_age);
        create_session_token(&session, &self.state.config.auth.session_secret)
            .expect("failed to create test token")
    }

    /// A cookie-store client already holding a session for `user_id`,
    /// the equivalent of having logged in through the form
    pub fn session_client(&self, user_id: i64) -> reqwest::Client {
        let token = self.session_token(user_id);
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let url: reqwest::Url = self.addr.parse().unwrap();
        jar.add_cookie_str(&format!("curr_user={token}; Path=/"), &url);

        reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap()
    }
}

/// Client that surfaces raw 302 responses instead of following them
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build no-redirect client")
}
