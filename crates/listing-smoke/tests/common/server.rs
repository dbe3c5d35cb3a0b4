//! Fixture HTTP server for browser tests

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;

pub const HOME_HTML: &str = include_str!("../fixtures/home.html");
pub const CATEGORIES_HTML: &str = include_str!("../fixtures/categories.html");

/// A fixture site served on an ephemeral localhost port
pub struct FixtureServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `/` with the listing page and `/categorias` with a page without listings
pub async fn start_fixture_server() -> FixtureServer {
    let app = Router::new()
        .route("/", get(|| async { Html(HOME_HTML) }))
        .route("/categorias", get(|| async { Html(CATEGORIES_HTML) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind fixture server");
    let addr = listener.local_addr().expect("Should have local addr");

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Fixture server error: {}", e);
        }
    });

    FixtureServer {
        base_url: format!("http://{}", addr),
        handle,
    }
}
