//! Books API
//!
//! A REST backend for a library of books with filtering, pagination,
//! partial updates and statistics. SQLite persistence is optional.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod stats;
mod store;
mod validation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use models::BookPayload;
use store::BookStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BookStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (json_layer, plain_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .init();

    tracing::info!("Starting Books API");
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (BOOKS_API_KEY). Write routes are not gated!");
    }

    // Initialize the store, persisted when a database path is set
    let store = match &config.db_path {
        Some(db_path) => {
            tracing::info!("Database path: {:?}", db_path);
            let pool = db::init_database(db_path).await?;
            BookStore::open(Repository::new(pool)).await?
        }
        None => {
            tracing::info!("No database configured (BOOKS_DB_PATH); books are kept in memory");
            BookStore::new()
        }
    };

    if config.seed_demo && store.is_empty().await {
        seed_demo_books(&store).await?;
    }

    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Gate applies to writes only; reads stay open
    let key = state.config.api_key.clone();
    let gate = middleware::from_fn(move |req, next| auth::api_key_layer(key.clone(), req, next));

    let api_routes = Router::new()
        .route(
            "/books",
            get(api::list_books).merge(post(api::create_book).route_layer(gate.clone())),
        )
        .route("/books/stats", get(api::book_stats))
        .route(
            "/books/{id}",
            get(api::get_book).merge(
                put(api::update_book)
                    .patch(api::patch_book)
                    .delete(api::delete_book)
                    .route_layer(gate),
            ),
        );

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Sample books for a fresh demo instance.
async fn seed_demo_books(store: &BookStore) -> Result<(), errors::AppError> {
    let samples = [
        ("Война и мир", "Лев Толстой", 1869, "9785170987654"),
        ("Преступление и наказание", "Федор Достоевский", 1866, "9785170876543"),
        ("Евгений Онегин", "Александр Пушкин", 1833, "9785170765432"),
    ];

    for (title, author, year, isbn) in samples {
        store
            .create(BookPayload {
                title: title.to_string(),
                author: author.to_string(),
                year,
                isbn: Some(isbn.to_string()),
            })
            .await?;
    }

    tracing::info!("Seeded {} demo books", samples.len());
    Ok(())
}

#[cfg(test)]
mod tests;
