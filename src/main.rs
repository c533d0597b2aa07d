// src/main.rs

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Migrações embutidas rodam na subida
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");
    tracing::info!("migrações do banco de dados aplicadas");

    // Rotas internas (exigem contexto de ator via cabeçalhos)
    let booking_routes = Router::new()
        .route(
            "/bookings",
            post(handlers::bookings::store).get(handlers::bookings::index),
        )
        .route("/bookings/{id}", get(handlers::bookings::show))
        .route("/bookings/{id}/confirm", patch(handlers::bookings::confirm))
        .route("/bookings/{id}/cancel", patch(handlers::bookings::cancel))
        .route("/bookings/{id}/done", patch(handlers::bookings::done))
        .route("/bookings/{id}/time", patch(handlers::bookings::update_time));

    let calendar_routes = Router::new()
        .route(
            "/calendar/blocks",
            get(handlers::blocks::index).post(handlers::blocks::store),
        )
        .route("/calendar/blocks/{id}", delete(handlers::blocks::destroy));

    let schedule_routes = Router::new()
        .route(
            "/staff/{id}/schedule",
            get(handlers::schedule::show_staff_schedule)
                .put(handlers::schedule::replace_staff_schedule),
        )
        .route(
            "/exceptions",
            get(handlers::schedule::list_exceptions).post(handlers::schedule::create_exception),
        )
        .route("/exceptions/{id}", delete(handlers::schedule::delete_exception));

    let catalog_routes = Router::new()
        .route(
            "/services",
            get(handlers::catalog::list_services).post(handlers::catalog::create_service),
        )
        .route("/staff", get(handlers::catalog::list_staff));

    let business_routes = Router::new().route(
        "/business/settings",
        get(handlers::business::show_settings).patch(handlers::business::update_settings),
    );

    // Rotas públicas (cliente anônimo, resolvidas por slug/booking_code)
    let public_routes = Router::new()
        .route("/businesses/{slug}", get(handlers::public::business_profile))
        .route("/businesses/{slug}/services", get(handlers::public::services))
        .route("/businesses/{slug}/staff", get(handlers::public::staff))
        .route(
            "/businesses/{slug}/availability",
            get(handlers::public::availability),
        )
        .route("/businesses/{slug}/bookings", post(handlers::public::store))
        .route("/bookings/{code}", get(handlers::public::show))
        .route("/bookings/{code}/verify", post(handlers::public::verify_phone))
        .route("/bookings/{code}/cancel", post(handlers::public::cancel));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/availability", get(handlers::availability::availability))
        .merge(booking_routes)
        .merge(calendar_routes)
        .merge(schedule_routes)
        .merge(catalog_routes)
        .merge(business_routes)
        .nest("/public", public_routes);

    let app = Router::new()
        .nest("/api", api_routes)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("servidor escutando em {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
