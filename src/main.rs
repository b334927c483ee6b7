use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use jobboard_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state.notification_service.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Email outbox worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    {
        let state = app_state.clone();
        let interval = Duration::from_secs(config.sweep_interval_secs);
        tokio::spawn(async move {
            loop {
                match state
                    .advert_service
                    .expire_adverts(chrono::Utc::now())
                    .await
                {
                    Ok(0) => {}
                    Ok(expired) => info!(expired, "Deactivated job adverts past their deadline"),
                    Err(e) => tracing::error!(error = ?e, "Deadline sweep error"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let public_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/", get(routes::docs::api_root))
        .route("/api/schema/", get(routes::docs::openapi_schema))
        .route("/auth/register/", post(routes::auth::register))
        .route("/auth/login/", post(routes::auth::login))
        .route("/api/adverts/", get(routes::advert::list_adverts))
        .route("/api/adverts/:id/", get(routes::advert::get_advert))
        .route("/api/skills/", get(routes::catalog::list_skills))
        .route("/api/categories/", get(routes::catalog::list_categories));

    let protected_routes = Router::new()
        .route(
            "/auth/profile/",
            get(routes::auth::get_profile).patch(routes::auth::update_profile),
        )
        .route("/api/adverts/create/", post(routes::advert::create_advert))
        .route(
            "/api/adverts/:id/update/",
            patch(routes::advert::update_advert),
        )
        .route(
            "/api/adverts/:id/delete/",
            delete(routes::advert::delete_advert),
        )
        .route("/api/adverts/:id/apply/", post(routes::application::apply))
        .route(
            "/api/applications/",
            get(routes::application::list_applications),
        )
        .route(
            "/api/applications/:id/",
            get(routes::application::get_application),
        )
        .route(
            "/api/applications/:id/update/",
            patch(routes::application::update_application_status),
        )
        .route_layer(axum::middleware::from_fn(
            jobboard_backend::middleware::auth::require_bearer_auth,
        ));

    info!("Serving uploads from: {}", config.uploads_dir);

    let app = public_routes
        .merge(protected_routes)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(&config.uploads_dir),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
