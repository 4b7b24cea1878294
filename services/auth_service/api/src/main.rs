use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    tracing::info!("auth service starting");

    let config = shared_config::Config::from_env().expect("failed to load configuration");
    tracing::info!("configuration loaded");

    let db_pool = shared_db::init_pool(&config.database_url, 10).await.expect("failed to connect to database");
    tracing::info!("database connected");

    let app = auth_service_api::get_app(db_pool, &config).await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "auth service listening");
    tracing::info!(%addr, "swagger ui available at /docs");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind listener");
    axum::serve(listener, app.into_make_service()).await.expect("server error");
}
