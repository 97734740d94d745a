use std::net::SocketAddr;

use blog_mock_server::{config::Config, create_router, Db};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_mock_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let mut db = Db::new();
    db.set_nested_comments(config.nested_comments);
    for (username, token) in &config.users {
        let id = db.add_user(username, token);
        tracing::info!("Seeded user {} (id {})", username, id);
    }

    let app = create_router(db.into_pool());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Mock blog service listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
