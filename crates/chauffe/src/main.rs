mod cli;
mod server;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;

use chauffe_core::invalidation::ProfileCacheInvalidator;
use chauffe_core::ledger::OrderLedger;
use chauffe_core::source::{BlockchainSource, HttpCloudManagerClient};
use chauffe_core::store::{CacheStore, MemoryStore, RedisStore};
use chauffe_core::{CacheSettings, ProfileCache};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    // Generate a random API token for this server session.
    let api_token = {
        use rand::Rng;
        let bytes: [u8; 16] = rand::thread_rng().r#gen();
        hex::encode(bytes)
    };

    // The CloudManager client is built once and shared by every request.
    let cloudmanager = Arc::new(
        HttpCloudManagerClient::new(
            &args.cloudmanager_url,
            Duration::from_secs(args.cloudmanager_timeout),
            args.cloudmanager_rps,
        )
        .context("configure CloudManager client")?,
    );

    // An unreachable CloudManager is not fatal: profiles then render with
    // the connection error embedded.
    match cloudmanager.health().await {
        Ok(health) => {
            let version = cloudmanager
                .version()
                .await
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));
            tracing::info!(
                url = %args.cloudmanager_url,
                %health,
                %version,
                "connected to CloudManager"
            );
        }
        Err(err) => tracing::warn!(
            url = %args.cloudmanager_url,
            error = %err,
            "CloudManager health check failed; profile data will be degraded until it recovers"
        ),
    }

    let store: Arc<dyn CacheStore> = match &args.redis_url {
        Some(url) => Arc::new(
            RedisStore::connect(url)
                .await
                .context("connect to redis cache store")?,
        ),
        None => Arc::new(
            MemoryStore::with_capacity(args.memory_cache_cap)
                .context("configure in-memory cache store")?,
        ),
    };

    let settings = CacheSettings {
        max_age: Duration::from_secs(args.profile_cache_max_age),
        store_ttl: Duration::from_secs(args.profile_cache_timeout),
        schema_version: args.profile_cache_version.clone(),
    };

    let ledger = Arc::new(OrderLedger::new());
    let cache = Arc::new(
        ProfileCache::new(store, cloudmanager, ledger.clone(), settings)
            .context("configure profile cache")?,
    );
    ledger
        .subscribe(Arc::new(ProfileCacheInvalidator::new(&cache)))
        .await;

    let stats = cache.stats();
    tracing::info!(
        backend = %stats.cache_backend,
        version = %stats.cache_version,
        timeout_secs = stats.cache_timeout,
        "profile cache ready"
    );

    let state = server::AppState {
        cache,
        ledger,
        api_token: api_token.clone(),
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let origin = format!("http://{}:{}", args.bind, args.port);
    let router = server::build_router(state, &origin).context("build HTTP router")?;

    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0; it is accessible from the network");
    }

    println!();
    println!("  Chauffe is running:");
    println!("    URL:       http://{bind_addr}");
    println!("    API token: {api_token}");
    println!();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("run HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
