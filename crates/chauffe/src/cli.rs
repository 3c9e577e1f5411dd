use clap::Parser;

/// Chauffe profile service: cached CloudManager blockchain summaries over HTTP.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// CloudManager API base URL.
    #[arg(long, default_value = "http://localhost:5000", env = "CHAUFFE_CLOUDMANAGER_URL")]
    pub cloudmanager_url: String,

    /// CloudManager request timeout in seconds.
    #[arg(long, default_value = "10", env = "CHAUFFE_CLOUDMANAGER_TIMEOUT")]
    pub cloudmanager_timeout: u64,

    /// Maximum CloudManager requests per second (unlimited if omitted).
    #[arg(long, env = "CHAUFFE_CLOUDMANAGER_RPS")]
    pub cloudmanager_rps: Option<u32>,

    /// Redis URL for a cache shared between processes.
    /// If omitted, profile data is cached in process memory.
    #[arg(long, env = "CHAUFFE_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Maximum number of entries in the in-memory cache.
    #[arg(
        long,
        default_value_t = chauffe_core::store::DEFAULT_MEMORY_STORE_CAP,
        env = "CHAUFFE_MEMORY_CACHE_CAP"
    )]
    pub memory_cache_cap: usize,

    /// Oldest cached profile data served, in seconds.
    #[arg(long, default_value = "3600", env = "CHAUFFE_PROFILE_CACHE_MAX_AGE")]
    pub profile_cache_max_age: u64,

    /// Store-level expiry for cached profile data, in seconds.
    #[arg(long, default_value = "3600", env = "CHAUFFE_PROFILE_CACHE_TIMEOUT")]
    pub profile_cache_timeout: u64,

    /// Cache schema version; changing it orphans every existing entry.
    #[arg(long, default_value = chauffe_core::types::DEFAULT_CACHE_VERSION, env = "CHAUFFE_PROFILE_CACHE_VERSION")]
    pub profile_cache_version: String,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "8080")]
    pub port: u16,
}
