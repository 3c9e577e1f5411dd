use std::env;
use std::sync::Once;
use std::time::Duration;

use chauffe_core::source::{BlockchainSource, HttpCloudManagerClient};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chauffe_core=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a reachable CloudManager; set CHAUFFE_TEST_CLOUDMANAGER_URL"]
async fn live_cloudmanager_health_listing_and_summary() {
    init_tracing();

    let url = env::var("CHAUFFE_TEST_CLOUDMANAGER_URL")
        .expect("CHAUFFE_TEST_CLOUDMANAGER_URL must be set");
    let client = HttpCloudManagerClient::new(&url, Duration::from_secs(10), None)
        .expect("cloudmanager client must construct");

    eprintln!("[itest] checking health against {url}");
    let health = client.health().await.expect("health must succeed");
    assert!(health.is_object(), "health must be a JSON document");

    let listing = client
        .list_blockchains()
        .await
        .expect("blockchain listing must succeed");
    eprintln!("[itest] {} blockchains listed", listing.len());

    // Pick an owner from the listing when there is one; otherwise a random
    // uuid must aggregate to an empty summary.
    let owner = listing
        .iter()
        .find_map(|(_, metadata)| metadata.user_uuid.clone())
        .unwrap_or_else(|| "00000000-0000-4000-8000-000000000000".to_string());
    let summary = client
        .user_summary(&owner)
        .await
        .expect("user summary must succeed");

    let owned = listing
        .iter()
        .filter(|(_, metadata)| metadata.user_uuid.as_deref() == Some(owner.as_str()))
        .count() as u64;
    assert!(summary.total_blockchains <= owned);
    assert!(summary.controller_names.len() as u64 <= summary.total_blockchains);
}
