use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use uidrange_webhook::config::UidRangeConfig;
use uidrange_webhook::kubernetes::{
    BypassCheck, K8sClient, KubeRangeStore, NoBypass, RangeStore, SubjectAccessReviewBypass,
};
use uidrange_webhook::shutdown::ShutdownCoordinator;
use uidrange_webhook::state::AppState;
use uidrange_webhook::tracker::RangeTracker;
use uidrange_webhook::{logging, ops, tls, webhook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--sample-config") {
        println!("{}", UidRangeConfig::generate_sample());
        return Ok(());
    }

    // One crypto provider for the kube client and the admission listener
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install TLS crypto provider"))?;

    // Load configuration
    let config = UidRangeConfig::load()?;

    let _log_guard = logging::init(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(anyhow::anyhow!("Invalid configuration: {}", e));
    }
    info!("Configuration loaded successfully");

    let client = K8sClient::infer().await?;
    info!(api_server = client.api_server(), "Connected to Kubernetes");

    let store: Arc<dyn RangeStore> = Arc::new(KubeRangeStore::new(client.clone()));

    // Seed the allocator before accepting any admission traffic
    let tracker = Arc::new(RangeTracker::new(store.clone()));
    tracker
        .initialize()
        .await
        .context("Failed to initialize range tracker")?;

    let bypass: Arc<dyn BypassCheck> = if config.bypass.enabled {
        info!(
            group = %config.bypass.group,
            resource = %config.bypass.resource,
            verb = %config.bypass.verb,
            "Pod validation bypass enabled"
        );
        Arc::new(SubjectAccessReviewBypass::new(client, &config.bypass))
    } else {
        Arc::new(NoBypass)
    };

    let state = Arc::new(AppState::new(config, store, tracker, bypass));
    let config = state.config.clone();

    let shutdown = ShutdownCoordinator::new();
    let signals = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals.wait_for_signal().await {
            warn!("Failed to listen for shutdown signals: {}", e);
        }
    });

    // Ops listener
    let ops_addr = format!("{}:{}", config.server.host, config.server.ops_port);
    let ops_listener = TcpListener::bind(&ops_addr).await?;
    info!("Ops endpoints listening on {}", ops_addr);

    let ops_server = axum::serve(ops_listener, ops::router(state.clone()))
        .with_graceful_shutdown(shutdown.signal());

    // Admission listener
    let admission_addr = format!("{}:{}", config.server.host, config.server.port);
    let admission_listener = TcpListener::bind(&admission_addr).await?;
    info!("Admission webhook listening on {}", admission_addr);

    let admission_server = async {
        let result = serve_admission(
            &config,
            admission_listener,
            webhook::router(state.clone()),
            shutdown.clone(),
        )
        .await;

        // A failed admission listener takes the ops listener down with it
        if result.is_err() {
            shutdown.shutdown();
        }
        result
    };

    let (ops_result, admission_result) = tokio::join!(ops_server, admission_server);
    admission_result?;
    ops_result?;

    info!("Shutdown complete");

    Ok(())
}

async fn serve_admission(
    config: &UidRangeConfig,
    listener: TcpListener,
    app: axum::Router,
    shutdown: ShutdownCoordinator,
) -> anyhow::Result<()> {
    if !config.tls.enabled {
        warn!("TLS disabled, serving admission reviews over plain HTTP");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.signal())
            .await?;
        return Ok(());
    }

    let tls_config = tls::load_server_config(&config.tls.cert_path, &config.tls.key_path)?;
    info!(cert = %config.tls.cert_path.display(), "Loaded serving certificate");

    tls::serve(listener, Arc::new(tls_config), app, shutdown).await?;

    Ok(())
}
