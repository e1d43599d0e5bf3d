mod api;
mod config;
mod device;
mod directory;
mod groups;
mod net;
mod store;
mod tasks;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use mdns::{Announcement, Discovery, DiscoveryConfig, MulticastSocket};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::device::DeviceClient;
use crate::directory::DeviceDirectory;
use crate::groups::GroupCache;
use crate::store::{APP_NAMESPACE, KvStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("elightsd=info")),
        )
        .init();

    tracing::info!("starting elightsd");

    // Persistence store and configuration.
    let data_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/var/lib/elights".to_owned());
    let store = KvStore::open(&data_dir, APP_NAMESPACE)
        .with_context(|| format!("failed to open store under {data_dir}"))?;
    let config = Config::load(&store);
    tracing::info!(
        "hostname={} service={} api={}",
        config.hostname,
        config.service_name,
        config.api_listen
    );
    if config.wifi_ssid.is_some() {
        // Link bring-up is the host OS's job; the credentials are only
        // carried for provisioning tooling.
        tracing::debug!("WiFi credentials present in store");
    }

    let local_ip = net::detect_local_ipv4().context("failed to detect local IPv4 address")?;
    tracing::info!("local address: {local_ip}");

    let api_listen: SocketAddr = config
        .api_listen
        .parse()
        .with_context(|| format!("invalid API listen address {}", config.api_listen))?;

    // Collaborators.
    let groups = Arc::new(Mutex::new(GroupCache::load(store.clone())));
    let directory = DeviceDirectory::new();
    let client = DeviceClient::new()?;

    // mDNS socket and protocol. A socket setup failure is fatal: the
    // dependent tasks must not be scheduled without it.
    let std_socket = MulticastSocket::new()
        .into_std()
        .context("failed to set up mDNS socket")?;
    let socket = tokio::net::UdpSocket::from_std(std_socket)
        .context("failed to register mDNS socket with the runtime")?;

    let disco = Discovery::new(
        DiscoveryConfig::default()
            .with_service_name(&config.service_name)
            .with_hostname(&config.hostname)
            .with_local_ip(local_ip)
            .with_announcement(Announcement {
                service_type: "_http._tcp.local".to_owned(),
                instance_name: config.instance_name.clone(),
                port: api_listen.port(),
                txt_records: vec![],
            }),
    );

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(64);

    let discovery_handle = tokio::spawn(tasks::run_discovery(socket, disco, tx, cancel.clone()));
    let reconciler_handle = tokio::spawn(tasks::run_reconciler(
        directory.clone(),
        client.clone(),
        rx,
        cancel.clone(),
    ));

    // Periodic heartbeat with the directory size.
    let status_directory = directory.clone();
    let status_cancel = cancel.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = status_cancel.cancelled() => break,
                _ = tick.tick() => {
                    tracing::debug!("{} device(s) in directory", status_directory.len());
                }
            }
        }
    });

    // HTTP API.
    let state = api::AppState {
        directory,
        groups,
        client,
    };
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(api_listen)
        .await
        .with_context(|| format!("failed to bind API listener on {api_listen}"))?;
    tracing::info!("API listening on {api_listen}");

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("server error: {e}");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutdown signal received");

    cancel.cancel();
    let _ = tokio::join!(discovery_handle, reconciler_handle, server_handle);

    tracing::info!("shutdown complete");
    Ok(())
}
