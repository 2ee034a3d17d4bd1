use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use autodel_admission::config::AdmissionConfig;
use autodel_admission::telemetry;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, crate_description, crate_version};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustls::ServerConfig;
use rustls::crypto::aws_lc_rs::default_provider;
use rustls::pki_types::CertificateDer;
use tokio::signal::unix::{SignalKind, signal};

mod handlers;
mod state;

use state::WebhookState;

fn load_tls_config(cert_path: &Path, key_path: &Path) -> anyhow::Result<ServerConfig> {
    let mut cert_reader = BufReader::new(File::open(cert_path)?);
    let mut key_reader = BufReader::new(File::open(key_path)?);

    let certs: Vec<CertificateDer> =
        rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;
    let key = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| anyhow::anyhow!("no private key in {}", key_path.display()))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

/// Reload the server certificate whenever the files change on disk.
/// Watches the parent directories to catch the symlink swaps kubelet
/// performs on mounted secrets.
async fn watch_tls_files(cert_path: PathBuf, key_path: PathBuf, rustls_config: RustlsConfig) {
    let (tx, mut rx) = tokio::sync::mpsc::channel(1);

    let watched: Vec<PathBuf> = [&cert_path, &key_path]
        .iter()
        .filter_map(|path| path.parent())
        .map(Path::to_path_buf)
        .collect();

    tokio::task::spawn_blocking(move || {
        let rt = tokio::runtime::Handle::current();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    let _ = rt.block_on(tx.send(()));
                }
            }
        })
        .expect("failed to create TLS file watcher");

        for dir in watched.iter().collect::<std::collections::BTreeSet<_>>() {
            let _ = watcher.watch(dir, RecursiveMode::NonRecursive);
        }

        // Keep watcher alive
        loop {
            std::thread::sleep(Duration::from_secs(1));
        }
    });

    while rx.recv().await.is_some() {
        // Settle time for the remaining files of the rotation
        tokio::time::sleep(Duration::from_secs(5)).await;

        match load_tls_config(&cert_path, &key_path) {
            Ok(new_config) => {
                rustls_config.reload_from_config(Arc::new(new_config));
                tracing::info!("Reloaded TLS certificates");
            }
            Err(e) => {
                tracing::error!("Failed to load new TLS config: {}", e);
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "autodel-webhook",
    about = crate_description!(),
    version = crate_version!(),
)]
struct Args {
    /// Listen address (use "::" for IPv6, "0.0.0.0" for IPv4)
    #[arg(long, default_value = "0.0.0.0", env)]
    listen_address: String,

    /// Listen on given port
    #[arg(short, long, default_value_t = 8443, env)]
    port: u16,

    /// Filter for log messages
    #[arg(short, long, default_value = "info", env)]
    log_filter: String,

    /// Set log format
    #[arg(long, value_enum, default_value_t = telemetry::LogFormat::Text, env)]
    log_format: telemetry::LogFormat,

    /// Namespace synthesized cron jobs are created in
    #[arg(short, long, default_value = "default", env = "NAMESPACE")]
    namespace: String,

    /// Image for the cleanup container
    #[arg(long, default_value = "busybox:latest", env)]
    image: String,

    /// Endpoint the cleanup command calls with the resource identity
    #[arg(long, env, required = true)]
    service_endpoint: String,

    /// Namespaces whose resources are admitted without inspection
    #[arg(long = "ignore-namespace", env = "IGNORE_NAMESPACES", value_delimiter = ',')]
    ignore_namespace: Vec<String>,

    /// Path to TLS certificate file
    #[arg(long, env, required = true)]
    tls_cert: PathBuf,

    /// Path to TLS private key file
    #[arg(long, env, required = true)]
    tls_key: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    default_provider().install_default().unwrap();

    let args: Args = Args::parse();

    telemetry::init(&args.log_filter, args.log_format)?;

    let config = AdmissionConfig {
        namespace: args.namespace,
        image: args.image,
        service_endpoint: args.service_endpoint,
        ignored_namespaces: args.ignore_namespace,
    };
    let state = WebhookState::new(config);

    let app = handlers::router(state);

    let addr = format!("{}:{}", args.listen_address, args.port);
    let socket_addr: SocketAddr = addr.parse()?;

    tracing::info!("Starting HTTPS server on {}", socket_addr);
    let tls_config = load_tls_config(&args.tls_cert, &args.tls_key)?;
    let rustls_config = RustlsConfig::from_config(Arc::new(tls_config));

    let handle: Handle = Handle::new();
    let shutdown_handle = handle.clone();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        shutdown_signal().await;
        handlers::READYZ_READY.store(false, Ordering::Relaxed);
        tracing::info!("Received shutdown signal, starting graceful shutdown");
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(30)));
    });

    // Spawn TLS certificate watcher
    let tls_watcher = watch_tls_files(
        args.tls_cert.clone(),
        args.tls_key.clone(),
        rustls_config.clone(),
    );

    let server = axum_server::bind_rustls(socket_addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service());

    tokio::select! {
        result = server => { result?; },
        _ = tls_watcher => {},
    }

    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to install SIGTERM signal handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}
