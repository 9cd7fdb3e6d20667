//! Serve command implementation.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;

use filepulse_core::hub::BroadcastHub;
use filepulse_core::state::{FileState, FileStateStore};
use filepulse_core::status::StatusReporter;
use filepulse_core::watch::FileMonitor;
use filepulse_core::web::{DeliveryOptions, SharedState, WebServer, WebServerConfig};

use super::ServeArgs;

/// Run the serve command.
pub async fn run(args: ServeArgs) -> Result<()> {
    let global_config = super::load_config();

    let file = args.file.unwrap_or(global_config.watch.file);
    let port = args.port.unwrap_or(global_config.server.port);
    let localhost_only = args.localhost_only || global_config.server.localhost_only;

    let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
    let hub = Arc::new(BroadcastHub::new(Arc::clone(&store)));
    let health = Arc::new(AtomicBool::new(true));

    let monitor = FileMonitor::new(
        file.clone(),
        Arc::clone(&store),
        Arc::clone(&hub),
        Arc::clone(&health),
        global_config.watch.debounce_ms,
    );
    monitor.initialize()?;

    let reporter = Arc::new(StatusReporter::new(
        file.clone(),
        Arc::clone(&store),
        Arc::clone(&hub),
        Arc::clone(&health),
    ));

    println!();
    println!("FilePulse v{}", filepulse_core::VERSION);
    println!("{}", "─".repeat(40));
    println!();
    println!("  Monitoring: {}", file.display());
    println!();
    println!("  http://localhost:{}", port);
    if !localhost_only {
        println!("  http://192.168.x.x:{} (for other devices)", port);
    }
    println!();
    println!("  GET /api/hello          -> current content (REST)");
    println!("  GET /api/hello/stream   -> server-sent events (real-time)");
    println!("  GET /api/hello/live     -> long-polling (60s connection)");
    println!("  GET /api/status         -> monitoring status");
    println!("  GET /ws                 -> WebSocket (publish/subscribe)");
    println!();
    println!("Edit the watched file to see live updates. Ctrl+C stops the server.");
    println!();

    // The watcher gets its own task; if the watch subsystem dies the server
    // keeps answering with the last good state and /api/status reports it.
    let monitor_task = tokio::spawn(monitor.run());

    let state = SharedState::new(
        store,
        hub,
        reporter,
        DeliveryOptions::from(&global_config.delivery),
    );

    let server = WebServer::new(WebServerConfig {
        port,
        localhost_only,
    });
    server.serve(state, shutdown_signal()).await?;

    monitor_task.abort();

    println!();
    println!("Server stopped.");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
    }
}
