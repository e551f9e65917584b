use std::sync::Arc;
use std::time::Duration;

use secure_fileserver::config::Config;
use secure_fileserver::files::LocalFileSystem;
use secure_fileserver::handler::FileService;
use secure_fileserver::logger::{self, AccessLog, WriterAccessLog};
use secure_fileserver::server::{self, ConnectionContext};
use secure_fileserver::StartupError;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file path from the first argument, without extension
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg)).map_err(|e| {
        logger::log_error(&format!("Startup failed: {e}"));
        Box::<dyn std::error::Error>::from(e)
    })
}

async fn async_main(cfg: Config) -> Result<(), StartupError> {
    let files_config = Arc::new(cfg.files.validate()?);
    let addr = cfg.get_socket_addr().map_err(StartupError::InvalidConfig)?;

    let tls = match &cfg.server.tls {
        Some(tls) => Some(server::tls::load_acceptor(tls)?),
        None => {
            logger::log_warning("No [server.tls] section configured, serving plaintext HTTP");
            None
        }
    };

    let access_log: Arc<dyn AccessLog> =
        Arc::new(WriterAccessLog::new(cfg.logging.access_log_format.clone()));
    let service = Arc::new(FileService::new(
        Arc::clone(&files_config),
        Arc::new(LocalFileSystem),
        access_log,
    ));

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg, &files_config.base_path);

    let ctx = ConnectionContext {
        service,
        tls,
        header_read_timeout: Duration::from_secs(cfg.server.header_read_timeout),
    };
    server::run_server_loop(listener, ctx, server::shutdown_signal()).await;

    logger::log_info("Server stopped");
    Ok(())
}
