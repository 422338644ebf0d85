//! thaiid-server binary.
//!
//! Reads `thaiid.toml` (or the path given with `--config`), starts the
//! configured reader, and serves the last card read over HTTP.
//!
//! ```text
//! thaiid-server --backend mock --fixture card.json --port 8080
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use thaiid_hardware::mock::{CardFixture, MockReader, MockReaderHandle};
use thaiid_hardware::{AnyCardReader, ReaderManager};
use thaiid_server::{AppState, ReaderBackend, ReaderConfig, ServerConfig};
use thaiid_session::Session;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Thai national ID card reader bridge")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "thaiid.toml")]
    config: PathBuf,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Reader driver.
    #[arg(long, value_enum)]
    backend: Option<ReaderBackend>,

    /// Only watch PC/SC readers whose name contains this string.
    #[arg(long)]
    reader_name: Option<String>,

    /// JSON card fixture inserted into the mock reader.
    #[arg(long)]
    fixture: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(backend) = self.backend {
            config.reader.backend = backend;
        }
        if let Some(name) = self.reader_name {
            config.reader.reader_name = Some(name);
        }
        if let Some(fixture) = self.fixture {
            config.reader.fixture = Some(fixture);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let mut server_cfg =
        ServerConfig::load(&cli.config).context("failed to load configuration")?;
    cli.apply(&mut server_cfg);
    server_cfg.validate().context("invalid configuration")?;

    info!(
        backend = ?server_cfg.reader.backend,
        reader_name = ?server_cfg.reader.reader_name,
        "Starting thaiid-server v{}",
        thaiid_core::VERSION
    );

    let mut manager = ReaderManager::new(server_cfg.reader.manager_config());
    // The mock device unplugs when its handle drops
    let mock = start_reader(&server_cfg.reader, &mut manager).await?;

    let (mut session, view) = Session::new();
    let session_task = tokio::spawn(async move { session.run(manager.start()).await });

    let app = thaiid_server::router(AppState::new(view));
    let address = server_cfg.bind_address();

    info!("Listening on http://{address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    session_task.abort();
    drop(mock);
    info!("Shut down");

    Ok(())
}

async fn start_reader(
    config: &ReaderConfig,
    manager: &mut ReaderManager,
) -> anyhow::Result<Option<MockReaderHandle>> {
    match config.backend {
        ReaderBackend::Mock => {
            let fixture = match &config.fixture {
                Some(path) => CardFixture::from_json_file(path)
                    .with_context(|| format!("failed to load fixture {}", path.display()))?,
                None => CardFixture::sample(),
            };

            let (reader, mut mock) = MockReader::new();
            manager.register_reader(AnyCardReader::Mock(reader));

            mock.plug().await.context("failed to plug mock reader")?;
            mock.insert_card(fixture)
                .await
                .context("failed to insert mock card")?;

            info!(reader = mock.name(), "Mock reader ready");
            Ok(Some(mock))
        }
        #[cfg(feature = "pcsc")]
        ReaderBackend::Pcsc => {
            let reader = thaiid_hardware::pcsc::PcscReader::open(config.reader_name.clone())
                .context("failed to open PC/SC reader")?;
            manager.register_reader(AnyCardReader::Pcsc(reader));
            Ok(None)
        }
        #[cfg(not(feature = "pcsc"))]
        ReaderBackend::Pcsc => anyhow::bail!("built without the pcsc feature"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
