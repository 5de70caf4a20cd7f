use clap::Parser;
mod commands;
use commands::cli;
use std::path::Path;
use storefront_core::api::{AppConfig, CliError, LoggingConfig, StorageBackend};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(&args)?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    tracing::debug!(
        backend = ?cfg.storage.backend,
        data_dir = ?cfg.storage.data_dir,
        "config loaded"
    );

    dispatch(args.command, &cfg).await
}

fn load_config(args: &cli::Args) -> Result<AppConfig, CliError> {
    let mut cfg = match args.config.as_deref() {
        Some(path) => storefront_core::config::load_from_path(Path::new(path)),
        None => storefront_core::config::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;

    if let Some(dir) = args.data_dir.as_ref() {
        cfg.storage.data_dir = Some(dir.clone());
    }
    if args.memory {
        cfg.storage.backend = StorageBackend::Memory;
    }
    Ok(cfg)
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 20: storage / IO error
    // 30: secure storage access denied
    // 40: deep link error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Session(se) if se.is_access_denied() => 30,
        CliError::Session(_) => 20,
        CliError::DeepLink(_) => 40,
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(cmd: cli::Commands, cfg: &AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Session(session_cmd) => {
            commands::session::handle_session(session_cmd, cfg).await
        }
        cli::Commands::Link(link_cmd) => commands::link::handle_link(link_cmd, cfg).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("storefront"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("storefront.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
