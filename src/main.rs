//! tvdrop - drop a video onto the TV over the local network
//!
//! CLI entry point

use anyhow::{bail, Context};
use clap::Parser;
use tvdrop::{exit_codes, find_available_port_on, get_local_ip, logging, Cli, Config, WebServer};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            // Missing or malformed arguments: usage goes to stderr with exit 1.
            let _ = e.print();
            std::process::exit(exit_codes::GENERAL_ERROR);
        }
        Err(e) => e.exit(),
    };

    std::process::exit(match run(&cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: {}", e);
            Config::default()
        }),
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let file_config = load_config(cli);
    logging::init_logging(&file_config.log_level, cli.verbose);

    let config = file_config.merge_with_cli(&cli.overrides(), &cli.video_dir);

    std::fs::create_dir_all(&config.video_dir).with_context(|| {
        format!(
            "Failed to create video directory {}",
            config.video_dir.display()
        )
    })?;

    let bind_ip = config
        .bind_ip()
        .with_context(|| format!("Invalid bind address: {}", config.bind))?;

    let Some(port) = find_available_port_on(bind_ip, config.port) else {
        bail!("Failed to find available port");
    };
    if port != config.port {
        tracing::info!(requested = config.port, port, "Default port busy, using next free port");
    }

    let Some(ip) = get_local_ip() else {
        bail!("Failed to get local IP");
    };

    let server = WebServer::with_config(config.with_port(port))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server.run(ip))?;

    Ok(())
}
