mod boot;
mod cli;
mod commands;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn init_logging(directive: &str) {
    let filter = match directive.parse() {
        Ok(d) => EnvFilter::from_default_env().add_directive(d),
        Err(e) => {
            eprintln!("invalid log level '{directive}': {e}");
            EnvFilter::from_default_env()
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // `.env` only fills the override names the config reads; it never
    // touches the process environment.
    let dotenv = igame_config::DotEnv::discover();
    let config = match igame_config::load_config_with(args.config.as_deref(), &dotenv) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Config load failed: {e}");
            None
        }
    };
    let directive = args
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.logging.directive()))
        .unwrap_or_else(|| "igame=info".to_string());
    init_logging(&directive);

    let Some(config) = config else {
        return ExitCode::FAILURE;
    };
    tracing::info!("iGame v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!(base_url = %config.api.base_url, "config loaded");

    let ctx = match boot::AppContext::boot(config, args.token) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Start-up failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = commands::run(&ctx, args.command).await;
    ctx.save_cookies();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
