mod args;
mod ledger_store;
mod logging;
mod op;
mod ops;
mod state;

use anyhow::Context;
use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{
    Contact, Group, Hash, Init, Keygen, Ledger, ReadMessage, SendMessage, Sign, Verify, Version,
};
use tracing::level_filters::LevelFilter;

command_enum! {
    (Init, Init),
    (Keygen, Keygen),
    (Hash, Hash),
    (Sign, Sign),
    (Verify, Verify),
    (Send, SendMessage),
    (Read, ReadMessage),
    (Contact, Contact),
    (Group, Group),
    (Ledger, Ledger),
    (Version, Version),
}

/// `--log-level`, then the configured level, then `info`
fn resolve_log_level(args: &Args) -> anyhow::Result<LevelFilter> {
    let configured = state::AppState::load(args.config_path.clone())
        .ok()
        .map(|state| state.config.log_level);

    let level = args
        .log_level
        .clone()
        .or(configured)
        .unwrap_or_else(|| "info".to_string());

    level
        .parse::<LevelFilter>()
        .with_context(|| format!("invalid log level {:?}", level))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = match resolve_log_level(&args) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };
    let guard = logging::init_logging(level);

    let ctx = op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}
