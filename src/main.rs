use actionfold::{ServeError, ServerConfig, serve};
use clap::Parser;
use std::path::PathBuf;

/// Serve user/action analytics over HTTP.
#[derive(Parser, Debug)]
#[command(name = "actionfold", version, about, long_about = None)]
struct Args {
    /// JSON array of users (`.zst` allowed)
    #[arg(long, env = "ACTIONFOLD_USERS", default_value = "users.json")]
    users: PathBuf,

    /// Action log as a JSON array or JSON Lines, in chronological order (`.zst` allowed)
    #[arg(long, env = "ACTIONFOLD_ACTIONS", default_value = "actions.json")]
    actions: PathBuf,

    /// Address to listen on
    #[arg(long, env = "ACTIONFOLD_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            users_path: args.users,
            actions_path: args.actions,
            addr: args.addr,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    if let Err(e) = run(config).await {
        log::error!("actionfold: {e}");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), ServeError> {
    // Load failures are fatal: nothing is served from a partial dataset.
    let dataset = config.load_dataset()?;
    serve(&config, dataset).await
}
