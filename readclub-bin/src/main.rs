use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use readclub_core::{
    config::Config,
    session::{MemoryNavigator, Navigator},
    transport::RequestOptions,
    ApiClient, ApiError,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "readclub API smoke tool", long_about = None)]
struct Cli {
    /// Config file (JSON or TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Base endpoint, used when no config file is given
    #[arg(long, default_value = "http://localhost:8080/api")]
    base: String,

    /// Enable request diagnostics
    #[arg(long)]
    dev: bool,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', global = true)]
    query: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path and print its data
    Get { path: String },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(short, long, help = "JSON request body")]
        body: Option<String>,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(short, long, help = "JSON request body")]
        body: Option<String>,
    },
    /// PATCH a JSON body
    Patch {
        path: String,
        #[arg(short, long, help = "JSON request body")]
        body: Option<String>,
    },
    /// DELETE a path
    Delete { path: String },
}

fn parse_body(body: Option<String>) -> anyhow::Result<Option<Value>> {
    body.map(|b| serde_json::from_str(&b))
        .transpose()
        .map_err(|e| anyhow::anyhow!("body is not valid JSON: {e}"))
}

fn options(query: &[String]) -> anyhow::Result<Option<RequestOptions>> {
    if query.is_empty() {
        return Ok(None);
    }
    let mut opts = RequestOptions::new();
    for pair in query {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("query '{pair}' must be key=value"))?;
        opts = opts.query(k, v);
    }
    Ok(Some(opts))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::new(cli.base.clone()),
    };
    cfg.dev_mode |= cli.dev;

    let navigator = Arc::new(MemoryNavigator::default());
    let client = ApiClient::from_config(&cfg, navigator.clone())?;
    client.setup_interceptors();
    let opts = options(&cli.query)?;

    let result: Result<Value, ApiError> = match cli.command {
        Commands::Get { path } => client.get(&path, opts).await,
        Commands::Post { path, body } => client.post(&path, parse_body(body)?.as_ref(), opts).await,
        Commands::Put { path, body } => client.put(&path, parse_body(body)?.as_ref(), opts).await,
        Commands::Patch { path, body } => client.patch(&path, parse_body(body)?.as_ref(), opts).await,
        Commands::Delete { path } => client.delete(&path, opts).await,
    };

    match result {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Err(err) => {
            eprintln!("[{} {}] {}", err.status, err.code, err.user_message());
            if navigator.navigations() > 0 {
                eprintln!("session expired; sign in again at {}", navigator.current_path());
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
