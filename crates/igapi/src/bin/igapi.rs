//! Command-line front end.
//!
//! Credentials come from `IGAPI_USERNAME` / `IGAPI_PASSWORD` when both are
//! set, otherwise from the credential file.
//!
//! Usage:
//!   igapi login --save
//!   igapi followers 123456 --amount 500
//!   igapi hashtag rust --amount 50

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use igapi::{
    ClientConfig, CredentialStore, Credentials, FileCredentialStore, IgClient, PaginationResult,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use telemetry::TelemetryConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "igapi", about = "Instagram private API client", version)]
struct Opts {
    /// Credential file (default: <config dir>/igapi/credentials.json)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Append-only request log
    #[arg(long, global = true, default_value = "igapi.log")]
    request_log: PathBuf,

    /// HTTP or SOCKS5 proxy
    #[arg(long, global = true)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the session identifiers
    Login {
        /// Store the credentials for later runs
        #[arg(long)]
        save: bool,
    },
    /// Every follower of a user
    Followers {
        user_id: String,
        #[arg(long)]
        amount: Option<usize>,
    },
    /// Every account a user follows
    Followings {
        user_id: String,
        #[arg(long)]
        amount: Option<usize>,
    },
    /// Every post of a user
    UserFeed {
        user_id: String,
        #[arg(long)]
        min_timestamp: Option<i64>,
    },
    /// Recent posts for a hashtag
    Hashtag {
        tag: String,
        #[arg(long, default_value_t = 100)]
        amount: usize,
    },
    /// Liked posts of the logged-in account
    Liked {
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Log out on the server
    Logout {
        /// Also delete the stored credentials
        #[arg(long)]
        forget: bool,
    },
}

fn env_credentials() -> Option<Credentials> {
    let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    Some(Credentials::new(get("IGAPI_USERNAME")?, get("IGAPI_PASSWORD")?))
}

fn print_scan<T: Serialize>(result: &PaginationResult<T>) -> Result<()> {
    let out = json!({
        "count": result.len(),
        "items": result.items,
        "exhausted": result.exhausted,
        "truncated_by_cap": result.truncated_by_cap,
        "inaccessible": result.inaccessible,
        "interrupted": result.interrupted.as_ref().map(|e| e.to_string()),
        "next_cursor": result.next_cursor.as_ref().map(|c| c.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    let mut log_config = TelemetryConfig::from_env();
    if log_config.request_log.is_none() {
        log_config = log_config.with_request_log(&opts.request_log);
    }
    telemetry::init_with_config("igapi", log_config).context("initialising logging")?;

    let mut config = ClientConfig::from_env();
    if let Some(proxy) = opts.proxy.as_deref() {
        config = config.with_proxy(proxy);
    }
    let store = Arc::new(match opts.credentials {
        Some(path) => FileCredentialStore::new(path),
        None => FileCredentialStore::with_default_path(),
    });
    let mut client = IgClient::with_config(config)?.with_credential_store(store.clone());

    let from_env = env_credentials();
    match from_env.clone() {
        Some(credentials) => client.login(credentials, false).await,
        None => client.login_from_store(false).await,
    }
    .context("login failed")?;

    match opts.command {
        Command::Login { save } => {
            if save && let Some(credentials) = from_env.as_ref() {
                store.save(credentials).await?;
                info!(path = %store.path().display(), "credentials saved");
            }
            let session = client.session();
            let out = json!({
                "username": session.username(),
                "user_id": session.user_id()?,
                "rank_token": session.rank_token()?,
                "device_id": session.device_id(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Followers { user_id, amount } => {
            print_scan(&client.total_followers(&user_id, amount).await?)?;
        }
        Command::Followings { user_id, amount } => {
            print_scan(&client.total_followings(&user_id, amount).await?)?;
        }
        Command::UserFeed {
            user_id,
            min_timestamp,
        } => {
            print_scan(&client.total_user_feed(&user_id, min_timestamp).await?)?;
        }
        Command::Hashtag { tag, amount } => {
            print_scan(&client.total_hashtag_feed(&tag, Some(amount)).await?)?;
        }
        Command::Liked { pages } => {
            print_scan(&client.total_liked_media(pages).await?)?;
        }
        Command::Logout { forget } => {
            client.logout().await?;
            if forget {
                store.erase().await?;
                info!(path = %store.path().display(), "credentials erased");
            }
            println!("{}", json!({ "logged_out": true }));
        }
    }
    Ok(())
}
