use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use zksession::routes::LANDING_ROUTE;
use zksession::token;
use zksession::{
    Collaborators, FileStorage, HttpProfileStore, IdentityTemplate, LocalCustodyFlow, ManagerOptions, Navigator,
    Network, ProfilePoller, RouteHistory, SessionConfig, SessionError, SessionManager, SuiRpcClient,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "zksession", about = "zkLogin wallet session manager")]
struct Cli {
    /// Session storage file (overrides `ZKSESSION_STORAGE_PATH`).
    #[arg(long)]
    storage: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the restored session.
    Status,
    /// Print the login-provider authorization URL.
    LoginUrl {
        #[arg(long, value_parser = parse_network)]
        network: Option<Network>,
    },
    /// Record a finished provider login and derive the session identity.
    CompleteLogin {
        #[arg(long)]
        jwt: String,
        #[arg(long)]
        address: String,
    },
    /// Print the native-token balance of the session address.
    Balance,
    /// Poll the profile and print every change.
    Watch {
        /// Stop after this many seconds instead of waiting for Ctrl-C.
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Tear down the session.
    Logout,
}

fn parse_network(raw: &str) -> Result<Network, String> {
    raw.parse::<Network>().map_err(|e| e.to_string())
}

struct App {
    manager: Arc<SessionManager>,
    custody: Arc<LocalCustodyFlow>,
    navigator: Arc<RouteHistory>,
    poll_interval: Duration,
}

fn build_app(cli: &Cli) -> Result<App, CliError> {
    let mut config = SessionConfig::from_env()?;
    if let Some(path) = &cli.storage {
        config.storage_path.clone_from(path);
    }

    let storage = Arc::new(FileStorage::open(&config.storage_path)?);
    debug!(path = %storage.path().display(), "session storage opened");
    let custody = Arc::new(LocalCustodyFlow::new(storage.clone()));
    let navigator = Arc::new(RouteHistory::new(LANDING_ROUTE));
    let profiles = Arc::new(HttpProfileStore::new(&config.profile_url, config.http_timeout)?);
    let balances = Arc::new(SuiRpcClient::new(&config.rpc_url, config.http_timeout)?);

    let manager = Arc::new(SessionManager::new(
        Collaborators {
            custody: custody.clone(),
            storage,
            navigator: navigator.clone(),
            profiles,
            balances,
        },
        ManagerOptions {
            origin: config.origin.clone(),
            client_id: config.client_id.clone(),
            baseline_network: config.default_network,
            template: IdentityTemplate::default(),
        },
    ));

    Ok(App { manager, custody, navigator, poll_interval: config.poll_interval })
}

impl App {
    /// Bootstrap from storage, then merge the custody token if there is one.
    ///
    /// A token that cannot be merged only skips the derived identity.
    fn start(&self) {
        self.manager.bootstrap();
        if let Err(e) = self.manager.sync_custody_session() {
            warn!(error = %e, code = e.error_code(), "custody token not merged");
        }
    }

    /// Record a finished provider login. The token is decoded before anything
    /// is stored, so a malformed token leaves storage untouched.
    fn complete_login(&self, jwt: &str, address: &str) -> Result<(), CliError> {
        token::decode_claims(jwt)?;
        self.custody.complete_login(jwt, address);
        self.start();
        Ok(())
    }

    fn print_view(&self) -> Result<(), CliError> {
        let mut view = serde_json::to_value(self.manager.view())?;
        view["route"] = serde_json::Value::String(self.navigator.current_route());
        println!("{}", serde_json::to_string_pretty(&view)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = build_app(&cli)?;

    match cli.command {
        Command::Status => {
            app.start();
            app.print_view()
        }
        Command::LoginUrl { network } => {
            app.manager.bootstrap();
            let url = app.manager.redirect_to_auth_url(network).await?;
            println!("{url}");
            Ok(())
        }
        Command::CompleteLogin { jwt, address } => {
            app.complete_login(&jwt, &address)?;
            app.print_view()
        }
        Command::Balance => {
            app.start();
            let balance = app.manager.get_balance().await?;
            println!("{balance}");
            Ok(())
        }
        Command::Watch { seconds } => {
            app.start();
            run_watch(&app, seconds.map(Duration::from_secs)).await
        }
        Command::Logout => {
            app.manager.bootstrap();
            app.manager.logout().await?;
            app.print_view()
        }
    }
}

async fn run_watch(app: &App, limit: Option<Duration>) -> Result<(), CliError> {
    let poller = ProfilePoller::spawn(app.manager.clone(), app.poll_interval);
    let mut rx = app.manager.subscribe();
    let mut last = rx.borrow_and_update().profile.clone();

    let stop = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "ctrl-c handler unavailable");
                }
            }
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            () = &mut stop => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let profile = rx.borrow_and_update().profile.clone();
                if profile != last {
                    println!("{}", serde_json::to_string(&profile)?);
                    last = profile;
                }
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
