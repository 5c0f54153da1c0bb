use clap::{Args, Parser, Subcommand};
use session_client::{
    ClientConfig, ConfigError, LoginCredentials, RegisterCredentials, SessionClient, SessionError, SessionState,
    TransportError,
};

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("state encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session error: {0}")]
    Session(String),
}

#[derive(Parser, Debug)]
#[command(name = "session-client", about = "Probe a cookie-session backend's CSRF and auth flow")]
struct Cli {
    #[arg(long, env = "SESSION_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prime CSRF and fetch the current user.
    Whoami,
    /// Log in and fetch the user.
    Login(LoginArgs),
    /// Register and fetch the new user.
    Register(RegisterArgs),
    /// Log in, then log out again.
    Cycle(LoginArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "SESSION_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "SESSION_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, help = "Defaults to --password")]
    password_confirmation: Option<String>,
}

impl LoginArgs {
    fn credentials(&self) -> LoginCredentials {
        LoginCredentials::new(self.email.as_str(), self.password.as_str())
    }
}

#[tokio::main]
async fn main() -> Result<(), ProbeError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env_with_base_url(cli.base_url)?;

    let client = SessionClient::bootstrap(config).await?;
    let session = client.session();

    match cli.command {
        Command::Whoami => settle(session.fetch_user().await),
        Command::Login(args) => settle(session.login(&args.credentials()).await),
        Command::Register(args) => {
            let mut credentials = RegisterCredentials::new(args.name, args.email, args.password);
            if let Some(confirmation) = args.password_confirmation {
                credentials.password_confirmation = confirmation;
            }
            settle(session.register(&credentials).await);
        }
        Command::Cycle(args) => {
            if session.login(&args.credentials()).await.is_ok() {
                print_state(&session.snapshot())?;
                settle(session.logout().await);
            }
        }
    }

    let state = session.snapshot();
    print_state(&state)?;
    match state.error {
        Some(message) => Err(ProbeError::Session(message)),
        None => Ok(()),
    }
}

/// Failures are already recorded in the session state, which `main` prints
/// and checks; only note which operation produced them.
fn settle<T>(outcome: Result<T, SessionError>) {
    if let Err(e) = outcome {
        tracing::debug!(operation = %e.operation, "probe operation failed");
    }
}

fn print_state(state: &SessionState) -> Result<(), ProbeError> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
