//! aora-account - Create and sign in to Aora accounts
//!
//! Sessions live only as long as the process; every command talks to the
//! backend directly.

use anyhow::Result;
use clap::{Parser, Subcommand};
use libaora::logging::LoggingConfig;
use libaora::service::validation::{SignInForm, SignUpForm};
use libaora::service::AoraService;
use libaora::{AoraError, Config, User};
use secrecy::SecretString;
use tracing::debug;

#[derive(Parser)]
#[command(name = "aora-account")]
#[command(version, about = "Create and sign in to Aora accounts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account and sign in to it
    SignUp {
        /// Email address for the new account
        #[arg(long)]
        email: String,

        /// Public user name shown next to uploads
        #[arg(long)]
        user_name: String,
    },

    /// Sign in to an existing account
    SignIn {
        /// Account email
        #[arg(long)]
        email: String,
    },

    /// Show the signed-in account, if any
    Whoami,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run_command(cli.command).await {
        let (message, code) = match e.downcast_ref::<AoraError>() {
            Some(aora) => (aora.user_message(), aora.exit_code()),
            None => (e.to_string(), 1),
        };
        eprintln!("Error: {}", message);
        std::process::exit(code);
    }
}

async fn run_command(command: Commands) -> Result<()> {
    let service = AoraService::from_config(Config::load()?)?;

    match command {
        Commands::SignUp { email, user_name } => {
            let password = read_password()?;
            let user = service
                .account()
                .sign_up(SignUpForm {
                    user_name,
                    email,
                    password,
                })
                .await?;
            println!("Signed up as {}", describe(&user));
        }
        Commands::SignIn { email } => {
            let password = read_password()?;
            let user = service
                .account()
                .sign_in(SignInForm { email, password })
                .await?;
            println!("Signed in as {}", describe(&user));
        }
        Commands::Whoami => {
            let state = service.account().restore().await;
            debug!(logged_in = state.is_logged_in, "Session checked");
            match state.user {
                Some(user) => println!("{}", describe(&user)),
                None => println!("Not signed in"),
            }
        }
    }

    Ok(())
}

fn describe(user: &User) -> String {
    format!("@{} <{}> (account {})", user.user_name, user.email, user.account_id)
}

fn read_password() -> Result<SecretString> {
    if let Ok(password) = std::env::var("AORA_PASSWORD") {
        return Ok(SecretString::from(password));
    }

    if !atty::is(atty::Stream::Stdin) {
        return Err(AoraError::InvalidInput(
            "Not a TTY. Set AORA_PASSWORD to provide the password non-interactively.".to_string(),
        )
        .into());
    }

    let password = rpassword::prompt_password("Password: ")?;
    Ok(SecretString::from(password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use libaora::gateway::mock::mock_user;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sign_up_requires_user_name() {
        assert!(Cli::try_parse_from(["aora-account", "sign-up", "--email", "a@b.c"]).is_err());
        assert!(Cli::try_parse_from([
            "aora-account",
            "sign-up",
            "--email",
            "a@b.c",
            "--user-name",
            "abc"
        ])
        .is_ok());
    }

    #[test]
    fn test_describe_user() {
        let user = mock_user("acc-1", "jsm");
        assert_eq!(describe(&user), "@jsm <jsm@example.com> (account acc-1)");
    }
}
