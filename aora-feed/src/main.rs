//! aora-feed - Browse Aora video feeds from the terminal

use anyhow::Result;
use clap::{Parser, Subcommand};
use libaora::logging::LoggingConfig;
use libaora::service::events::EventReceiver;
use libaora::service::validation::SignInForm;
use libaora::service::AoraService;
use libaora::{AoraError, Config, FetchController, FetchState, Video};
use secrecy::SecretString;

#[derive(Parser, Debug)]
#[command(name = "aora-feed")]
#[command(version, about = "Browse Aora video feeds")]
#[command(long_about = r#"Browse Aora video feeds: the home feed, the latest uploads, title search,
and the videos of a signed-in account.

EXAMPLES:
    # Every video
    aora-feed home

    # The newest uploads
    aora-feed latest
    aora-feed latest --limit 3

    # Search titles
    aora-feed search "sunset"

    # Your own uploads (password from AORA_PASSWORD or a prompt)
    aora-feed profile --email jsm@example.com

    # Fetch twice, like pull-to-refresh
    aora-feed home --refresh

    # JSON output for scripting
    aora-feed latest --format json | jq '.[] | .title'

OUTPUT FORMATS:
    text  - One line per video (default)
    json  - JSON array
    jsonl - JSON lines, one video per line

EXIT CODES:
    0 - Success (including empty results)
    1 - Gateway or network error
    2 - Authentication error
    3 - Invalid input
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT", global = true)]
    #[arg(value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Fetch a second time after the first result settles
    #[arg(long, global = true)]
    refresh: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Every video
    Home,

    /// The newest videos
    Latest {
        /// Maximum number of videos (default from config, 7)
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Videos whose title matches QUERY
    Search { query: String },

    /// Videos uploaded by the given account
    Profile {
        /// Account email; the password comes from AORA_PASSWORD or a prompt
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let (message, code) = match e.downcast_ref::<AoraError>() {
                Some(aora) => (aora.user_message(), aora.exit_code()),
                None => (e.to_string(), 1),
            };
            eprintln!("Error: {}", message);
            std::process::exit(code);
        }
    }
}

/// Run the command and return the exit code for a settled fetch
async fn run(cli: Cli) -> Result<i32> {
    let mut config = Config::load()?;
    if let Commands::Latest { limit: Some(limit) } = &cli.command {
        if *limit == 0 {
            return Err(AoraError::InvalidInput("--limit must be at least 1".to_string()).into());
        }
        config.feed.latest_limit = *limit;
    }

    let service = AoraService::from_config(config)?;
    let mut events = service.subscribe();

    let (controller, empty_title) = match &cli.command {
        Commands::Home => (service.videos().feed(), "Be the first one to upload a video"),
        Commands::Latest { .. } => (service.videos().latest(), "No recent uploads"),
        Commands::Search { query } => (
            service.videos().search(query)?,
            "No video found for this search query",
        ),
        Commands::Profile { email } => {
            let password = read_password()?;
            service
                .account()
                .sign_in(SignInForm {
                    email: email.clone(),
                    password,
                })
                .await?;
            (service.videos().profile(), "No videos uploaded yet")
        }
    };

    let state = fetch(&controller, cli.refresh).await;
    print_alerts(&mut events);
    render(&state, &cli.format, empty_title)?;

    Ok(if state.error.is_some() { 1 } else { 0 })
}

async fn fetch(controller: &FetchController<Video>, refresh: bool) -> FetchState<Video> {
    let mut state = match controller.start() {
        Some(task) => task.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Fetch task panicked");
            controller.state()
        }),
        None => controller.state(),
    };

    if refresh {
        tracing::debug!(label = controller.label(), "Refreshing");
        state = controller.refetch().await;
    }

    controller.dispose();
    state
}

/// Surface fetch failures the way the app shows its alert dialog
fn print_alerts(events: &mut EventReceiver) {
    while let Ok(event) = events.try_recv() {
        if let Some(alert) = event.alert() {
            eprintln!("Alert: {}", alert);
        }
    }
}

fn render(state: &FetchState<Video>, format: &str, empty_title: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&state.data)?);
        }
        "jsonl" => {
            for video in &state.data {
                println!("{}", serde_json::to_string(video)?);
            }
        }
        _ => {
            if state.is_empty_settled() {
                println!("No videos found");
                println!("{}", empty_title);
                return Ok(());
            }
            for video in &state.data {
                println!("{} (@{})", video.title, video.user.user_name);
                println!("    {}", video.video);
            }
        }
    }
    Ok(())
}

fn read_password() -> Result<SecretString> {
    if let Ok(password) = std::env::var("AORA_PASSWORD") {
        return Ok(SecretString::from(password));
    }

    if !atty::is(atty::Stream::Stdin) {
        return Err(AoraError::InvalidInput(
            "Not a TTY. Set AORA_PASSWORD to sign in non-interactively.".to_string(),
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

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_latest_with_limit() {
        let cli = Cli::try_parse_from(["aora-feed", "latest", "--limit", "3", "--format", "json"])
            .unwrap();
        assert_eq!(cli.format, "json");
        assert!(matches!(cli.command, Commands::Latest { limit: Some(3) }));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["aora-feed", "home", "--format", "csv"]).is_err());
    }
}
