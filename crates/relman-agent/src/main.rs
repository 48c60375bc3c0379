use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use relman_agent::console::{addressed, load_state};
use relman_agent::{logging, AgentConfig, Console, LogFormat, NoRepository, StdoutNotifier};
use relman_chat::{ChatCommandSource, ChatMessage};
use relman_core::{ArtifactFetcher, InMemoryPublisher};
use relman_maven::MavenArtifactFetcher;
use std::path::PathBuf;
use std::sync::Arc;

const STATE_HELP: &str = r#"The state file holds the committed tracks of every application:

  {"apps": {"com.example.wallet": {
      "tracks": [{"name": "internal", "version_codes": [5]},
                 {"name": "production", "version_codes": [4], "user_fraction": 0.0}],
      "last_version_code": 5}}}

A missing file starts empty. Use --register to add applications with empty
internal, alpha, beta and production tracks."#;

fn cli() -> Command {
    Command::new("relman")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Chat-driven release manager for app distribution tracks")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; environment variables override it"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .default_value("operator")
                .help("User id the console speaks as"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("console")
                .about("Read chat lines from stdin and run them against a local state file")
                .after_long_help(STATE_HELP)
                .arg(
                    Arg::new("state")
                        .long("state")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file holding the published tracks"),
                )
                .arg(
                    Arg::new("register")
                        .long("register")
                        .value_name("APP")
                        .action(ArgAction::Append)
                        .help("Add an application with empty tracks if the state lacks it"),
                ),
        )
        .subcommand(
            Command::new("parse")
                .about("Show the command a chat line would produce")
                .arg(
                    Arg::new("text")
                        .required(true)
                        .num_args(1..)
                        .trailing_var_arg(true)
                        .help("Chat text, with or without the bot mention"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };

    let mut config = AgentConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    if args.get_flag("log-json") {
        config.log_format = LogFormat::Json;
    }
    logging::init(config.log_format).context("installing log subscriber")?;

    let user = args
        .get_one::<String>("user")
        .cloned()
        .unwrap_or_else(|| "operator".to_string());

    match name {
        "console" => console(&config, args, user).await,
        "parse" => parse(&config, args, &user),
        _ => Ok(()),
    }
}

async fn console(config: &AgentConfig, args: &ArgMatches, user: String) -> Result<()> {
    let state_path = args
        .get_one::<PathBuf>("state")
        .cloned()
        .context("--state is required")?;

    let publisher = Arc::new(InMemoryPublisher::from_state(load_state(&state_path)?));
    let fetcher: Arc<dyn ArtifactFetcher> = if config.has_repository() {
        Arc::new(MavenArtifactFetcher::new(config.maven.clone()).context("configuring maven")?)
    } else {
        tracing::warn!("no artifact repository configured, deploy is unavailable");
        Arc::new(NoRepository)
    };

    let console = Console::new(config, publisher, fetcher, Arc::new(StdoutNotifier), user)?
        .with_state_path(state_path);

    for name in args.get_many::<String>("register").into_iter().flatten() {
        if console.register_app(name)? {
            tracing::info!(app = %name, "registered from command line");
        }
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console.run(stdin).await?;
    Ok(())
}

fn parse(config: &AgentConfig, args: &ArgMatches, user: &str) -> Result<()> {
    config.validate_chat()?;
    let source = ChatCommandSource::new(config.chat.clone())?;

    let text = args
        .get_many::<String>("text")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    let message =
        ChatMessage::new(config.chat.bot_channel_id.clone(), addressed(&config.chat, &text))
            .from_user(user);

    match source.accept(&message) {
        Some(Ok(request)) => {
            println!("{}", serde_json::to_string_pretty(&request.command)?);
            println!("privileged: {}", request.privileged);
            if request.command.requires_privilege() && !request.privileged {
                println!("note: {user} would be refused");
            }
        }
        Some(Err(error)) => println!("{}", error.user_message()),
        None => println!("ignored"),
    }
    Ok(())
}
