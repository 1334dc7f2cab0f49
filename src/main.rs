use clap::{Args, Parser, Subcommand};
use colored::*;
use rcover::{
    codec,
    logger::{self, LogLevel, LoggerConfig},
    models::{parse_titles, GenerationConfig, ImageQuality, ImageSize, PartialConfig},
    pipeline::normalized_titles,
    present::{should_offer_share, Presenter},
    Config, CoverError, CoverPipeline, ProviderKind, Providers, RunHandler,
};
use std::env;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rcover")]
#[command(about = "Generate AI book cover designs from a list of titles")]
#[command(version)]
struct Cli {
    /// Generation provider (defaults to RCOVER_PROVIDER, then openai)
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Directory covers are written to (defaults to RCOVER_OUTPUT_DIR, then generated_covers)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write log lines to stderr as JSON (append to a file with RCOVER_LOG_FILE)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Options that make up a generation configuration.
#[derive(Args, Clone, Default)]
struct ConfigArgs {
    /// Book titles, one per argument
    titles: Vec<String>,

    /// Read titles from a file, one per line
    #[arg(long)]
    titles_file: Option<PathBuf>,

    /// Variations per book
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    variations: Option<u8>,

    /// low, medium, high or auto
    #[arg(long)]
    quality: Option<ImageQuality>,

    /// 1024x1024, 1024x1536, 1536x1024 or auto
    #[arg(long)]
    size: Option<ImageSize>,

    /// System prompt for description generation
    #[arg(long, conflicts_with = "system_prompt_file")]
    system_prompt: Option<String>,

    /// Read the system prompt from a file
    #[arg(long)]
    system_prompt_file: Option<PathBuf>,

    /// Start from a shared configuration link
    #[arg(long)]
    share: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate covers for the given titles
    Generate {
        #[command(flatten)]
        config: ConfigArgs,

        /// OpenAI API key (defaults to OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Print a shareable link for a configuration
    Share {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show what a shared link decodes to
    Decode {
        /// Link or query string
        link: String,
    },
    /// Enter titles repeatedly and keep the last result around
    Interactive {
        #[command(flatten)]
        config: ConfigArgs,

        /// OpenAI API key (defaults to OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        env::var("RCOVER_LOG")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(LogLevel::Info)
    };
    let log_file = env::var("RCOVER_LOG_FILE").ok();
    let log_config = LoggerConfig::for_cli(level, cli.log_json, log_file.as_deref());
    if let Err(e) = logger::init_with_config(log_config) {
        eprintln!("{}", e);
    }
    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "❌".red(), e.to_string().red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Config::from_env()?;
    if let Some(provider) = cli.provider {
        settings = settings.with_provider(provider);
    }
    if let Some(output) = cli.output {
        settings = settings.with_output_dir(output);
    }

    match cli.command {
        Command::Generate { config, api_key } => {
            let (generation, from_link) = resolve(&config)?;
            // Reject empty input before asking for credentials or touching the network.
            normalized_titles(&generation.book_titles)?;
            let settings = with_credentials(settings, api_key)?;
            logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            logger::log_config_info(&settings);

            let providers = Providers::connect(&settings).await?;
            let mut handler = RunHandler::new(CoverPipeline::from_config(providers, &settings));
            let mut presenter = Presenter::stdout();

            let report = handler.submit(&generation).await?;
            presenter.announce(&report.config)?;
            presenter.report(report)?;
            if should_offer_share(&report.config, from_link) {
                presenter.share(settings.share_base_url(), &report.config)?;
            }
        }
        Command::Share { config } => {
            let (generation, _) = resolve(&config)?;
            println!("{}", codec::share_url(settings.share_base_url(), &generation));
        }
        Command::Decode { link } => {
            let partial = codec::decode(&link);
            println!("{}", serde_json::to_string_pretty(&partial)?);
        }
        Command::Interactive { config, api_key } => {
            let (base, from_link) = resolve(&config)?;
            let settings = with_credentials(settings, api_key)?;
            logger::log_config_info(&settings);

            let providers = Providers::connect(&settings).await?;
            let handler = RunHandler::new(CoverPipeline::from_config(providers, &settings));
            interactive(handler, base, from_link, &settings).await?;
        }
    }

    Ok(())
}

/// Defaults, overridden by a shared link, overridden by explicit flags.
fn resolve(args: &ConfigArgs) -> Result<(GenerationConfig, bool), CoverError> {
    let from_link = args
        .share
        .as_deref()
        .map(codec::decode)
        .unwrap_or_default();
    let loaded_from_link = !from_link.is_empty();

    let system_prompt = match &args.system_prompt_file {
        Some(path) => Some(fs::read_to_string(path).map_err(|e| CoverError::io(path, e))?),
        None => args.system_prompt.clone(),
    };

    let mut titles = args.titles.clone();
    if let Some(path) = &args.titles_file {
        let text = fs::read_to_string(path).map_err(|e| CoverError::io(path, e))?;
        titles.extend(parse_titles(&text));
    }

    let explicit = PartialConfig {
        system_prompt,
        variation_count: args.variations,
        image_quality: args.quality,
        image_size: args.size,
        book_titles: if titles.is_empty() { None } else { Some(titles) },
    };

    let config = GenerationConfig::default().merge(from_link).merge(explicit);
    Ok((config, loaded_from_link))
}

/// Fill in a missing OpenAI key from the flag or, on a terminal, by asking.
fn with_credentials(mut settings: Config, api_key: Option<String>) -> Result<Config, CoverError> {
    if settings.provider == ProviderKind::OpenAi && settings.openai.api_key.is_none() {
        let key = match api_key {
            Some(key) => Some(key),
            None if io::stdin().is_terminal() => prompt_line("Enter your OpenAI API key: ")?,
            None => None,
        };
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            settings.openai.api_key = Some(key.trim().to_string());
        }
    }
    settings.require_credentials()?;
    Ok(settings)
}

fn prompt_line(prompt: &str) -> Result<Option<String>, CoverError> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", prompt).and_then(|_| stderr.flush()).map_err(|e| CoverError::io("<stderr>", e))?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| CoverError::io("<stdin>", e))?;
    Ok((read > 0).then(|| line.trim_end_matches(['\r', '\n']).to_string()))
}

async fn interactive(
    mut handler: RunHandler,
    base: GenerationConfig,
    from_link: bool,
    settings: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut presenter = Presenter::stdout();
    let stdin = io::stdin();

    loop {
        println!(
            "\n{}",
            "Enter book titles, one per line, then an empty line. Commands: :last, :share, :clear, :quit"
                .bright_black()
        );

        let mut block = Vec::new();
        let mut eof = false;
        loop {
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                eof = true;
                break;
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            if line.trim().is_empty() {
                break;
            }
            let is_command = block.is_empty() && line.starts_with(':');
            block.push(line);
            if is_command {
                break;
            }
        }

        let first = block.first().map(|first| first.trim().to_string());
        match first.as_deref() {
            Some(":quit") => break,
            Some(":clear") => {
                handler.session_mut().clear();
                println!("Cleared the last result.");
            }
            Some(":last") => match handler.session().last() {
                Some(report) => presenter.redisplay(report)?,
                None => println!("No covers generated yet."),
            },
            Some(":share") => {
                let config = handler
                    .session()
                    .last()
                    .map(|report| report.config.clone())
                    .unwrap_or_else(|| base.clone());
                presenter.share(settings.share_base_url(), &config)?;
            }
            Some(command) if command.starts_with(':') => {
                println!("Unknown command '{}'", command);
            }
            _ if eof && block.is_empty() => break,
            _ => {
                let config = GenerationConfig {
                    book_titles: block,
                    ..base.clone()
                };
                match handler.submit(&config).await {
                    Ok(report) => {
                        presenter.announce(&report.config)?;
                        presenter.report(report)?;
                        if should_offer_share(&report.config, from_link) {
                            presenter.share(settings.share_base_url(), &report.config)?;
                        }
                    }
                    Err(e) if e.is_precheck() => eprintln!("{} {}", "❌".red(), e),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if eof {
            break;
        }
    }

    Ok(())
}
