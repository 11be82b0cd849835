use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use linkcard::{CardConfig, CardGenerator, CardRequest, StyleRegistry};

/// Render a PNG link card (title, description and QR code) for a web page.
#[derive(Parser, Debug)]
#[command(name = "linkcard", version, about)]
struct Cli {
    /// Page URL; a bare hostname gets https://
    #[arg(required_unless_present = "list_styles")]
    url: Option<String>,

    /// Card style id
    #[arg(short, long, default_value = "white")]
    style: String,

    /// Custom title (max 40 characters); skips fetching the page title
    #[arg(short, long)]
    title: Option<String>,

    /// Custom description (max 150 characters)
    #[arg(short, long)]
    description: Option<String>,

    /// Output file
    #[arg(short, long, default_value = "card.png")]
    out: PathBuf,

    /// Extra font file, may be repeated (tried before system fonts)
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Do not fall back to installed system fonts
    #[arg(long)]
    no_system_fonts: bool,

    /// Metadata fetch timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// List the available styles and exit
    #[arg(long)]
    list_styles: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    title: &'a str,
    description: &'a str,
    width: u32,
    height: u32,
    sha256: String,
    path: &'a std::path::Path,
}

fn list_styles() {
    for style in StyleRegistry::global().iter() {
        println!(
            "{:<8} {} - {} ({}x{})",
            style.id, style.name, style.summary, style.width, style.height
        );
    }
}

fn run(cli: Cli, url: String) -> anyhow::Result<ExitCode> {
    let defaults = CardConfig::default();
    let mut font_paths = cli.fonts;
    font_paths.extend(defaults.font_paths.iter().cloned());
    let config = CardConfig {
        timeout_ms: cli.timeout_ms,
        load_system_fonts: !cli.no_system_fonts,
        font_paths,
        ..defaults
    };

    let mut request = CardRequest::new(url, cli.style);
    request.custom_title = cli.title;
    request.custom_description = cli.description;

    // Validation errors are reported before fonts are loaded
    let card = match request
        .validate()
        .and_then(|_| CardGenerator::new(config))
        .and_then(|generator| generator.generate(&request))
    {
        Ok(card) => card,
        Err(err) => {
            eprintln!("{}", serde_json::to_string(&err.to_body())?);
            return Ok(if err.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            });
        }
    };

    std::fs::write(&cli.out, &card.png)
        .with_context(|| format!("writing {}", cli.out.display()))?;

    if cli.json {
        let out = Output {
            title: &card.title,
            description: &card.description,
            width: card.width,
            height: card.height,
            sha256: card.digest(),
            path: &cli.out,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", card.title);
        println!("{}", card.description);
        println!("wrote {} ({}x{})", cli.out.display(), card.width, card.height);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut cli = Cli::parse();
    if cli.list_styles {
        list_styles();
        return ExitCode::SUCCESS;
    }

    let Some(url) = cli.url.take() else {
        eprintln!("a URL is required");
        return ExitCode::from(2);
    };

    match run(cli, url) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("linkcard: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
