mod echo;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use legible_core::dom::Fragment;
use legible_core::{
    ExtractConfig, FetchConfig, HttpFetcher, MemoryStore, PageRecord, Pipeline, RecordStatus, RecordStore,
    SanitizeConfig, clean_page, sanitize_fragment_with,
};
use owo_colors::OwoColorize;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for cleaned content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Html,
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: html, text, json", s)),
        }
    }
}

/// Reduce web pages to clean, text-only HTML
#[derive(Parser, Debug)]
#[command(name = "legible")]
#[command(author = "Legible Contributors")]
#[command(version = VERSION)]
#[command(about = "Reduce web pages to clean, text-only HTML", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (html, text, json)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: OutputFormat,

    /// Sanitize the input as a raw fragment, skipping content extraction
    #[arg(long)]
    fragment: bool,

    /// Allow the legacy vocabulary (mark/hr tags, id attribute)
    #[arg(long)]
    legacy: bool,

    /// HTTP read timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value = "10", value_name = "SECS")]
    connect_timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable verbose progress output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.verbose {
        echo::print_banner();
    }

    let extract = ExtractConfig::default();
    let sanitize = SanitizeConfig { legacy: args.legacy, ..Default::default() };

    let is_url = args.input.starts_with("http://") || args.input.starts_with("https://");
    let output = if is_url {
        let record = process_url(&args, &extract, &sanitize).await?;

        if record.status == RecordStatus::Failed {
            echo::print_error(&record.html_content);
            anyhow::bail!("processing failed: {}", record.html_content);
        }
        if args.verbose {
            echo::print_info(&format!("Title: {}", record.title));
        }

        match args.format {
            OutputFormat::Html => record.html_content.clone(),
            OutputFormat::Text => Fragment::parse_fragment(&record.html_content).text(),
            OutputFormat::Json => serde_json::to_string_pretty(&record).context("Failed to serialize record")?,
        }
    } else {
        let html = read_local_input(&args)?;
        if args.verbose {
            echo::print_step(2, 3, "Cleaning content");
        }

        let (title, html_content) = if args.fragment {
            (String::new(), sanitize_fragment_with(&html, &sanitize))
        } else {
            let page = clean_page(&html, &extract, &sanitize);
            (page.title, page.html_content)
        };

        if args.verbose && !title.is_empty() {
            echo::print_info(&format!("Title: {}", title));
        }

        match args.format {
            OutputFormat::Html => html_content,
            OutputFormat::Text => Fragment::parse_fragment(&html_content).text(),
            OutputFormat::Json => {
                let value = serde_json::json!({ "title": title, "html_content": html_content });
                serde_json::to_string_pretty(&value).context("Failed to serialize output")?
            }
        }
    };

    if args.verbose {
        echo::print_step(3, 3, "Writing output");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}

/// Runs the full fetch pipeline against an in-memory record and returns it.
async fn process_url(args: &Args, extract: &ExtractConfig, sanitize: &SanitizeConfig) -> anyhow::Result<PageRecord> {
    if args.verbose {
        echo::print_step(1, 3, &format!("Fetching from {}", args.input.bright_white().underline()));
    }

    let store = MemoryStore::new();
    let record = store.create(&args.input)?;

    let mut pipeline = Pipeline::new(store, HttpFetcher);
    pipeline.fetch = FetchConfig {
        connect_timeout: args.connect_timeout,
        read_timeout: args.timeout,
        user_agent: args
            .user_agent
            .clone()
            .unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    pipeline.extract = extract.clone();
    pipeline.sanitize = sanitize.clone();

    pipeline.process(record.id, &args.input).await;

    let record = pipeline.store().load(record.id)?;
    if args.verbose {
        echo::print_info(&format!("Size: {}", echo::format_size(record.html_content.len())));
    }
    Ok(record)
}

/// Reads HTML from stdin or a local file.
fn read_local_input(args: &Args) -> anyhow::Result<String> {
    if args.input == "-" {
        if args.verbose {
            echo::print_step(1, 3, "Reading from stdin");
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        if args.verbose {
            echo::print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
        }
        fs::read_to_string(&args.input).with_context(|| format!("Failed to read file: {}", args.input))
    }
}
