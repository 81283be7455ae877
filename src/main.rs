//! CLI entry point for `mhtml2html`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};

use mhtml2html::config::Config;
use mhtml2html::export::html::write_html;
use mhtml2html::inline::{ConvertOptions, Converter, Html5everParser};
use mhtml2html::model::Archive;
use mhtml2html::parser;

#[derive(Parser)]
#[command(
    name = "mhtml2html",
    version,
    about = "Convert MHTML web archives into self-contained HTML",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// MHTML file to convert
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output HTML file (standard output if omitted)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    convert: ConvertArgs,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Per-run overrides of the `[convert]` config section.
#[derive(Args, Debug, Default)]
struct ConvertArgs {
    /// Inline cid: frames as nested data: documents
    #[arg(long)]
    convert_iframes: bool,

    /// Do not add <base target> to <head>
    #[arg(long)]
    no_base: bool,

    /// Keep integrity attributes
    #[arg(long)]
    keep_integrity: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an archive to a single HTML file
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        args: ConvertArgs,
    },
    /// Show the archive's headers and parts
    Inspect {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the root HTML document without inlining anything
    Extract {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = mhtml2html::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            args,
        }) => cmd_convert(&input, output.as_deref(), &args, &config),
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json, &config),
        Some(Commands::Extract { input, output }) => cmd_extract(&input, output.as_deref()),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => match cli.input {
            Some(input) => cmd_convert(&input, cli.output.as_deref(), &cli.convert, &config),
            None => {
                Cli::command().print_help()?;
                anyhow::bail!("No input file given")
            }
        },
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = mhtml2html::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mhtml2html.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Config defaults with command-line overrides applied.
fn convert_options(args: &ConvertArgs, config: &Config) -> ConvertOptions {
    let mut options = ConvertOptions::from(&config.convert);
    if args.convert_iframes {
        options.convert_iframes = true;
    }
    if args.no_base {
        options.base_target = None;
    }
    if args.keep_integrity {
        options.strip_integrity = false;
    }
    options
}

/// Convert an archive and write the HTML.
fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    args: &ConvertArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let text = parser::read_archive(input)?;
    let start = Instant::now();

    let converter = Converter::new(convert_options(args, config));
    let dom = converter.convert(text.as_str())?;
    write_html(&dom, output)?;

    tracing::info!(
        input = %input.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Converted archive"
    );
    Ok(())
}

/// Write the root document as-is.
fn cmd_extract(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let text = parser::read_archive(input)?;
    let dom = parser::parse_html_only(&text, &Html5everParser)?;
    write_html(&dom, output)?;
    Ok(())
}

/// Print archive headers and the part list.
fn cmd_inspect(input: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let text = parser::read_archive(input)?;
    let start = Instant::now();
    let archive = parser::parse(&text)?;
    let elapsed = start.elapsed();

    if json {
        print_archive_json(input, text.len(), &archive, config.output.pretty_json)
    } else {
        print_archive_table(input, text.len(), &archive, elapsed);
        Ok(())
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mhtml2html", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print archive details in a human-readable table.
fn print_archive_table(path: &Path, file_size: usize, archive: &Archive, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    let headers = archive.headers();
    println!();
    println!("  {:<20} {}", "File", path.display());
    println!("  {:<20} {}", "File size", format_size(file_size, BINARY));
    if let Some(subject) = &headers.subject {
        println!("  {:<20} {}", "Subject", subject);
    }
    if let Some(date) = headers.date {
        println!("  {:<20} {}", "Date", date.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(location) = &headers.snapshot_location {
        println!("  {:<20} {}", "Snapshot", location);
    }
    println!("  {:<20} {}", "Index", archive.index());
    println!("  {:<20} {}", "Parts", archive.part_count());
    println!("  {:<20} {}", "Frames", archive.frame_ids().count());
    println!("  {:<20} {:.2?}", "Parse time", elapsed);
    println!();

    println!(
        "  {:<4} {:<24} {:<18} {:>10}  {}",
        "#", "Type", "Encoding", "Size", "Location / ID"
    );
    println!("  {}", "-".repeat(90));
    for (i, asset) in archive.assets().iter().enumerate() {
        let mime: String = asset.mime_type.chars().take(23).collect();
        println!(
            "  {:<4} {:<24} {:<18} {:>10}  {}",
            i + 1,
            mime,
            asset.encoding.to_string(),
            format_size(asset.size(), BINARY),
            asset.key()
        );
    }
    println!();
}

/// Print archive details as JSON.
fn print_archive_json(
    path: &Path,
    file_size: usize,
    archive: &Archive,
    pretty: bool,
) -> anyhow::Result<()> {
    let parts: Vec<serde_json::Value> = archive
        .assets()
        .iter()
        .map(|a| {
            serde_json::json!({
                "content_location": a.content_location,
                "content_id": a.content_id,
                "mime_type": a.mime_type,
                "encoding": a.encoding.to_string(),
                "size": a.size(),
            })
        })
        .collect();

    let report = serde_json::json!({
        "file": path.to_string_lossy(),
        "file_size": file_size,
        "index": archive.index(),
        "headers": archive.headers(),
        "part_count": archive.part_count(),
        "parts": parts,
    });

    let out = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");
    Ok(())
}
