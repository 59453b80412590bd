//! dysmail - HTML email to DML converter

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dysmail::util::decode_text;
use dysmail::{DEFAULT_MODEL, OpenAiClient, Pipeline};

#[derive(Parser)]
#[command(name = "dysmail")]
#[command(version, about = "Convert HTML email templates to Dyspatch DML", long_about = None)]
#[command(after_help = "EXAMPLES:
    dysmail newsletter.html               Convert, write artifacts to out/
    dysmail newsletter.html -o dist       Write artifacts under dist/
    dysmail newsletter.html --budget 2000 Split into smaller fragments

The OPENAI_API_KEY environment variable must be set (a .env file works).")]
struct Cli {
    /// Input HTML email template
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for the mjml/ and dml/ artifact sets
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Fragment budget in estimated tokens
    #[arg(long, default_value_t = 3000)]
    budget: usize,

    /// Completion model
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> dysmail::Result<()> {
    let client = OpenAiClient::from_env(&cli.model)?;
    let pipeline = Pipeline::new(&client, &cli.output, cli.budget)?;

    let bytes = std::fs::read(&cli.input)?;
    let html = decode_text(&bytes);

    if !cli.quiet {
        println!("Breaking HTML into blocks...");
    }

    let report = pipeline.run(&html).await?;

    if !cli.quiet {
        println!("Converted {} blocks.", report.fragments);
        println!(
            "MJML saved to {}/mjml/output-[BLOCK_NUMBER].mjml.",
            cli.output.display()
        );
        println!(
            "DML saved to {}/dml/output-[BLOCK_NUMBER].dml.",
            cli.output.display()
        );
        println!();
        println!(
            "End results may not be 100% accurate, some attributes may be invalid \
             and need to be manually removed. Some images may be larger than expected."
        );
    }

    Ok(())
}
