//! omni-post - Post content to multiple social platforms at once

use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use libomnicast::logging::{self, LogFormat, LoggingConfig};
use libomnicast::{
    Config, LimitCheck, OmnicastError, Orchestrator, OverLimitDecision, PlatformId, PostRequest,
    PostResultSet, Result, SubmitOptions,
};

#[derive(Parser, Debug)]
#[command(name = "omni-post")]
#[command(version)]
#[command(about = "Post content to multiple social platforms at once", long_about = None)]
struct Cli {
    /// Content to post (reads from stdin if not provided)
    content: Option<String>,

    /// Target platform(s), comma-separated, or "all"
    #[arg(short, long, default_value = "all")]
    platform: String,

    /// Attach an image (file path, or URL for platforms that take one)
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Check character limits and exit without posting
    #[arg(long)]
    check_only: bool,

    /// Post even when the text exceeds a platform's limit
    #[arg(short = 'y', long)]
    yes: bool,

    /// Per-platform timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // -v forces debug; otherwise OMNICAST_LOG_FORMAT / OMNICAST_LOG_LEVEL apply
    if cli.verbose {
        LoggingConfig::new(LogFormat::Text, "debug".to_string(), true).init();
    } else {
        logging::init_default();
    }

    match run(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let content = read_content(&cli)?;
    let platforms = parse_platforms(&cli.platform)?;

    if let Some(image) = &cli.image {
        let is_remote = image
            .to_str()
            .is_some_and(|s| s.starts_with("http://") || s.starts_with("https://"));
        if !is_remote && !image.exists() {
            return Err(OmnicastError::InvalidInput(format!(
                "Image file not found: {}",
                image.display()
            )));
        }
    }

    let config = Config::load()?;
    let orchestrator = Orchestrator::new(&config);
    let request = PostRequest::new(content, cli.image.clone(), platforms);

    if request.text().is_empty() {
        return Err(OmnicastError::InvalidInput(
            "Post text cannot be empty".to_string(),
        ));
    }

    let checks = orchestrator.check_limits(&request);
    let violations: Vec<&LimitCheck> = checks.iter().filter(|c| !c.within_limit).collect();

    if cli.check_only {
        print_limit_table(&checks);
        return Ok(if violations.is_empty() { 0 } else { 1 });
    }

    let decision = if violations.is_empty() {
        OverLimitDecision::Proceed
    } else {
        print_limit_table(&checks);
        resolve_over_limit_decision(&cli)?
    };

    let options = SubmitOptions {
        timeout: cli.timeout.map(Duration::from_secs),
    };
    let results = orchestrator.submit(&request, decision, &options).await?;

    match cli.format.as_str() {
        "json" => print_json(&results)?,
        _ => print_text(&results),
    }

    Ok(if results.any_failed() { 1 } else { 0 })
}

/// Positional argument, falling back to stdin
fn read_content(cli: &Cli) -> Result<String> {
    if let Some(content) = &cli.content {
        return Ok(content.trim().to_string());
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| OmnicastError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
    Ok(buffer.trim().to_string())
}

fn parse_platforms(list: &str) -> Result<Vec<PlatformId>> {
    if list.trim().eq_ignore_ascii_case("all") {
        return Ok(PlatformId::all().to_vec());
    }

    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(OmnicastError::InvalidInput))
        .collect()
}

/// Ask the user whether to post past an over-limit warning
///
/// Non-interactive runs (piped stdin, no `-y`) abort rather than hang on a
/// prompt nobody will answer.
fn resolve_over_limit_decision(cli: &Cli) -> Result<OverLimitDecision> {
    if cli.yes {
        return Ok(OverLimitDecision::Proceed);
    }

    if !std::io::stdin().is_terminal() {
        eprintln!("Text exceeds platform limits; pass -y to post anyway.");
        return Ok(OverLimitDecision::Abort);
    }

    eprint!("Continue posting anyway? (y/N) ");
    std::io::stderr().flush().ok();

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .map_err(|e| OmnicastError::InvalidInput(format!("Failed to read prompt: {}", e)))?;

    if answer.trim().eq_ignore_ascii_case("y") {
        Ok(OverLimitDecision::Proceed)
    } else {
        Ok(OverLimitDecision::Abort)
    }
}

fn print_limit_table(checks: &[LimitCheck]) {
    for check in checks {
        if check.within_limit {
            eprintln!(
                "  {}: {}/{} characters ({} remaining)",
                check.platform,
                check.length,
                check.limit,
                check.remaining()
            );
        } else {
            eprintln!(
                "  {}: {}/{} characters (OVER by {})",
                check.platform,
                check.length,
                check.limit,
                check.overage()
            );
        }
    }
}

fn print_text(results: &PostResultSet) {
    for outcome in results.iter() {
        if outcome.success {
            match &outcome.post_id {
                Some(id) => println!("✓ {}: posted ({})", outcome.platform, id),
                None => println!("✓ {}: posted", outcome.platform),
            }
        } else {
            let reason = outcome
                .diagnostic
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown failure".to_string());
            println!("✗ {}: {}", outcome.platform, reason);
        }
    }
}

fn print_json(results: &PostResultSet) -> Result<()> {
    let outcomes: Vec<_> = results.iter().collect();
    let rendered = serde_json::to_string_pretty(&outcomes)
        .map_err(|e| OmnicastError::InvalidInput(format!("Failed to render JSON: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
