use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use tg_scrape::persist::save_messages;
use tg_scrape::scrape::{ChannelScraper, HttpFetcher, PageFetcher};

#[derive(Parser, Debug)]
#[command(
    name = "tg-scrape",
    version,
    about = "Scrapes public Telegram channel preview pages into timestamped JSON dumps"
)]
struct Args {
    /// Channel username, @username, or full t.me link.
    /// Prompts interactively when omitted.
    channel: Option<String>,

    /// Seconds to wait between page fetches
    #[arg(long, default_value_t = 1)]
    delay: u64,

    /// Consecutive empty pages before the crawl stops
    #[arg(long, default_value_t = 3)]
    max_empty: u32,

    /// Directory the JSON file is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let scraper = ChannelScraper::new(
        HttpFetcher::new(),
        Duration::from_secs(args.delay),
        args.max_empty,
    );

    match args.channel.as_deref() {
        Some(input) => {
            let channel = channel_from_input(input);
            run_channel(&scraper, &channel, &args.output_dir).await?;
            Ok(())
        }
        None => interactive_loop(&scraper, &args.output_dir).await,
    }
}

/// Scrape one channel and persist the result; the returned path is the
/// file written.
async fn run_channel<F: PageFetcher>(
    scraper: &ChannelScraper<F>,
    channel: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    println!("\nStarting to parse channel: @{}", channel);
    let messages = scraper.scrape(channel).await?;
    let path = save_messages(&messages, channel, output_dir)?;
    Ok(path)
}

async fn interactive_loop<F: PageFetcher>(
    scraper: &ChannelScraper<F>,
    output_dir: &Path,
) -> Result<()> {
    println!("Telegram Channel Parser (Unofficial)");
    println!("--------------------------------");

    loop {
        let Some(input) = prompt("\nEnter Telegram channel username or link (or \"q\" to quit): ")?
        else {
            break;
        };
        let input = input.trim().to_string();

        if input.eq_ignore_ascii_case("q") {
            break;
        }
        if input.is_empty() {
            println!("Please enter a valid channel username or link");
            continue;
        }

        let channel = channel_from_input(&input);
        match run_channel(scraper, &channel, output_dir).await {
            Ok(_) => println!("\nParsing completed successfully!"),
            Err(err) => {
                eprintln!("{}", err);
                println!("\nFailed to parse the channel. Please check the username/link and try again.");
            }
        }

        let Some(choice) = prompt("\nWould you like to parse another channel? (y/n): ")? else {
            break;
        };
        if !choice.trim().eq_ignore_ascii_case("y") {
            break;
        }
    }

    println!("\nThank you for using Telegram Channel Parser!");
    Ok(())
}

/// Print a prompt and read one line; `None` means stdin hit EOF.
fn prompt(text: &str) -> Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Pull the channel username out of whatever the user typed: a bare
/// name, an @name, or a full t.me link (the path segment right after
/// `t.me/` is the username).
fn channel_from_input(input: &str) -> String {
    let input = input.trim();
    if let Some((_, rest)) = input.split_once("t.me/") {
        rest.split('/').next().unwrap_or_default().to_string()
    } else {
        input.trim_start_matches('@').to_string()
    }
}
