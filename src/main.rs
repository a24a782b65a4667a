//! chapterize - extract narrative chapters from an EPUB

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use chapterize::{ClassifierConfig, ParseOptions, ParsedBook, parse_epub_with};

#[derive(Parser)]
#[command(name = "chapterize")]
#[command(version, about = "Extract narrative chapters from an EPUB", long_about = None)]
#[command(after_help = "EXAMPLES:
    chapterize novel.epub             List chapters and excluded sections
    chapterize --json novel.epub      Print the parsed book as JSON
    chapterize -vv novel.epub         Show per-section classification")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Print the full parse result as JSON
    #[arg(long)]
    json: bool,

    /// Parse timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Sections with fewer words are never chapters
    #[arg(long, default_value_t = 100)]
    min_words: usize,

    /// Score a section needs to count as a chapter
    #[arg(long, default_value_t = 3)]
    threshold: u32,

    /// Maximum sections picked when nothing qualifies
    #[arg(long, default_value_t = 10)]
    fallback_limit: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_classifier(
                ClassifierConfig::default()
                    .with_min_words(self.min_words)
                    .with_score_threshold(self.threshold)
                    .with_fallback_limit(self.fallback_limit),
            )
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A second logger can only fail to install; keep going without it.
    let _ = TermLogger::init(
        cli.log_level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let book = match parse_epub_with(&bytes, &cli.options()) {
        Ok(book) => book,
        Err(e) => {
            log::debug!("{e}");
            eprintln!("error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&book) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_summary(&book);
    }

    ExitCode::SUCCESS
}

fn print_summary(book: &ParsedBook) {
    let meta = &book.metadata;
    println!("Title: {}", meta.title);
    println!("Author: {}", meta.author);
    println!("Language: {}", meta.language);
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref date) = meta.publication_date {
        println!("Published: {date}");
    }

    let info = &book.processing_info;
    println!(
        "\nChapters: {} of {} sections",
        info.chapter_count, info.total_sections
    );
    for chapter in &book.chapters {
        let words = chapter.content.split_whitespace().count();
        println!("  {:>3}. {} ({words} words)", chapter.order + 1, chapter.title);
    }

    if !info.excluded_sections.is_empty() {
        println!("\nExcluded:");
        for excluded in &info.excluded_sections {
            println!("  {excluded}");
        }
    }
    if !info.skipped_sections.is_empty() {
        println!("\nUnreadable:");
        for skipped in &info.skipped_sections {
            println!("  {}: {}", skipped.href, skipped.reason);
        }
    }
}
