use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use vcrack_core::core::cipher::{decrypt, encrypt};
use vcrack_core::core::types::CrackReport;
use vcrack_core::persistence::{load_dictionary, load_key_list, load_word_list, save_dictionary_snapshot};
use vcrack_core::progress::{ChannelProgress, ProgressUpdate};
use vcrack_core::{CancellationToken, CrackConfig, CrackEngine, CrackOutcome, Dictionary};

const DEFAULT_WORDS_PATH: &str = "data/Words.json";

#[derive(Parser, Debug)]
#[command(name = "vcrack", version, about = "Automated Vigenere cipher cryptanalysis")]
struct Cli {
    /// Log pipeline details (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recover the key and plaintext of a ciphertext
    Crack(CrackArgs),
    /// Encrypt text with a key
    Encrypt(KeyedText),
    /// Decrypt text with a known key
    Decrypt(KeyedText),
    /// Build a binary dictionary snapshot from a word list
    CompileDictionary {
        #[arg(long)]
        words: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

/// Text comes from the positional argument, `--input`, or stdin, in that order.
#[derive(Args, Debug)]
struct TextSource {
    text: Option<String>,
    #[arg(short, long)]
    input: Option<PathBuf>,
}

impl TextSource {
    fn read(&self) -> io::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.input {
            return fs::read_to_string(path);
        }
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    }
}

#[derive(Args, Debug)]
struct KeyedText {
    #[arg(short, long)]
    key: String,
    #[command(flatten)]
    source: TextSource,
}

#[derive(Args, Debug)]
struct CrackArgs {
    #[command(flatten)]
    source: TextSource,
    /// Word list (JSON `commonWords` or one word per line) or a compiled `.bin` snapshot
    #[arg(long, default_value = DEFAULT_WORDS_PATH)]
    words: PathBuf,
    /// Predefined keys to try before the statistical search
    #[arg(long)]
    keys: Option<PathBuf>,
    /// JSON file with configuration overrides
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_key_length: Option<usize>,
    /// Target word recognition in percent
    #[arg(long)]
    target: Option<f64>,
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Skip the search and decrypt with this key
    #[arg(long)]
    known_key: Option<String>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

impl CrackArgs {
    fn build_config(&self) -> Result<CrackConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => CrackConfig::from_json_file(path)?,
            None => CrackConfig::default(),
        };
        if let Some(n) = self.max_key_length {
            config.max_key_length = n;
        }
        if let Some(t) = self.target {
            config.target_recognition = t;
        }
        if let Some(n) = self.max_iterations {
            config.max_iterations = n;
        }
        if let Some(key) = &self.known_key {
            config.use_known_key = true;
            config.known_key = Some(key.clone());
        }
        if self.keys.is_some() {
            config.use_predefined_keys = true;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    SimpleLogger::new().with_level(level).env().init()?;

    match cli.command {
        Command::Crack(args) => run_crack(&args),
        Command::Encrypt(args) => {
            println!("{}", encrypt(&args.source.read()?, &args.key));
            Ok(())
        }
        Command::Decrypt(args) => {
            println!("{}", decrypt(&args.source.read()?, &args.key));
            Ok(())
        }
        Command::CompileDictionary { words, out } => compile_dictionary(&words, &out),
    }
}

fn compile_dictionary(words: &Path, out: &Path) -> Result<(), Box<dyn Error>> {
    let dictionary = Dictionary::from_ranked_words(load_word_list(words)?);
    save_dictionary_snapshot(&dictionary, out)?;
    println!("Compiled {} words into {}", dictionary.len(), out.display());
    Ok(())
}

fn run_crack(args: &CrackArgs) -> Result<(), Box<dyn Error>> {
    let ciphertext = args.source.read()?;
    let mut engine = CrackEngine::new(args.build_config()?);
    engine.set_dictionary(load_dictionary(&args.words)?);
    if let Some(path) = &args.keys {
        engine.set_predefined_keys(load_key_list(path)?);
    }

    // Narrative lines are printed by a separate thread while the engine works.
    let (tx, rx) = mpsc::channel::<ProgressUpdate>();
    let printer = thread::spawn(move || {
        for update in rx {
            match update.percent {
                Some(p) => println!("{} {}", format!("[{:>3.0}%]", p).dark_grey(), update.message),
                None => println!("{} {}", "::".cyan(), update.message),
            }
        }
    });

    let outcome = engine.crack_with(&ciphertext, &CancellationToken::new(), Arc::new(ChannelProgress::new(tx)));
    // The engine dropped its observer, so the channel is closed and the printer drains.
    let _ = printer.join();

    match outcome? {
        CrackOutcome::Solved(report) => print_report(&report),
        CrackOutcome::NoViableResult { key_lengths, .. } => {
            let lengths: Vec<String> = key_lengths.iter().map(|k| k.length.to_string()).collect();
            println!(
                "{} (key lengths tried: {})",
                "No viable key found.".red().bold(),
                lengths.join(", ")
            );
        }
    }
    Ok(())
}

fn print_report(report: &CrackReport) {
    println!();
    println!("{} {}", "Key:".bold(), report.key.as_str().green().bold());
    println!(
        "{} {:.2}% ({}/{} words)",
        "Word recognition:".bold(),
        report.stats.percentage,
        report.stats.recognized,
        report.stats.total_words
    );
    if report.refined {
        println!("{} {} iterations", "Refined in".bold(), report.iterations);
    }
    println!("{}", "Plaintext:".bold());
    println!("{}", report.plaintext);

    if !report.alternatives.is_empty() {
        println!();
        println!("{}", "Alternatives:".bold());
        for (i, alt) in report.alternatives.iter().enumerate() {
            println!(
                "{:>2}. {:<16} {:>6.2}%  quality {:>7.2}  {}",
                i + 1,
                alt.key,
                alt.stats.percentage,
                alt.quality,
                alt.preview.as_str().dark_grey()
            );
        }
    }
}
