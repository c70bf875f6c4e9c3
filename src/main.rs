use clap::{Parser, Subcommand};
use growler::order::book::Book;
use growler::{config, session};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "growler", about = "Growler Limit Order Book")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an event stream and print trades plus the final book snapshot.
    Run {
        /// Input file; stdin when omitted.
        input: Option<PathBuf>,
    },
}

fn init_logging(cfg: &config::AppConfig) {
    // Logs go to stderr; stdout carries only the output protocol.
    match cfg.logger.format {
        config::LogFormat::JSON => {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(cfg.logger.level)
                .with_writer(io::stderr)
                .init();
        }
        config::LogFormat::COMPACT => {
            tracing_subscriber::fmt()
                .compact()
                .with_max_level(cfg.logger.level)
                .with_writer(io::stderr)
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = config::AppConfig::load(cli.config_path.as_ref()).expect("could not load config");

    init_logging(&config);

    match cli.command {
        Commands::Run { input } => {
            let mut book = Book::new();
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());

            match input {
                Some(path) => {
                    let file = File::open(&path).expect("could not open input file");
                    session::run(&mut book, BufReader::new(file), &mut out)
                }
                None => {
                    let stdin = io::stdin();
                    session::run(&mut book, stdin.lock(), &mut out)
                }
            }
            .and_then(|()| out.flush())
            .expect("could not process event stream");
        }
    }
}
