use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use git_diff_records::{DiffRecord, parse_full, parse_quick};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "git-diff-records")]
#[command(about = "Parse git diff output into per-file change records")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse verbose `git diff` output (reads stdin when FILE is omitted)
    Full {
        file: Option<PathBuf>,
        /// Print each record's patch body after its status line
        #[arg(long)]
        patch: bool,
    },
    /// Parse `git diff --name-status` style output (reads stdin when FILE is omitted)
    Quick { file: Option<PathBuf> },
    /// Print shell completions
    Completions { shell: Shell },
    /// Print a roff man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Full { file, patch } => {
            let records = parse_full(&read_input(file)?)?;
            write_records(&mut stdout, &records, patch)?;
        }
        Commands::Quick { file } => {
            let records = parse_quick(&read_input(file)?)?;
            write_records(&mut stdout, &records, false)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-diff-records", &mut stdout);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut stdout)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: Option<PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn write_records(out: &mut impl Write, records: &[DiffRecord], patch: bool) -> io::Result<()> {
    for record in records {
        writeln!(out, "{record}")?;
        if patch {
            for line in record.patch_lines() {
                writeln!(out, "    {line}")?;
            }
        }
    }
    Ok(())
}
