use clap::{Args, Parser, Subcommand};
use launchspec::{ArgStyle, Format, LoadOptions, Result};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "launchspec")]
#[command(about = "Validate and normalize process-manager launch descriptors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a descriptor and print one line per app.
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Print the loaded launch specs as JSON.
    Show {
        #[command(flatten)]
        input: Input,
    },

    /// Write the normalized descriptor (json or yaml).
    Export {
        #[command(flatten)]
        input: Input,

        #[arg(long, default_value = "json")]
        to: Format,

        /// Output file; stdout when omitted.
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Input {
    /// Descriptor file (.json, .yaml, .yml, .js).
    file: PathBuf,

    /// Descriptor format; detected from the extension when omitted.
    #[arg(long)]
    format: Option<Format>,

    /// Merge `env_<PROFILE>` over `env`.
    #[arg(long = "env", value_name = "PROFILE")]
    env_profile: Option<String>,

    /// Split string `args` with shell quoting rules instead of passing it as one argument.
    #[arg(long)]
    split_args: bool,
}

impl Input {
    fn options(&self) -> LoadOptions {
        LoadOptions {
            format: self.format,
            args: if self.split_args {
                ArgStyle::ShellWords
            } else {
                ArgStyle::Opaque
            },
            env_profile: self.env_profile.clone(),
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Check { input } => {
            let specs = launchspec::load_path(&input.file, &input.options())?;
            for spec in &specs {
                println!("{}: {}", spec.name(), spec.command_line());
            }
            println!("OK ({} apps)", specs.len());
        }
        Commands::Show { input } => {
            let specs = launchspec::load_path(&input.file, &input.options())?;
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
        Commands::Export { input, to, out } => {
            let specs = launchspec::load_path(&input.file, &input.options())?;
            let text = launchspec::export(&specs, to)?;
            match out {
                Some(out) => {
                    std::fs::write(&out, text)?;
                    eprintln!("Wrote {}", out.display());
                }
                None => print!("{}", text),
            }
        }
    }

    Ok(())
}
