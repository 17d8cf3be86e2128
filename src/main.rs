use std::path::PathBuf;
use std::process::ExitCode;

use clap::{value_parser, ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vcrypt_core::MAX_LOGICAL_SIDE;

mod commands;
mod manifest;

use commands::{HidePaths, Options, Report};

#[derive(Parser, Debug)]
#[command(
    name = "vcrypt",
    version,
    about = "Visual cryptography for black & transparent PNG images"
)]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "More logging on stderr (-v debug, -vv trace); RUST_LOG overrides"
    )]
    verbose: u8,
    #[arg(long, global = true, help = "Process image rows on all cores")]
    parallel: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a key (twice the size of the secrets it can encrypt)
    Keygen {
        #[arg(
            long,
            required_unless_present = "stego",
            requires = "height",
            value_parser = value_parser!(u32).range(0..=i64::from(MAX_LOGICAL_SIDE))
        )]
        width: Option<u32>,
        #[arg(
            long,
            required_unless_present = "stego",
            requires = "width",
            value_parser = value_parser!(u32).range(0..=i64::from(MAX_LOGICAL_SIDE))
        )]
        height: Option<u32>,
        #[arg(long, conflicts_with_all = ["width", "height"], help = "Pattern the key after this cover image")]
        stego: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Encrypt a source image with an existing key
    Encrypt {
        #[arg(long)]
        key: PathBuf,
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = false, help = "Fail instead of centring smaller sources")]
        no_resize: bool,
    },
    /// Generate a key and encrypt the source with it in one step
    Split {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Hide a secret in the overlay of two cover images
    Hide {
        #[arg(long)]
        first: PathBuf,
        #[arg(long)]
        second: PathBuf,
        #[arg(long)]
        secret: PathBuf,
        #[arg(long)]
        out_first: PathBuf,
        #[arg(long)]
        out_second: PathBuf,
    },
    /// Stack a key and a share and recover the secret
    Decrypt {
        #[arg(long)]
        key: PathBuf,
        #[arg(long)]
        share: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = false, help = "Write the raw overlay instead of the cleaned up secret")]
        overlay_only: bool,
    },
    /// Check a directory written by `split` against its manifest
    Verify { dir: PathBuf },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<Report> {
    let opts = Options {
        parallel: cli.parallel,
    };
    match cli.command {
        Commands::Keygen {
            width,
            height,
            stego,
            out,
        } => commands::keygen(width, height, stego.as_deref(), &out, opts),
        Commands::Encrypt {
            key,
            source,
            out,
            no_resize,
        } => commands::encrypt(&key, &source, &out, !no_resize),
        Commands::Split { source, out_dir } => commands::split(&source, &out_dir, opts),
        Commands::Hide {
            first,
            second,
            secret,
            out_first,
            out_second,
        } => commands::hide(
            HidePaths {
                first: &first,
                second: &second,
                secret: &secret,
                out_first: &out_first,
                out_second: &out_second,
            },
            opts,
        ),
        Commands::Decrypt {
            key,
            share,
            out,
            overlay_only,
        } => commands::decrypt(&key, &share, &out, overlay_only),
        Commands::Verify { dir } => commands::verify(&dir),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    match run(cli) {
        Ok(report) => {
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(s) => println!("{s}"),
                    Err(err) => {
                        eprintln!("error: {err}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("{}", report.summary());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
