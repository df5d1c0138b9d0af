use kapview::{kap_to_image, print_info};
use libkap::ColorPalette;
use std::path::PathBuf;
use tracing::{info, Level};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

#[cfg(not(debug_assertions))]
const DEFAULT_DEBUG_LEVEL: u8 = 1;
#[cfg(debug_assertions)]
const DEFAULT_DEBUG_LEVEL: u8 = 99;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, default_value_t = DEFAULT_DEBUG_LEVEL, action = clap::ArgAction::Count)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// converts a BSB/KAP image to a PNG image
    #[command(name = "kapimg")]
    BsbToImage {
        /// The kap image
        bsb_file: PathBuf,

        /// The output file name
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The palette used to color the image (RGB, DAY, DSK, NGT, NGR, GRY, PRC, PRG)
        #[arg(short, long, default_value_t = ColorPalette::Rgb)]
        palette: ColorPalette,
    },

    /// prints the header values of a BSB/KAP image
    #[command(name = "info")]
    Info {
        /// The kap image
        bsb_file: PathBuf,
    },
}

fn default_output(bsb_file: &std::path::Path) -> Result<PathBuf> {
    let Some(dir) = bsb_file.parent() else {
        bail!("Invalid bsb file");
    };
    let Some(Some(filename)) = bsb_file.file_stem().map(|os| os.to_str()) else {
        bail!("Invalid bsb file");
    };
    let output = dir.join(format!("{filename}.png"));
    info!("output name: {}", output.display());
    Ok(output)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::BsbToImage {
            bsb_file,
            output,
            palette,
        } => {
            let output = match output {
                Some(o) => o,
                None => default_output(&bsb_file)?,
            };
            kap_to_image(&bsb_file, &output, palette)?;
        }
        Commands::Info { bsb_file } => print_info(&bsb_file)?,
    }
    Ok(())
}
