use chunky::{
    convert_confont, convert_font, convert_format, convert_image, default_output, Grab,
};
use libchunky::{ImageFormat, ShadingType};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

#[cfg(not(debug_assertions))]
const DEFAULT_DEBUG_LEVEL: u8 = 1;
#[cfg(debug_assertions)]
const DEFAULT_DEBUG_LEVEL: u8 = 99;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(
        short,
        long,
        global = true,
        default_value_t = DEFAULT_DEBUG_LEVEL,
        action = clap::ArgAction::Count
    )]
    verbosity: u8,

    /// Swap colors 0 and 247 in the source
    #[arg(short = '0', long, global = true)]
    retrans: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Files {
    /// The source image: ILBM, BMP, PCX, PNG, IMGZ, FON1, FON2 or a Doom patch
    source: PathBuf,

    /// The output file name
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Files {
    fn output(&self, extension: &str) -> Result<PathBuf> {
        match &self.output {
            Some(o) => Ok(o.clone()),
            None => default_output(&self.source, extension),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// makes a monospaced console font (FON1)
    #[command(name = "confont")]
    ConFont(Files),

    /// makes a proportional font (FON2)
    Font {
        #[command(flatten)]
        files: Files,

        /// How the font is shaded when drawn
        #[arg(long, default_value_t = ShadingType::Normal)]
        shading: ShadingType,

        /// Glyph grid to grab, as X,Y,FIRST (FIRST is a character code or a character).
        /// Without any, the grid at 0,0 is grabbed starting with ' '
        #[arg(long = "grab", value_name = "X,Y,FIRST")]
        grabs: Vec<Grab>,
    },

    /// makes a raw image (IMGZ)
    Image(Files),

    /// makes a raw image (IMGZ) centered on its middle unless it has a hotspot
    #[command(name = "xhair")]
    Crosshair(Files),

    /// converts the source to a PCX file
    Pcx(Files),

    /// converts the source to a BMP file
    Bmp(Files),

    /// converts the source to an ILBM file
    Ilbm(Files),

    /// converts the source to a PNG file
    Png(Files),
}

fn convert_to(files: &Files, retrans: bool, format: ImageFormat) -> Result<()> {
    let output = files.output(format.extension())?;
    convert_format(&files.source, &output, retrans, format)
}

fn report_written(output: &Path) {
    info!("wrote {}", output.display());
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
        .init();

    let retrans = cli.retrans;
    match cli.command {
        Commands::ConFont(files) => {
            let output = files.output("fon1")?;
            convert_confont(&files.source, &output, retrans)?;
            report_written(&output);
        }
        Commands::Font {
            files,
            shading,
            grabs,
        } => {
            let output = files.output("fon2")?;
            if convert_font(&files.source, &output, retrans, shading, &grabs)? {
                report_written(&output);
            } else {
                println!("{}: nothing to save", output.display());
            }
        }
        Commands::Image(files) => {
            let output = files.output("imgz")?;
            convert_image(&files.source, &output, retrans, false)?;
            report_written(&output);
        }
        Commands::Crosshair(files) => {
            let output = files.output("imgz")?;
            convert_image(&files.source, &output, retrans, true)?;
            report_written(&output);
        }
        Commands::Pcx(files) => convert_to(&files, retrans, ImageFormat::Pcx)?,
        Commands::Bmp(files) => convert_to(&files, retrans, ImageFormat::Bmp)?,
        Commands::Ilbm(files) => convert_to(&files, retrans, ImageFormat::Ilbm)?,
        Commands::Png(files) => convert_to(&files, retrans, ImageFormat::Png)?,
    }
    Ok(())
}
