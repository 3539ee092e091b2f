use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod badge;
mod icns_argb;
mod icon_gen;
mod monochrome;
mod raster;

use badge::BuildStatus;

#[derive(Debug, Parser)]
#[clap(
    name = "badged-icon-gen",
    about = "Generate Windows, Android and macOS app icons with build status badges"
)]
pub struct Args {
    /// Path to the master icon (SVG).
    #[clap(value_name = "INPUT")]
    pub input: PathBuf,

    /// Platform output directory.
    #[clap(short, long, value_name = "DIR", default_value = "./platform")]
    pub output: PathBuf,

    /// Directory holding status_<status>.svg, status_<status>_mini.svg and console.svg.
    #[clap(short, long, value_name = "DIR", default_value = "./icon_badges")]
    pub badges: PathBuf,

    /// Build variants to generate icons for.
    #[clap(
        short,
        long,
        value_enum,
        value_delimiter = ',',
        value_name = "STATUS",
        default_values_t = BuildStatus::ALL
    )]
    pub status: Vec<BuildStatus>,

    /// Base file name of the Windows icons.
    #[clap(short, long, default_value = "icon")]
    pub name: String,

    /// Generate icons for Windows platform
    #[clap(long)]
    pub windows: bool,

    /// Generate icons for Android platform
    #[clap(long)]
    pub android: bool,

    /// Generate icons for macOS platform
    #[clap(long)]
    pub macos: bool,

    /// ICNS file whose PNG and ARGB slots get badged for macOS.
    #[clap(long, value_name = "FILE")]
    pub icns_template: Option<PathBuf>,

    /// The background color of Android adaptive icons (CSS color format)
    #[clap(long, default_value = "#32516b")]
    pub android_background: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    icon_gen::generate_icons(&args)
}
