use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "stormfetch", version, about = "Shows system information next to your distro's ascii art")]
pub struct Cli {
    /// Ascii art to use instead of the configured one
    #[arg(long)]
    pub ascii: Option<String>,

    /// Distro name to show instead of the detected one
    #[arg(long = "distro-name")]
    pub distro_name: Option<String>,

    /// Print how long each piece of system information took to gather
    #[arg(long = "time-taken")]
    pub time_taken: bool,

    /// Config file to read instead of searching the config directories
    #[arg(long)]
    pub config: Option<PathBuf>,
}
