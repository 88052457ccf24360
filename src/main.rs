mod ascii;
mod cli;
mod config;
mod directive;
mod error;
mod expand;
mod fetch;
mod logging;
mod palette;
mod render;
mod system;
mod ui;

use std::process;

use clap::Parser;
use tracing::debug;

use ascii::TemplateLoader;
use cli::Cli;
use config::{Config, ConfigDirs};
use error::Result;
use fetch::run_fetch_script;
use palette::Palette;
use render::RenderContext;
use system::SystemInfo;

fn main() {
    logging::init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(block) => println!("{}", block),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let dirs = ConfigDirs::from_system();
    let config_path = match cli.config {
        Some(path) => path,
        None => dirs.find_config()?,
    };
    let config = Config::from_file(&config_path)?.with_overrides(cli.ascii, cli.distro_name);
    let fetch_script = dirs.find_fetch_script(&config.fetch_script)?;

    let distro = system::distro_info(&config.distro_name);
    let ascii_id = match config.distro_ascii.as_str() {
        "auto" => distro.id.clone(),
        id => id.to_string(),
    };
    let template = TemplateLoader::from_config_dirs(&dirs).load(&ascii_id);
    debug!(ascii_id = %ascii_id, source = ?template.source, "ascii art selected");

    let ctx = RenderContext::new(
        &template.raw,
        Palette::new(config.ansii_colors.clone()),
        config.force_config_ansii,
    )?;

    let info = SystemInfo::collect(&config, distro, cli.time_taken);
    let mut env = info.to_env();
    env.extend(ctx.color_env());
    let output = run_fetch_script(&fetch_script, &env)?;

    Ok(ctx.compose(&output))
}
