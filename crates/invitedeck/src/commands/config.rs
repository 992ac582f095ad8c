use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "(not created yet, showing defaults)".dimmed());
    }
    println!();

    println!("{}", "defaults".cyan().bold());
    println!("  language:               {}", config.language().code());
    println!("  autoplay:               {}", config.autoplay());
    println!(
        "  autoplay_interval_secs: {}",
        config.autoplay_interval().as_secs()
    );
    println!(
        "  content:                {}",
        display_or(config.content_path(), "(built-in)")
    );
    println!(
        "  fonts_dir:              {}",
        display_or(config.fonts_dir(), "(system fonts only)")
    );

    println!("{}", "export".cyan().bold());
    println!("  output_dir:             {}", config.export_dir().display());
    println!("  page_unit:              {}", unit_name(&config));
    println!("  settle_ms:              {}", config.settle().as_millis());
    println!("  jpeg_quality:           {}", config.jpeg_quality());

    println!("{}", "video".cyan().bold());
    println!("  output_dir:             {}", config.video_dir().display());
    println!("  dwell_ms:               {}", config.dwell().as_millis());
    println!("  fps:                    {}", config.fps());
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {} = {} ({})",
        "Saved".green().bold(),
        key,
        value,
        path.display()
    );
    Ok(())
}

fn display_or(path: Option<&std::path::Path>, fallback: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.dimmed().to_string())
}

fn unit_name(config: &Config) -> &'static str {
    match config.page_unit() {
        crate::export::pdf::PageUnit::Pt => "pt",
        crate::export::pdf::PageUnit::Mm => "mm",
    }
}
