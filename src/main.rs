use anyhow::Context;
use birthday_profile::core::portrait_writer::PortraitWriter;
use birthday_profile::domain::ports::ImageCodec;
use birthday_profile::utils::{logger, validation::Validate};
use birthday_profile::{
    BirthdayConfig, BirthdayPresenter, CliConfig, Command, PortraitSource, SaveOutcome,
    StandardCodec, SystemClock,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置並套用命令列覆蓋
    let mut config = match BirthdayConfig::from_file_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config.display(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let store = Arc::new(config.open_store().context("opening profile store")?);
    let selector = config.variant_selector(store.backend().clone());
    let mut presenter = BirthdayPresenter::new(Arc::clone(&store), SystemClock, selector);

    let outcome = match cli.command {
        Command::SetName { name } => presenter.update_name(&name),
        Command::SetDate { date } => presenter.update_birth_date(date),
        Command::SetImage { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("reading portrait from {}", path.display()))?;
            let portrait = StandardCodec::default()
                .decode(&bytes)
                .with_context(|| format!("decoding portrait {}", path.display()))?;

            let writer = PortraitWriter::spawn(Arc::clone(&store));
            writer.submit(portrait)?;
            let stats = writer.shutdown().await?;
            if stats.failed > 0 {
                SaveOutcome::Failed
            } else {
                SaveOutcome::Saved
            }
        }
        Command::Profile => {
            let profile = presenter.profile();
            println!("name:       {}", profile.name());
            match profile.birth_date() {
                Some(date) => println!("birth date: {}", date),
                None => println!("birth date: (not set)"),
            }
            match profile.portrait_image() {
                Some(image) => println!("portrait:   {}x{}", image.width(), image.height()),
                None => println!("portrait:   (not set)"),
            }
            SaveOutcome::Saved
        }
        Command::Range => {
            let range = presenter.allowed_range();
            println!("{} ..= {}", range.lower, range.upper);
            SaveOutcome::Saved
        }
        Command::Show { diameter } => {
            let Some(screen) = presenter.show_birthday() else {
                eprintln!("💡 Set a name and a birth date first");
                std::process::exit(2);
            };
            let badge = presenter.badge_offset(diameter);

            println!("{}", screen.headline);
            println!("[{}] {}", screen.numeral_asset, screen.caption);
            println!("background: {}", screen.assets.background);
            match &screen.portrait {
                PortraitSource::Stored(image) => {
                    println!("portrait:   stored {}x{}", image.width(), image.height())
                }
                PortraitSource::Placeholder(key) => println!("portrait:   {}", key),
            }
            println!(
                "badge:      {} at ({:.1}, {:.1})",
                screen.assets.badge_icon, badge.x, badge.y
            );
            SaveOutcome::Saved
        }
    };

    if outcome == SaveOutcome::Failed {
        eprintln!("❌ Changes could not be saved, see log for details");
        std::process::exit(2);
    }

    tracing::info!("✅ Done");
    Ok(())
}
