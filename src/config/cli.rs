use crate::config::toml_config::BirthdayConfig;
use crate::core::variant_selector::VariantPolicy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "birthday")]
#[command(about = "Keep a baby's profile and preview the birthday screen")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "birthday.toml")]
    pub config: PathBuf,

    /// Override storage.data_dir from config
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Override variant.policy (per_presentation, session, persisted)
    #[arg(long)]
    pub policy: Option<VariantPolicy>,

    /// Override variant.seed for reproducible buckets
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Save the baby's name
    SetName { name: String },
    /// Save the birth date (YYYY-MM-DD)
    SetDate { date: NaiveDate },
    /// Save a portrait from an image file
    SetImage { path: PathBuf },
    /// Print the stored profile
    Profile,
    /// Print the selectable birth date range
    Range,
    /// Build the birthday screen
    Show {
        /// Measured portrait diameter, used to place the camera badge
        #[arg(long, default_value = "200")]
        diameter: f64,
    },
}

impl CliConfig {
    /// 將命令列參數覆蓋到檔案配置上
    pub fn apply_overrides(&self, config: &mut BirthdayConfig) {
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
            tracing::debug!("🔧 data_dir overridden to: {}", data_dir);
        }
        if let Some(policy) = self.policy {
            config.variant.policy = policy;
            tracing::debug!("🔧 variant policy overridden to: {:?}", policy);
        }
        if let Some(seed) = self.seed {
            config.variant.seed = Some(seed);
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}
