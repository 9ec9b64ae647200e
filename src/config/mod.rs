pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "propconv")]
#[command(about = "Convert configuration property values into typed field values")]
pub struct CliConfig {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Bind every field declared in a property file
    Bind {
        /// Path to the TOML property file
        #[arg(short, long, default_value = "properties.toml")]
        config: String,

        /// Print the bound values as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert a single value
    Convert {
        /// Target type, e.g. period, date, i32, list<u16>, enum(a|b)
        #[arg(short = 't', long = "type")]
        target: crate::domain::model::TargetType,

        /// Raw property value
        value: String,
    },
}
