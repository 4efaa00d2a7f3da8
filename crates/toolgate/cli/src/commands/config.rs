//! Gateway configuration commands

use clap::Subcommand;

use crate::commands::load_config;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration, defaults filled in
    Show {
        #[arg(short, long, env = "TOOLGATE_CONFIG")]
        config: Option<String>,
    },

    /// Validate a configuration file
    Validate {
        config: String,
    },
}

pub fn execute(command: ConfigCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        ConfigCommands::Show { config } => {
            let config = load_config(config.as_deref())?;
            match format {
                OutputFormat::Json => output::print_single(&config, format),
                OutputFormat::Table | OutputFormat::Yaml => {
                    print!("{}", config.to_yaml_string()?);
                    Ok(())
                }
            }
        }
        ConfigCommands::Validate { config } => {
            load_config(Some(&config))?;
            output::print_success(&format!("{} is valid", config));
            Ok(())
        }
    }
}
