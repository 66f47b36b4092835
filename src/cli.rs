use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, ConfigError};
use crate::pipeline::structuring::variants::ModelVariant;

#[derive(Parser, Debug)]
#[command(name = "report-digitizer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Digitize handwritten maintenance-service forms")]
#[command(after_help = "EXAMPLES:\n  \
    report-digitizer serve --bind 0.0.0.0:8080\n  \
    report-digitizer digitize scans/*.jpg --model pro --csv reportes.csv\n\n\
    The API key is read from GEMINI_API_KEY.")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Listen address (overrides DIGITIZER_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Digitize files from disk as one batch
    Digitize {
        /// Form scans or PDFs, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Extraction model: flash or pro (overrides DIGITIZER_MODEL)
        #[arg(short, long, value_parser = parse_variant)]
        model: Option<ModelVariant>,

        /// Write the CSV export of completed records to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print all records as JSON instead of one line per file
        #[arg(long)]
        json: bool,
    },
}

fn parse_variant(s: &str) -> Result<ModelVariant, String> {
    s.parse()
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::from_env()?;
        match &self.command {
            Command::Serve { bind } => {
                if let Some(addr) = bind {
                    config.bind_addr = *addr;
                }
            }
            Command::Digitize { model, .. } => {
                if let Some(variant) = model {
                    config.default_variant = *variant;
                }
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_bind() {
        let cli = Cli::try_parse_from(["report-digitizer", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.unwrap().port(), 9000),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_digitize_options() {
        let cli = Cli::try_parse_from([
            "report-digitizer",
            "digitize",
            "a.jpg",
            "b.pdf",
            "--model",
            "pro",
            "--csv",
            "out.csv",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Digitize { files, model, csv, json } => {
                assert_eq!(files.len(), 2);
                assert_eq!(model, Some(ModelVariant::Pro));
                assert_eq!(csv.unwrap(), PathBuf::from("out.csv"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn digitize_requires_files() {
        assert!(Cli::try_parse_from(["report-digitizer", "digitize"]).is_err());
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = Cli::try_parse_from(["report-digitizer", "digitize", "a.jpg", "--model", "ultra"])
            .unwrap_err();
        assert!(err.to_string().contains("unknown model variant"));
    }
}
