use crate::logging::DEFAULT_LOG_LEVEL;
use crate::settings::ConfigOverrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tessera-sim")]
#[command(about = "Tessera validator network simulator", long_about = None)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub params: SimulationArgs,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Play the configured rounds (default)
    Run {
        /// Emit one JSON object per round on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration and exit
    ShowConfig,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct SimulationArgs {
    /// Validators at genesis
    #[arg(long = "validators", global = true)]
    pub total_validators: Option<usize>,

    /// Byzantine validators at genesis
    #[arg(long = "byzantine", global = true)]
    pub byzantine_count: Option<usize>,

    /// Secret shared in the first round
    #[arg(long, global = true)]
    pub secret: Option<u64>,

    /// Shares issued per secret
    #[arg(long = "shares", global = true)]
    pub total_shares: Option<u32>,

    /// Shares required to reconstruct
    #[arg(long, global = true)]
    pub threshold: Option<u32>,

    #[arg(long, global = true)]
    pub rounds: Option<u64>,

    /// Prime modulus of the sharing field
    #[arg(long, global = true)]
    pub modulus: Option<u64>,

    /// RNG seed for a reproducible run
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        let p = &self.params;
        ConfigOverrides {
            total_validators: p.total_validators,
            byzantine_count: p.byzantine_count,
            secret: p.secret,
            total_shares: p.total_shares,
            threshold: p.threshold,
            rounds: p.rounds,
            modulus: p.modulus,
            seed: p.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::parse_from(["tessera-sim"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.overrides(), ConfigOverrides::default());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::parse_from([
            "tessera-sim",
            "run",
            "--json",
            "--validators",
            "7",
            "--byzantine",
            "2",
            "--shares",
            "6",
            "--threshold",
            "4",
            "--seed",
            "99",
        ]);
        assert!(matches!(cli.command, Some(Commands::Run { json: true })));

        let overrides = cli.overrides();
        assert_eq!(overrides.total_validators, Some(7));
        assert_eq!(overrides.byzantine_count, Some(2));
        assert_eq!(overrides.total_shares, Some(6));
        assert_eq!(overrides.threshold, Some(4));
        assert_eq!(overrides.seed, Some(99));
        assert_eq!(overrides.modulus, None);
    }

    #[test]
    fn test_rejects_negative_counts() {
        assert!(Cli::try_parse_from(["tessera-sim", "--validators", "-3"]).is_err());
    }
}
