// Simulation parameters
//
// Sources, lowest to highest precedence:
// 1. built-in defaults
// 2. an optional config file (TOML, YAML or JSON, picked by extension)
// 3. TESSERA_* environment variables (nested keys use "__")
// 4. command-line flags

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_consensus::StakePolicy;
use tessera_crypto::{SecretRange, DEFAULT_MODULUS};

pub const ENV_PREFIX: &str = "TESSERA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Validators at genesis
    pub total_validators: usize,

    /// How many of them are Byzantine (the lowest ids)
    pub byzantine_count: usize,

    /// Secret shared in the first round
    pub secret: u64,

    /// Shares issued per secret
    pub total_shares: u32,

    /// Shares required to reconstruct
    pub threshold: u32,

    /// Rounds to simulate
    pub rounds: u64,

    /// Prime modulus of the sharing field
    pub modulus: u64,

    /// Seed for a reproducible run; omitted means OS entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Range rotated secrets are drawn from; omitted means the field default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_range: Option<SecretRange>,

    pub stake_policy: StakePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            total_validators: 4,
            byzantine_count: 1,
            secret: 42,
            total_shares: 5,
            threshold: 3,
            rounds: 5,
            modulus: DEFAULT_MODULUS,
            seed: None,
            secret_range: None,
            stake_policy: StakePolicy::default(),
        }
    }
}

/// Values given on the command line. `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub total_validators: Option<usize>,
    pub byzantine_count: Option<usize>,
    pub secret: Option<u64>,
    pub total_shares: Option<u32>,
    pub threshold: Option<u32>,
    pub rounds: Option<u64>,
    pub modulus: Option<u64>,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Layer defaults, the optional file and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&SimulationConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn apply(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(v) = overrides.total_validators {
            self.total_validators = v;
        }
        if let Some(v) = overrides.byzantine_count {
            self.byzantine_count = v;
        }
        if let Some(v) = overrides.secret {
            self.secret = v;
        }
        if let Some(v) = overrides.total_shares {
            self.total_shares = v;
        }
        if let Some(v) = overrides.threshold {
            self.threshold = v;
        }
        if let Some(v) = overrides.rounds {
            self.rounds = v;
        }
        if let Some(v) = overrides.modulus {
            self.modulus = v;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        self
    }
}
