//! Simulation driver for the Tessera validator network.
//!
//! Loads a [`settings::SimulationConfig`], then plays rounds through
//! [`simulation::Simulation`]: vote, share and audit the active secret,
//! rotate it, manage membership.

pub mod cli;
pub mod logging;
pub mod settings;
pub mod simulation;

pub use settings::{ConfigOverrides, SimulationConfig};
pub use simulation::{Advisory, RoundReport, Simulation, SimulationError, SimulationSummary};
