//! cert-manager DNS-01 webhook backed by the DonDominio simple-api.
//!
//! The binary in `main.rs` wires these pieces together: [`config`] decides
//! where to listen, [`server`] exposes the webhook API group and dispatches
//! challenges to [`solver::DonDominioSolver`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod secrets;
pub mod server;
pub mod solver;
pub mod tls;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{ConfigError, SolverError, SolverResult};
pub use solver::{DonDominioConnector, DonDominioSolver, SOLVER_NAME, Solver};
