//! Deterministic random number generation
//!
//! Every random draw an agent makes (e.g. proposal parameters) goes through
//! the single seeded generator owned by `SimulationState`, so two runs with
//! the same configuration and seed replay identically.

mod xorshift;

pub use xorshift::RngManager;
