//! Integration tests for lattice crates.
//!
//! End-to-end scenarios and algebraic properties that span
//! `lattice-core`, `lattice-math` and `lattice-ops`.
//!
//! ```bash
//! cargo test --package lattice-tests
//! ```

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
