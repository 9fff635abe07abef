//! Integration tests for the IDT crates.
//!
//! End-to-end checks of the spectral solver and the cache layer against a
//! throwaway database built by [`fixtures::TestDatabase`].
//!
//! The fixture data is synthetic: camera, observer and training curves are
//! linear ramps, so results are not physically meaningful but are stable
//! and cheap to solve.

pub mod fixtures;

#[cfg(test)]
mod cache;
#[cfg(test)]
mod solver;
