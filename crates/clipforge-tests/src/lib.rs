//! Integration test crate for clipforge.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every clipforge library crate to verify they work together.

#[cfg(test)]
mod support;

#[cfg(test)]
mod end_to_end;

#[cfg(test)]
mod timeline;

#[cfg(test)]
mod playback;

#[cfg(test)]
mod render;
