//! Integration test crate for KeyClip.
//!
//! This crate exists solely to hold cross-crate integration tests. It
//! depends on the core, timeline, and media crates to verify they work
//! together the way the host application drives them.

#[cfg(test)]
mod support;

#[cfg(test)]
mod clipping;

#[cfg(test)]
mod export;
