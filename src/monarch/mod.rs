//! Association source backed by the Monarch Initiative BioLink API.

pub mod client;

pub use client::{Direction, MonarchClient};
