#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod config;
pub mod crossing;
pub mod error;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;
