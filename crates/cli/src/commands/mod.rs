//! CLI subcommands.

pub mod export;
pub mod materials;
pub mod migrate;
pub mod seed;
pub mod session;
pub mod user;
