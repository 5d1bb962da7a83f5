//! Pithos server: configuration, logging, the Discord adapter, and the
//! background motion sweeper.

pub mod config;
pub mod discord;
pub mod startup;
pub mod sweeper;
