//! Garden CLI library
//!
//! Command-line front end of the garden site builder: argument parsing,
//! configuration overrides, the manifest render dispatcher, external link
//! checks and table output.

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod render;
