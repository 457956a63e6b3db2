//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{config::ConfigArgs, generate::GenerateArgs, init::InitArgs};

#[derive(Parser, Debug)]
#[command(name = "testforge")]
#[command(about = "Testforge - compiler-checked unit test synthesis", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file to use instead of .testforge/config.yaml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate test classes for source files, directories or packages
    Generate(GenerateArgs),

    /// Write a default .testforge/config.yaml
    Init(InitArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}
