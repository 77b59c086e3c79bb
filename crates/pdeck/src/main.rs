//! pdeck: a PDF slideshow presenter with ink annotations, timed slides,
//! and video clips.

mod app;
mod cli;
mod config;
mod controller;
mod doc;
mod ink;
mod input;
mod scale;
mod video;

use clap::Parser;
use colored::Colorize;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();
    if let Err(e) = cli.run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
