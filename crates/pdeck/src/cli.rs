use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdeck")]
#[command(author, version, about)]
#[command(long_about = "A PDF slideshow presenter.\n\n\
    Slides, timed auto-advance, and video clips are described by a JSON\n\
    deck file; freehand ink is drawn live with the mouse.\n\n\
    Examples:\n  \
    pdeck deck.json               Present in an 800x600 window\n  \
    pdeck deck.json --fullscreen  Present fullscreen\n  \
    pdeck deck.json --slide 4     Start on slide 4")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Deck configuration file (JSON)
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch fullscreen instead of a window
    #[arg(long)]
    pub fullscreen: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long)]
    pub slide: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Completion { shell }) => {
                use clap::CommandFactory;
                let mut cmd = Self::command();
                let name = cmd.get_name().to_string();
                clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
                Ok(())
            }
            None => {
                let Some(path) = self.config else {
                    anyhow::bail!("missing deck file; usage: pdeck <deck.json>");
                };
                if !path.exists() {
                    anyhow::bail!("file not found: {}", path.display());
                }
                let deck = crate::config::Deck::load(&path)?;
                crate::app::run(deck, self.fullscreen, self.slide)
            }
        }
    }
}
