use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::export::pdf::PageUnit;
use crate::export::video::MAX_FPS;

#[derive(Parser)]
#[command(name = "invitedeck")]
#[command(author, version, about)]
#[command(long_about = "A bilingual slide-deck wedding invitation.\n\n\
    Presents the invitation in a window and saves it as a PDF or a WebM video.\n\n\
    Examples:\n  \
    invitedeck                       Open the invitation (fullscreen)\n  \
    invitedeck --lang ld --windowed  Open in a window, in Lisan ud-Dawat\n  \
    invitedeck export -o out         Save the PDF into ./out\n  \
    invitedeck video --dwell-ms 3000 Record a faster video")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long, global = false)]
    pub slide: Option<usize>,

    /// Start with autoplay paused
    #[arg(long, global = false)]
    pub no_autoplay: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Where the invitation text comes from and which language to show.
#[derive(clap::Args, Clone, Default)]
pub struct SourceArgs {
    /// Content file (YAML) replacing the built-in invitation text
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// Language to present or export
    #[arg(long, value_enum)]
    pub lang: Option<LangArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LangArg {
    En,
    Ld,
}

impl From<LangArg> for crate::content::Language {
    fn from(lang: LangArg) -> Self {
        match lang {
            LangArg::En => Self::English,
            LangArg::Ld => Self::LisanUdDawat,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Save the invitation as a multi-page PDF
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for the PDF
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Unit the A4 page format is expressed in
        #[arg(long, value_enum)]
        unit: Option<PageUnit>,
    },

    /// Record the invitation as a WebM video (requires ffmpeg)
    Video {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for the video
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Frames per second (1-120)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FPS)))]
        fps: Option<u32>,

        /// Time each slide stays on screen, in milliseconds
        #[arg(long)]
        dwell_ms: Option<u64>,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.language, export.page_unit, video.fps)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Export {
                source,
                output_dir,
                unit,
            }) => crate::commands::export::run(source, output_dir, unit, self.quiet),
            Some(Commands::Video {
                source,
                output_dir,
                fps,
                dwell_ms,
            }) => crate::commands::video::run(source, output_dir, fps, dwell_ms, self.quiet),
            Some(Commands::Version) => {
                println!("invitedeck {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => crate::app::run(crate::app::ViewerOptions {
                source: self.source,
                windowed: self.windowed,
                slide: self.slide,
                autoplay: !self.no_autoplay,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn export_flags_parse() {
        let cli = Cli::try_parse_from([
            "invitedeck", "export", "--lang", "ld", "-o", "out", "--unit", "mm",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Export {
                source,
                output_dir,
                unit,
            }) => {
                assert!(matches!(source.lang, Some(LangArg::Ld)));
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert_eq!(unit, Some(PageUnit::Mm));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn video_fps_is_range_checked() {
        for fps in ["0", "121", "500", "2000000000"] {
            assert!(Cli::try_parse_from(["invitedeck", "video", "--fps", fps]).is_err());
        }
        let cli = Cli::try_parse_from(["invitedeck", "video", "--fps", "120"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Video { fps: Some(120), .. })));
    }

    #[test]
    fn viewer_flags_parse_without_subcommand() {
        let cli = Cli::try_parse_from(["invitedeck", "--windowed", "--slide", "3", "--no-autoplay"])
            .unwrap();
        assert!(cli.command.is_none());
        assert!(cli.windowed);
        assert_eq!(cli.slide, Some(3));
        assert!(cli.no_autoplay);
    }
}
