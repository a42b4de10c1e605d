use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "momsync")]
#[command(about = "Meeting capture with AI-generated minutes", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Generate minutes from an existing recording
    Minutes(MinutesCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct MinutesCliArgs {
    /// Audio file to summarize (wav, mp3, ogg, webm, flac, m4a)
    pub file: PathBuf,
    /// Copy the plain-text minutes to the clipboard
    #[arg(long)]
    pub copy: bool,
    /// Override the configured Gemini model
    #[arg(long)]
    pub model: Option<String>,
}
