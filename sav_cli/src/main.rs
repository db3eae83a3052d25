use std::{fs, path::PathBuf};

use anyhow::Context;
use chart_schema::EventStream;
use clap::{Parser, Subcommand};
use sav_compiler::{ConvertError, ConvertOptions, ProjectLayout};

mod preview;

#[derive(Debug, Parser)]
#[command(name = "sav")]
#[command(about = "Convert editor .sav charts into playable event streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert custom/<SONG>/<SONG>.sav into map and simulator streams
    Convert {
        song: String,
        /// Project root holding custom/, orig/, graphics/ and music/
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Also rewrite the song and singer catalogs
        #[arg(long)]
        song_info: bool,
        /// Also write the audio track padded with the lead-in
        #[arg(long)]
        audio: bool,
    },
    /// Print an emitted stream as a lane grid
    Preview { stream: PathBuf },
}

/// `E1005: ... (line 6) in custom/x/x.sav`
fn describe(e: &ConvertError) -> String {
    let mut msg = e.to_string();
    if let Some(line) = e.line {
        msg.push_str(&format!(" (line {line})"));
    }
    if let Some(file) = &e.file {
        msg.push_str(&format!(" in {file}"));
    }
    msg
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            song,
            root,
            song_info,
            audio,
        } => {
            log::debug!("converting {song} under {}", root.display());
            let layout = ProjectLayout::new(root, song.as_str());
            let report = sav_compiler::convert_project(&layout, &ConvertOptions { song_info, audio })
                .map_err(|e| anyhow::anyhow!(describe(&e)))
                .with_context(|| format!("convert failed: {song}"))?;

            for path in &report.written {
                println!("wrote {}", path.display());
            }
            let warnings = report.conversion.assembly.diagnostics.len();
            if warnings > 0 {
                println!("{warnings} warning(s)");
            }
        }
        Command::Preview { stream } => {
            let json = fs::read_to_string(&stream)
                .with_context(|| format!("failed to read: {}", stream.display()))?;
            let events: EventStream = serde_json::from_str(&json)
                .with_context(|| format!("failed to parse stream: {}", stream.display()))?;
            preview::print_preview(&events);
        }
    }

    Ok(())
}
