//! Small soundboard companion CLI: list and audition files from a sounds
//! directory without opening the full GUI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;

use epoch123::audio::AudioEngine;
use epoch123::audio_io;
use epoch123::fsops;

#[derive(Parser)]
#[command(name = "soundboard", about = "Play and manage a directory of sounds", version)]
struct Cli {
    /// Directory holding the sound files.
    #[arg(long, default_value = "./sounds")]
    dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the sounds in the directory.
    List,
    /// Play one or more sounds back to back.
    Play {
        sounds: Vec<String>,
        /// Playback rate multiplier (0.5 = half speed, 2.0 = double).
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
    },
    /// Play a sound reversed, optionally writing the reversed copy out.
    Reverse {
        sound: String,
        /// Write the reversed audio to this WAV file instead of just playing.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Play a random snippet (at least one second) of a sound.
    Snippet { sound: String },
    /// Rename a sound file.
    Rename { sound: String, new_name: String },
}

fn resolve(dir: &Path, sound: &str) -> PathBuf {
    let direct = PathBuf::from(sound);
    if direct.is_file() {
        direct
    } else {
        dir.join(sound)
    }
}

fn wait_until_done(engine: &AudioEngine) {
    while engine.is_busy() {
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn play_file(engine: &AudioEngine, path: &Path, speed: f32, reverse: bool) -> Result<()> {
    let (samples, rate) = audio_io::decode_audio_mono(path)
        .with_context(|| format!("decode {}", path.display()))?;
    // Speed change the crude way: lie about the source rate and let the
    // engine resample.
    let rate = ((rate as f32) * speed.clamp(0.25, 4.0)) as u32;
    engine.load(samples, rate.max(1));
    if reverse {
        engine.play_reverse();
    } else {
        engine.play();
    }
    wait_until_done(engine);
    Ok(())
}

fn cmd_list(dir: &Path) -> Result<()> {
    let files = fsops::scan_audio_files(dir);
    if files.is_empty() {
        println!("no sounds in {}", dir.display());
        return Ok(());
    }
    for f in files {
        let shown = f.strip_prefix(dir).unwrap_or(&f);
        println!("{}", shown.display());
    }
    Ok(())
}

fn cmd_snippet(engine: &AudioEngine, path: &Path) -> Result<()> {
    let (samples, rate) = audio_io::decode_audio_mono(path)
        .with_context(|| format!("decode {}", path.display()))?;
    let total_secs = samples.len() as f32 / rate.max(1) as f32;
    if total_secs <= 1.0 {
        println!("sound shorter than a second, playing whole file");
        engine.load(samples, rate);
        engine.play();
        wait_until_done(engine);
        return Ok(());
    }
    let mut rng = rand::thread_rng();
    let start_secs = rng.gen_range(0.0..total_secs - 1.0);
    let end_secs = rng.gen_range(start_secs + 1.0..=total_secs);
    let start = (start_secs * rate as f32) as usize;
    let end = ((end_secs * rate as f32) as usize).min(samples.len());
    println!("snippet {start_secs:.2}s .. {end_secs:.2}s");
    engine.load(samples[start..end].to_vec(), rate);
    engine.play();
    wait_until_done(engine);
    Ok(())
}

fn main() -> Result<()> {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Warn,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    let cli = Cli::parse();
    match cli.command {
        Command::List => cmd_list(&cli.dir),
        Command::Play { sounds, speed } => {
            if sounds.is_empty() {
                anyhow::bail!("no sounds given");
            }
            let engine = AudioEngine::new()?;
            for sound in sounds {
                let path = resolve(&cli.dir, &sound);
                println!("playing {}", path.display());
                play_file(&engine, &path, speed, false)?;
            }
            Ok(())
        }
        Command::Reverse { sound, out } => {
            let path = resolve(&cli.dir, &sound);
            if let Some(dest) = out {
                let (mut samples, rate) = audio_io::decode_audio_mono(&path)
                    .with_context(|| format!("decode {}", path.display()))?;
                samples.reverse();
                audio_io::write_wav_mono(&dest, &samples, rate)?;
                println!("wrote {}", dest.display());
                return Ok(());
            }
            let engine = AudioEngine::new()?;
            println!("playing {} reversed", path.display());
            play_file(&engine, &path, 1.0, true)
        }
        Command::Snippet { sound } => {
            let engine = AudioEngine::new()?;
            let path = resolve(&cli.dir, &sound);
            cmd_snippet(&engine, &path)
        }
        Command::Rename { sound, new_name } => {
            let path = resolve(&cli.dir, &sound);
            let to = fsops::rename_file(&path, &new_name)?;
            println!("renamed to {}", to.display());
            Ok(())
        }
    }
}
