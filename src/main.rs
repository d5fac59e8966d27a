//! NES emulator entry point.
//!
//! Loads a cartridge and runs the console with a display window and audio output.
//! Usage: famicore [--scale 1|2|4] [--mute] [--log-level LEVEL] path/to/game.nes
//!
//! Keys: arrows, Z (A), X (B), Right Shift (Select), Enter (Start). Ctrl+R resets the console,
//! Ctrl+P pauses, Escape quits.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ansi_term::Colour::{Cyan, Green, Purple, Red, Yellow};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use famicore::{
    Buttons, Cartridge, Nes,
    nes::SAMPLE_RATE,
    ppu::{PALETTE_RGB, SCREEN_HEIGHT, SCREEN_WIDTH},
};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
use rodio::{OutputStream, Sink, Source};

/// NES runs at ~60.0988 Hz (NTSC).
const FRAME_DURATION: Duration = Duration::from_nanos(16_639_263);

/// Audio samples buffered before the oldest are dropped (about a tenth of a second).
const MAX_QUEUED_SAMPLES: usize = SAMPLE_RATE as usize / 10;

#[derive(Parser, Debug)]
#[command(name = "famicore", about = "A cycle-stepped NES emulator", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Window scale factor (1, 2 or 4)
    #[arg(short, long, default_value_t = 2)]
    scale: u8,

    /// Disable audio output
    #[arg(long)]
    mute: bool,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Writes records to stderr with a colored level tag.
struct Logger {
    level: log::LevelFilter,
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            log::Level::Error => Red.bold().paint("ERROR"),
            log::Level::Warn => Yellow.bold().paint("WARN "),
            log::Level::Info => Green.bold().paint("INFO "),
            log::Level::Debug => Cyan.paint("DEBUG"),
            log::Level::Trace => Purple.paint("TRACE"),
        };
        eprintln!("{tag} [{}] {}", record.target(), record.args());
    }

    fn flush(&self) {}
}

fn init_logger(level: log::LevelFilter) -> Result<()> {
    let logger: &'static Logger = Box::leak(Box::new(Logger { level }));
    log::set_logger(logger).map_err(|err| anyhow::anyhow!("{err}"))?;
    log::set_max_level(level);
    Ok(())
}

/// Feeds console samples to rodio; plays silence when the queue runs dry.
struct SampleQueue {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl Iterator for SampleQueue {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = match self.samples.lock() {
            Ok(mut queue) => queue.pop_front().unwrap_or(0.0),
            Err(_) => 0.0,
        };
        Some(sample)
    }
}

impl Source for SampleQueue {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

fn window_scale(scale: u8) -> Result<Scale> {
    Ok(match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        other => bail!("unsupported scale {other}; expected 1, 2 or 4"),
    })
}

fn read_buttons(window: &Window) -> Buttons {
    const KEYS: [(Key, Buttons); 8] = [
        (Key::Z, Buttons::A),
        (Key::X, Buttons::B),
        (Key::RightShift, Buttons::SELECT),
        (Key::Enter, Buttons::START),
        (Key::Up, Buttons::UP),
        (Key::Down, Buttons::DOWN),
        (Key::Left, Buttons::LEFT),
        (Key::Right, Buttons::RIGHT),
    ];
    KEYS.iter()
        .filter(|(key, _)| window.is_key_down(*key))
        .fold(Buttons::empty(), |held, (_, button)| held | *button)
}

/// Console actions bound to Ctrl chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hotkey {
    Reset,
    Pause,
}

impl Hotkey {
    fn from_key(key: Key, ctrl: bool) -> Option<Self> {
        match (ctrl, key) {
            (true, Key::R) => Some(Self::Reset),
            (true, Key::P) => Some(Self::Pause),
            _ => None,
        }
    }
}

/// Hotkeys pressed since the last window update; held keys do not repeat.
fn read_hotkeys(window: &Window) -> Vec<Hotkey> {
    let ctrl = window.is_key_down(Key::LeftCtrl) || window.is_key_down(Key::RightCtrl);
    window
        .get_keys_pressed(KeyRepeat::No)
        .into_iter()
        .filter_map(|key| Hotkey::from_key(key, ctrl))
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into())?;

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("failed to read ROM {}", args.rom.display()))?;
    let cart = Cartridge::from_bytes(rom)
        .with_context(|| format!("failed to load ROM {}", args.rom.display()))?;

    let mut nes = Nes::new();
    nes.load_cart(cart);

    // The stream must outlive the loop or playback stops.
    let _audio = if args.mute {
        None
    } else {
        let (stream, handle) = OutputStream::try_default().context("failed to open audio output")?;
        let sink = Sink::try_new(&handle).context("failed to create audio sink")?;
        let samples = Arc::new(Mutex::new(VecDeque::with_capacity(MAX_QUEUED_SAMPLES)));
        sink.append(SampleQueue {
            samples: Arc::clone(&samples),
        });
        nes.set_sample_callback(move |sample| {
            if let Ok(mut queue) = samples.lock() {
                if queue.len() >= MAX_QUEUED_SAMPLES {
                    queue.pop_front();
                }
                queue.push_back(sample);
            }
        });
        Some((stream, sink))
    };

    let mut window = Window::new(
        "famicore",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            scale: window_scale(args.scale)?,
            ..WindowOptions::default()
        },
    )
    .context("failed to create window")?;

    let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut paused = false;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        for hotkey in read_hotkeys(&window) {
            match hotkey {
                Hotkey::Reset => {
                    log::info!("reset");
                    nes.reset();
                }
                Hotkey::Pause => {
                    paused = !paused;
                    log::info!("{}", if paused { "paused" } else { "resumed" });
                }
            }
        }

        // Paused: the window keeps showing the last frame.
        if !paused {
            nes.set_buttons(0, read_buttons(&window));
            nes.clock_frame();
        }

        for (pixel, &index) in buffer.iter_mut().zip(nes.screen()) {
            *pixel = PALETTE_RGB[(index & 0x3F) as usize];
        }
        window
            .update_with_buffer(&buffer, SCREEN_WIDTH, SCREEN_HEIGHT)
            .context("failed to update window")?;

        // Pace to ~60 fps; emulation runs much faster than the real console.
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    log::info!("stopped after {} frames", nes.frame_count());
    Ok(())
}
