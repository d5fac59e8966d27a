//! APU (Audio Processing Unit) emulation.
//!
//! - **Pulse** (×2): square waves with duty, envelope, sweep, length counter.
//! - **Triangle**: 32-step wave, linear counter, length counter.
//! - **Noise**: LFSR-based, envelope, length counter.
//! - **DMC**: delta-modulated samples fetched from CPU memory, with loop and IRQ.
//! - **Frame counter**: 4-step or 5-step mode; clocks envelope/linear/length/sweep.
//! - **Mixer**: non-linear mix of the five levels into 0.0..=1.0.

pub mod apu;
pub mod channels;

pub use apu::{Apu, Channel, mix};
