#![allow(dead_code)]

use std::fs;
use std::path::Path;

use lfkey_core::{Credential, EdgeEvent, Encoder, Pulse, RfFrontend, TICKS_PER_US};

/// Ticks per 125 kHz field clock.
pub const TICKS_PER_CLOCK: u32 = 8 * TICKS_PER_US;

/// Load a whitespace-separated signed timing fixture.
pub fn load_timings(name: &str) -> Vec<i32> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let text = fs::read_to_string(&path).expect("read timing fixture");
    text.split_whitespace()
        .map(|value| value.parse().expect("parse timing value"))
        .collect()
}

/// Render `frames` full frames of a credential's pulse stream.
pub fn render_pulses(credential: &Credential, frames: u32) -> Vec<Pulse> {
    let mut encoder = Encoder::start(credential).expect("encodable credential");
    let total_clocks = u64::from(encoder.frame_clocks()) * u64::from(frames);
    let mut pulses = Vec::new();
    let mut clocks = 0u64;
    while clocks < total_clocks {
        let pulse = encoder.get_next();
        clocks += u64::from(pulse.period);
        pulses.push(pulse);
    }
    pulses
}

/// Collapse a pulse stream into edge events: equal-polarity runs merge and
/// each transition reports the completed run's duration.
pub fn pulses_to_edges(pulses: &[Pulse]) -> Vec<EdgeEvent> {
    let mut edges = Vec::new();
    let mut level: Option<bool> = None;
    let mut run_ticks = 0u32;
    for pulse in pulses {
        match level {
            Some(current) if current == pulse.polarity => {
                run_ticks += u32::from(pulse.period) * TICKS_PER_CLOCK;
            }
            Some(current) => {
                edges.push(EdgeEvent {
                    rising: !current,
                    ticks: run_ticks,
                });
                level = Some(pulse.polarity);
                run_ticks = u32::from(pulse.period) * TICKS_PER_CLOCK;
            }
            None => {
                level = Some(pulse.polarity);
                run_ticks = u32::from(pulse.period) * TICKS_PER_CLOCK;
            }
        }
    }
    edges
}

/// Front-end double recording carrier reconfigurations.
#[derive(Debug, Default)]
pub struct RecordingFrontend {
    pub configures: Vec<(u32, f32)>,
}

impl RfFrontend for RecordingFrontend {
    fn configure(&mut self, frequency_hz: u32, duty_cycle: f32) {
        self.configures.push((frequency_hz, duty_cycle));
    }
    fn start_receive(&mut self) {}
    fn start_transmit(&mut self) {}
    fn stop(&mut self) {}
    fn set_field(&mut self, _on: bool) {}
    fn delay_us(&mut self, _us: u32) {}
    fn interrupts_disable(&mut self) {}
    fn interrupts_enable(&mut self) {}
}
