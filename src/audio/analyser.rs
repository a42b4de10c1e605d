//! Frequency spectrum analysis for gating and visualization.
//!
//! Mirrors the measurement contract of a Web Audio analyser node: a 256-point
//! windowed FFT whose bin magnitudes are smoothed over time, converted to
//! decibels, and mapped onto an 8-bit 0-255 scale. The gate compares the peak
//! bin against its threshold on that scale; the visualizer draws the bins.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub const FFT_SIZE: usize = 256;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    tail: Vec<f32>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new() -> Self {
        // Hann window to reduce spectral leakage
        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos())
            })
            .collect();

        Self {
            fft: FftPlanner::new().plan_fft_forward(FFT_SIZE),
            window,
            tail: Vec::with_capacity(FFT_SIZE),
            smoothed: vec![0.0; BIN_COUNT],
        }
    }

    /// Append a block, keeping the most recent analysis window's worth.
    pub fn feed(&mut self, block: &[f32]) {
        self.tail.extend_from_slice(block);
        if self.tail.len() > FFT_SIZE {
            self.tail.drain(..self.tail.len() - FFT_SIZE);
        }
    }

    /// Current bin magnitudes on the 0-255 scale.
    ///
    /// Advances the temporal smoothing state; call once per tick.
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let mut buf: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); FFT_SIZE];
        // Zero-pad at the front when fewer than FFT_SIZE samples have arrived
        let offset = FFT_SIZE - self.tail.len();
        for (i, &s) in self.tail.iter().enumerate() {
            buf[offset + i] = Complex::new(s * self.window[offset + i], 0.0);
        }

        self.fft.process(&mut buf);

        let mut bins = Vec::with_capacity(BIN_COUNT);
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = buf[k].norm() / FFT_SIZE as f32;
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;

            let db = 20.0 * smoothed.max(1e-10).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB) * 255.0;
            bins.push(scaled.clamp(0.0, 255.0) as u8);
        }

        bins
    }

    /// Maximum bin magnitude across the spectrum.
    pub fn peak_magnitude(&mut self) -> u8 {
        self.byte_frequency_data().into_iter().max().unwrap_or(0)
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new()
    }
}
