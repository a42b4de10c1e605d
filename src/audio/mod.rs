//! Live capture pipeline: sources, spectrum analysis, voice gating, mixing,
//! and encoding of the session recording.

pub mod analyser;
pub mod encoder;
pub mod gain;
pub mod gate;
pub mod graph;
pub mod mic_source;
pub mod source;
pub mod system_source;
pub mod visualizer;

use thiserror::Error;

pub use analyser::SpectrumAnalyser;
pub use encoder::{AudioEncoder, Recorder, RecordingBlob, WavEncoder};
pub use gain::GainRamp;
pub use gate::VoiceGate;
pub use graph::{AudioGraph, CaptureSession, LiveCapture, MicControlHandle};
pub use mic_source::MicSource;
pub use source::{CaptureSource, SampleBuffer};
pub use system_source::SystemAudioSource;
pub use visualizer::{NullSurface, SpectrumSurface, TerminalMeter};

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The display/system side of the capture yielded no audio. Fatal to the
    /// session: there is nothing to record without the meeting audio.
    #[error(
        "no system audio available; enable a monitor (loopback) input device \
         so the meeting audio can be captured"
    )]
    NoSystemAudio,
    #[error("audio device error: {0}")]
    Device(String),
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("audio encoding failed: {0}")]
    Encode(String),
}

/// Port the session machine drives the capture pipeline through.
///
/// The live implementation owns real cpal streams; tests substitute a fake
/// that returns scripted blobs.
#[async_trait::async_trait(?Send)]
pub trait CapturePort {
    /// Acquire sources and start the pump. Fails without side effects when
    /// system audio cannot be acquired.
    async fn open(&mut self) -> Result<(), CaptureError>;

    /// Stop the pump and sources and return the session blob. No-op (returns
    /// `None`) when no capture is open.
    async fn close(&mut self) -> Option<RecordingBlob>;

    fn is_open(&self) -> bool;
}
