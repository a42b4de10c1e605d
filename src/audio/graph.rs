//! The live audio graph: drains the capture sources once per tick, rides the
//! mic gain from the voice gate, mixes, and feeds the recorder and the
//! visualizer.
//!
//! Layout per tick, mirroring the session's signal path:
//!
//! ```text
//! system source ───────────────► resample ──┐
//! mic source ──► analyser ► gate ► ramp ────┴► mix ──► analyser ► surface
//!                                                └───► recorder
//! ```
//!
//! The pump runs as a cancellable interval task; the sources themselves stay
//! on the session task because cpal streams are not `Send`. Only their
//! sample buffers cross into the pump.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CaptureConfig;

use super::analyser::SpectrumAnalyser;
use super::encoder::{Recorder, RecordingBlob, WavEncoder};
use super::gain::{GainRamp, DEFAULT_TIME_CONSTANT_SECS};
use super::gate::{clamp_sensitivity, VoiceGate};
use super::mic_source::MicSource;
use super::source::{CaptureSource, SampleBuffer};
use super::system_source::SystemAudioSource;
use super::visualizer::{NullSurface, SpectrumSurface, TerminalMeter};
use super::{CaptureError, CapturePort};

/// Shared mic controls: the manual toggle and sensitivity flow in from the
/// API, the observed audible-in-mix flag flows back out.
#[derive(Clone)]
pub struct MicControlHandle {
    enabled: Arc<AtomicBool>,
    sensitivity: Arc<AtomicU8>,
    audible: Arc<AtomicBool>,
}

impl MicControlHandle {
    pub fn new(enabled: bool, sensitivity: u8) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
            sensitivity: Arc::new(AtomicU8::new(clamp_sensitivity(sensitivity))),
            audible: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_sensitivity(&self, sensitivity: u8) {
        self.sensitivity
            .store(clamp_sensitivity(sensitivity), Ordering::Relaxed);
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity.load(Ordering::Relaxed)
    }

    pub(crate) fn set_audible(&self, audible: bool) {
        self.audible.store(audible, Ordering::Relaxed);
    }

    pub fn is_audible(&self) -> bool {
        self.audible.load(Ordering::Relaxed)
    }
}

impl Default for MicControlHandle {
    fn default() -> Self {
        Self::new(true, super::gate::DEFAULT_SENSITIVITY)
    }
}

/// Sum two blocks, zero-padding the shorter one. Samples that leave
/// [-1, 1] are scaled back proportionally rather than hard-clipped.
pub fn mix_blocks(a: &[f32], b: &[f32]) -> Vec<f32> {
    let len = a.len().max(b.len());
    let mut mixed = Vec::with_capacity(len);
    for i in 0..len {
        let sum = a.get(i).copied().unwrap_or(0.0) + b.get(i).copied().unwrap_or(0.0);
        mixed.push(if sum.abs() > 1.0 { sum / sum.abs() } else { sum });
    }
    mixed
}

/// Linear-interpolation resampling. Good enough for speech.
pub fn resample_block(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio).ceil() as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < samples.len() {
            samples[src_idx] as f64 * (1.0 - frac) + samples[src_idx + 1] as f64 * frac
        } else if src_idx < samples.len() {
            samples[src_idx] as f64
        } else {
            0.0
        };

        resampled.push(sample as f32);
    }

    resampled
}

pub struct AudioGraph {
    system: SampleBuffer,
    system_rate: u32,
    pipeline_rate: u32,
    mic: Option<SampleBuffer>,
    mic_analyser: SpectrumAnalyser,
    mixed_analyser: SpectrumAnalyser,
    gate: VoiceGate,
    ramp: GainRamp,
    recorder: Recorder,
    surface: Box<dyn SpectrumSurface>,
    controls: MicControlHandle,
}

impl AudioGraph {
    pub fn new(
        system: SampleBuffer,
        system_rate: u32,
        mic: Option<SampleBuffer>,
        pipeline_rate: u32,
        recorder: Recorder,
        surface: Box<dyn SpectrumSurface>,
        controls: MicControlHandle,
    ) -> Self {
        Self {
            system,
            system_rate,
            pipeline_rate,
            mic,
            mic_analyser: SpectrumAnalyser::new(),
            mixed_analyser: SpectrumAnalyser::new(),
            gate: VoiceGate::new(controls.sensitivity()),
            // Mic contribution starts silent until voice activity is seen,
            // whatever the manual toggle says
            ramp: GainRamp::new(pipeline_rate, DEFAULT_TIME_CONSTANT_SECS),
            recorder,
            surface,
            controls,
        }
    }

    /// One pump cycle: drain, analyse, gate, ramp, mix, record, draw.
    pub fn tick(&mut self) {
        let system_block =
            resample_block(&self.system.drain(), self.system_rate, self.pipeline_rate);

        let mut mic_block = match &self.mic {
            Some(buffer) => buffer.drain(),
            None => Vec::new(),
        };

        if self.mic.is_some() {
            // The analyser taps the raw mic signal, before the gain node, so
            // detection keeps working while the mic is silent in the mix
            self.gate.set_sensitivity(self.controls.sensitivity());
            self.mic_analyser.feed(&mic_block);
            let peak = self.mic_analyser.peak_magnitude();
            if let Some(audible) = self.gate.update(peak) {
                self.controls.set_audible(audible);
                debug!(peak, audible, "voice gate state changed");
            }
        }

        let target = if self.controls.is_enabled() && self.gate.is_audible() {
            1.0
        } else {
            0.0
        };
        self.ramp.set_target(target);
        self.ramp.apply(&mut mic_block);

        let mixed = mix_blocks(&system_block, &mic_block);

        self.mixed_analyser.feed(&mixed);
        let bins = self.mixed_analyser.byte_frequency_data();
        self.surface.draw(&bins);

        if let Err(e) = self.recorder.push(&mixed) {
            error!("Failed to encode mixed block: {}", e);
        }
    }

    /// Final drain plus blob assembly.
    pub fn finish(mut self) -> Option<RecordingBlob> {
        self.tick();
        self.recorder.stop()
    }
}

async fn run_pump(
    mut graph: AudioGraph,
    tick: Duration,
    cancel: CancellationToken,
) -> Option<RecordingBlob> {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => graph.tick(),
        }
    }

    debug!("Pump cancelled, flushing graph");
    graph.finish()
}

/// One recording session: both sources, the pump task, and the cancellation
/// token. Owns every audio resource exclusively; teardown is idempotent and
/// runs on every exit path.
pub struct CaptureSession {
    system: SystemAudioSource,
    mic: Option<MicSource>,
    cancel: CancellationToken,
    pump: Option<JoinHandle<Option<RecordingBlob>>>,
}

impl CaptureSession {
    /// Acquire sources and start pumping.
    ///
    /// System audio is checked first: if it cannot be acquired nothing else
    /// is created and nothing needs releasing. A missing microphone only
    /// degrades the session to system-audio capture.
    pub fn start(
        config: &CaptureConfig,
        controls: MicControlHandle,
        surface: Box<dyn SpectrumSurface>,
    ) -> Result<Self, CaptureError> {
        let mut system = SystemAudioSource::acquire()?;
        system.start()?;

        let mic = match MicSource::acquire(config.sample_rate) {
            Ok(mut mic) => match mic.start() {
                Ok(()) => Some(mic),
                Err(e) => {
                    warn!("Microphone stream failed, capturing system audio only: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("No microphone, capturing system audio only: {}", e);
                None
            }
        };

        let recorder = Recorder::start(Box::new(WavEncoder::new(config.sample_rate)));
        let graph = AudioGraph::new(
            system.buffer(),
            system.sample_rate(),
            mic.as_ref().map(|m| m.buffer()),
            config.sample_rate,
            recorder,
            surface,
            controls,
        );

        let cancel = CancellationToken::new();
        let pump = tokio::spawn(run_pump(
            graph,
            Duration::from_millis(config.tick_ms.max(1)),
            cancel.clone(),
        ));

        info!(
            "Capture session started ({}Hz pipeline, mic: {})",
            config.sample_rate,
            if mic.is_some() { "yes" } else { "no" }
        );

        Ok(Self {
            system,
            mic,
            cancel,
            pump: Some(pump),
        })
    }

    /// Stop the pump and the sources, returning the session blob. Safe to
    /// call again once stopped; later calls return `None`.
    pub async fn stop(&mut self) -> Option<RecordingBlob> {
        self.cancel.cancel();

        let blob = match self.pump.take() {
            Some(handle) => handle.await.ok().flatten(),
            None => None,
        };

        self.system.stop();
        if let Some(mic) = &mut self.mic {
            mic.stop();
        }

        blob
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.system.stop();
        if let Some(mic) = &mut self.mic {
            mic.stop();
        }
    }
}

/// The production [`CapturePort`]: builds a [`CaptureSession`] per open.
pub struct LiveCapture {
    config: CaptureConfig,
    controls: MicControlHandle,
    visualize: bool,
    session: Option<CaptureSession>,
}

impl LiveCapture {
    pub fn new(config: CaptureConfig, controls: MicControlHandle, visualize: bool) -> Self {
        Self {
            config,
            controls,
            visualize,
            session: None,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl CapturePort for LiveCapture {
    async fn open(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::Stream("capture already open".to_string()));
        }

        let surface: Box<dyn SpectrumSurface> = if self.visualize {
            Box::new(TerminalMeter::default())
        } else {
            Box::new(NullSurface)
        };

        self.controls.set_audible(false);
        self.session = Some(CaptureSession::start(
            &self.config,
            self.controls.clone(),
            surface,
        )?);
        Ok(())
    }

    async fn close(&mut self) -> Option<RecordingBlob> {
        match self.session.take() {
            Some(mut session) => session.stop().await,
            None => None,
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }
}
