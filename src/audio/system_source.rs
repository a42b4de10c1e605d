//! System audio capture (what the other participants say).
//!
//! Captures from a PipeWire/PulseAudio monitor source, which exposes the
//! system's audio output (speakers/headphones) as an input device. Unlike
//! the microphone, system audio is mandatory: a meeting recording without
//! the meeting is worthless, so failure to find a monitor is fatal to the
//! session before any graph is built.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::source::{CaptureSource, SampleBuffer};
use super::CaptureError;

pub struct SystemAudioSource {
    device: cpal::Device,
    sample_rate: u32,
    samples: SampleBuffer,
    stream: Option<cpal::Stream>,
    active: bool,
}

impl SystemAudioSource {
    /// Locate a monitor source. Fails with [`CaptureError::NoSystemAudio`]
    /// when no monitor device exists.
    pub fn acquire() -> Result<Self, CaptureError> {
        let (device, sample_rate) =
            Self::find_monitor_device().ok_or(CaptureError::NoSystemAudio)?;

        Ok(Self {
            device,
            sample_rate,
            samples: SampleBuffer::new(),
            stream: None,
            active: false,
        })
    }

    fn find_monitor_device() -> Option<(cpal::Device, u32)> {
        let host = cpal::default_host();

        for device in host.input_devices().ok()? {
            if let Ok(name) = device.name() {
                if name.to_lowercase().contains("monitor") {
                    if let Ok(default_config) = device.default_input_config() {
                        let sample_rate = default_config.sample_rate().0;
                        info!("Found system audio monitor: {} ({}Hz)", name, sample_rate);
                        return Some((device, sample_rate));
                    }
                }
            }
        }

        None
    }
}

impl CaptureSource for SystemAudioSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.active {
            return Err(CaptureError::Stream(
                "system audio source already capturing".to_string(),
            ));
        }

        self.samples.drain();

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let sink = self.samples.clone();
        let err_fn = |err| error!("System audio stream error: {}", err);

        let stream = self
            .device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    sink.push(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        self.stream = Some(stream);
        self.active = true;

        info!("System audio capture started via monitor source");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("Stopping system audio stream");
            drop(stream);
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn buffer(&self) -> SampleBuffer {
        self.samples.clone()
    }
}

impl Drop for SystemAudioSource {
    fn drop(&mut self) {
        if self.active {
            debug!("Dropping active SystemAudioSource, cleaning up");
            self.stop();
        }
    }
}
