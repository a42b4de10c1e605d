//! Microphone capture via cpal.
//!
//! The microphone is optional: if no input device exists or the stream
//! cannot be built, the session degrades to system-audio-only capture.
//! Callers decide that policy; this type just reports the failure.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::source::{CaptureSource, SampleBuffer};
use super::CaptureError;

pub struct MicSource {
    device: cpal::Device,
    samples: SampleBuffer,
    stream: Option<cpal::Stream>,
    active: bool,
    sample_rate: u32,
}

impl MicSource {
    /// Acquire the default input device, targeting the pipeline sample rate.
    pub fn acquire(sample_rate: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::Device("no microphone available".to_string()))?;

        info!(
            "Microphone source using device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        Ok(Self {
            device,
            samples: SampleBuffer::new(),
            stream: None,
            active: false,
            sample_rate,
        })
    }
}

impl CaptureSource for MicSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.active {
            return Err(CaptureError::Stream(
                "microphone source already capturing".to_string(),
            ));
        }

        self.samples.drain();

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let sink = self.samples.clone();
        let err_fn = |err| error!("Microphone stream error: {}", err);

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

        info!("Microphone capture started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("Stopping microphone stream");
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

impl Drop for MicSource {
    fn drop(&mut self) {
        if self.active {
            debug!("Dropping active MicSource, cleaning up");
            self.stop();
        }
    }
}
