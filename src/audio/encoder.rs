//! Encoding of the mixed stream into the session blob.
//!
//! The actual codec sits behind [`AudioEncoder`]; the pipeline only sees
//! opaque encoded chunks, which the [`Recorder`] accumulates in arrival
//! order and concatenates into exactly one blob when the session stops.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use super::CaptureError;

/// The finished recording: one encoded payload plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Platform encoder boundary. Chunk boundaries are the encoder's business;
/// the recorder preserves their order and nothing else.
pub trait AudioEncoder: Send {
    fn mime_type(&self) -> &str;

    /// Consume a block of mixed samples, returning any chunks that became
    /// ready.
    fn encode(&mut self, block: &[f32]) -> Result<Vec<Vec<u8>>, CaptureError>;

    /// Flush and return the remaining chunks.
    fn finish(&mut self) -> Result<Vec<Vec<u8>>, CaptureError>;
}

/// WAV encoder: 16-bit PCM mono, assembled in memory.
///
/// WAV needs its header finalized with known sizes, so all chunks surface
/// from `finish` as a single payload.
pub struct WavEncoder {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl WavEncoder {
    pub const MIME_TYPE: &'static str = "audio/wav";

    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }
}

impl AudioEncoder for WavEncoder {
    fn mime_type(&self) -> &str {
        Self::MIME_TYPE
    }

    fn encode(&mut self, block: &[f32]) -> Result<Vec<Vec<u8>>, CaptureError> {
        self.samples.extend_from_slice(block);
        Ok(Vec::new())
    }

    fn finish(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
            for &sample in &self.samples {
                let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(value)
                    .map_err(|e| CaptureError::Encode(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
        }

        self.samples.clear();
        Ok(vec![cursor.into_inner()])
    }
}

/// Accumulates encoded chunks and assembles the single session blob.
pub struct Recorder {
    encoder: Box<dyn AudioEncoder>,
    mime_type: String,
    chunks: Vec<Vec<u8>>,
    recording: bool,
}

impl Recorder {
    pub fn start(encoder: Box<dyn AudioEncoder>) -> Self {
        let mime_type = encoder.mime_type().to_string();
        Self {
            encoder,
            mime_type,
            chunks: Vec::new(),
            recording: true,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Feed a block of mixed samples through the encoder.
    pub fn push(&mut self, block: &[f32]) -> Result<(), CaptureError> {
        if !self.recording {
            return Ok(());
        }
        let chunks = self.encoder.encode(block)?;
        self.chunks.extend(chunks);
        Ok(())
    }

    /// Stop and assemble the blob: the concatenation, in arrival order, of
    /// every chunk the encoder delivered. No-op when not recording, so at
    /// most one blob exists per session.
    pub fn stop(&mut self) -> Option<RecordingBlob> {
        if !self.recording {
            return None;
        }
        self.recording = false;

        match self.encoder.finish() {
            Ok(chunks) => self.chunks.extend(chunks),
            Err(e) => {
                tracing::error!("Encoder flush failed: {}", e);
            }
        }

        let bytes: Vec<u8> = self.chunks.drain(..).flatten().collect();
        info!(
            "Recording assembled: {} bytes ({})",
            bytes.len(),
            self.mime_type
        );

        Some(RecordingBlob {
            bytes,
            mime_type: self.mime_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encoder that emits one chunk per block and a trailer on finish.
    struct FakeEncoder {
        counter: u8,
    }

    impl FakeEncoder {
        fn new() -> Self {
            Self { counter: 0 }
        }
    }

    impl AudioEncoder for FakeEncoder {
        fn mime_type(&self) -> &str {
            "audio/fake"
        }

        fn encode(&mut self, block: &[f32]) -> Result<Vec<Vec<u8>>, CaptureError> {
            self.counter += 1;
            Ok(vec![vec![self.counter; block.len()]])
        }

        fn finish(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
            Ok(vec![vec![0xFF]])
        }
    }

    #[test]
    fn test_blob_is_concatenation_in_arrival_order() {
        let mut recorder = Recorder::start(Box::new(FakeEncoder::new()));
        recorder.push(&[0.0; 2]).unwrap();
        recorder.push(&[0.0; 3]).unwrap();

        let blob = recorder.stop().expect("one blob");
        assert_eq!(blob.bytes, vec![1, 1, 2, 2, 2, 0xFF]);
        assert_eq!(blob.mime_type, "audio/fake");
    }

    #[test]
    fn test_second_stop_is_noop() {
        let mut recorder = Recorder::start(Box::new(FakeEncoder::new()));
        recorder.push(&[0.0; 1]).unwrap();
        assert!(recorder.stop().is_some());
        assert!(recorder.stop().is_none());
    }

    #[test]
    fn test_push_after_stop_is_ignored() {
        let mut recorder = Recorder::start(Box::new(FakeEncoder::new()));
        let blob = recorder.stop().unwrap();
        recorder.push(&[0.0; 4]).unwrap();
        assert!(recorder.stop().is_none());
        assert_eq!(blob.bytes, vec![0xFF]);
    }

    #[test]
    fn test_wav_encoder_single_chunk_with_header() {
        let mut encoder = WavEncoder::new(16_000);
        assert!(encoder.encode(&[0.0, 0.5, -0.5]).unwrap().is_empty());
        let chunks = encoder.finish().unwrap();
        assert_eq!(chunks.len(), 1);
        // RIFF header + 3 samples of 16-bit PCM
        assert_eq!(&chunks[0][..4], b"RIFF");
        assert_eq!(&chunks[0][8..12], b"WAVE");
    }

    #[test]
    fn test_wav_round_trip_preserves_length() {
        let mut recorder = Recorder::start(Box::new(WavEncoder::new(16_000)));
        recorder.push(&vec![0.25; 160]).unwrap();
        recorder.push(&vec![-0.25; 160]).unwrap();
        let blob = recorder.stop().unwrap();
        assert_eq!(blob.mime_type, "audio/wav");

        let reader = hound::WavReader::new(Cursor::new(blob.bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.len(), 320);
    }
}
