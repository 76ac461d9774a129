/// Headless audio backend
///
/// Decodes with Symphonia and "plays" by keeping time: an output sleeps for
/// the remaining length of the buffer and then reports a natural end. Used by
/// `reverie play` to drive the engine without an audio device.
use async_trait::async_trait;
use reverie_playback::{AudioBackend, AudioBuffer, AudioOutput, EndedSignal, PlaybackError, Result};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::task::JoinHandle;

/// Symphonia decoding with timer-driven outputs
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessBackend;

impl HeadlessBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioBackend for HeadlessBackend {
    async fn decode(&self, bytes: Vec<u8>) -> Result<AudioBuffer> {
        tokio::task::spawn_blocking(move || decode_all(bytes))
            .await
            .map_err(|e| PlaybackError::Decode(format!("Decoder task failed: {}", e)))?
    }

    fn create_output(
        &self,
        buffer: Arc<AudioBuffer>,
        ended: EndedSignal,
    ) -> Result<Box<dyn AudioOutput>> {
        Ok(Box::new(TimerOutput {
            buffer,
            ended,
            task: None,
        }))
    }
}

/// Decode a whole file into interleaved f32 samples
fn decode_all(bytes: Vec<u8>) -> Result<AudioBuffer> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Decode(format!("Failed to probe audio: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::Decode("No audio tracks found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let mut channels = track
        .codec_params
        .channels
        .map_or(2, |c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // Corrupt packet: skip it and keep going
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(PlaybackError::Decode("No audio frames decoded".to_string()));
    }

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

/// Output that reports its end once the buffer's remaining time has passed
struct TimerOutput {
    buffer: Arc<AudioBuffer>,
    ended: EndedSignal,
    task: Option<JoinHandle<()>>,
}

impl AudioOutput for TimerOutput {
    fn start(&mut self, offset: Duration) -> Result<()> {
        let remaining = self.buffer.duration().saturating_sub(offset);
        let ended = self.ended.clone();

        self.stop();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            ended.notify();
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TimerOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
