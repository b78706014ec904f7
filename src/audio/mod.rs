//! Sound playback, capture, and analysis.
//!
//! The engine plays decoded buffers and oscillators through rodio, captures
//! the microphone through cpal, and taps every active source into one mono
//! sample ring. The analyzer reads that ring on demand; nothing is pushed at
//! the render loop, which only asks for `get_analyzer_data` while
//! `playing()` reports true.

pub mod analyzer;
pub mod oscillator;

use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[allow(unused_imports)]
use log::{debug, error, info, warn};

use rodio::buffer::SamplesBuffer;
use rodio::source::ChannelVolume;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::errors::ShaderError;
use crate::shader_constants::{DEFAULT_FFT_SIZE, DEFAULT_SAMPLE_RATE};

pub use analyzer::{SampleRing, SharedTap, SpectrumAnalyzer, DEFAULT_MAX_DB, DEFAULT_MIN_DB};
pub use oscillator::{Oscillator, Waveform};

/// Decoded PCM audio, interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundBuffer {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl SoundBuffer {
    pub fn duration_secs(&self) -> f32 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.channels as u32 * self.sample_rate) as f32
    }
}

/// Wrapper that forwards samples unchanged while pushing a mono mixdown
/// into the shared tap for analysis.
struct TappedSource<S> {
    inner: S,
    tap: SharedTap,
    channels: u16,
    frame_pos: u16,
    acc: f32,
}

impl<S> TappedSource<S>
where
    S: Source<Item = f32>,
{
    fn new(inner: S, tap: SharedTap) -> Self {
        let channels = inner.channels().max(1);
        Self {
            inner,
            tap,
            channels,
            frame_pos: 0,
            acc: 0.0,
        }
    }
}

impl<S> Iterator for TappedSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;

        self.acc += sample;
        self.frame_pos += 1;
        if self.frame_pos == self.channels {
            let mono = self.acc / self.channels as f32;
            if let Ok(mut ring) = self.tap.lock() {
                ring.push(mono);
            }
            self.acc = 0.0;
            self.frame_pos = 0;
        }

        Some(sample)
    }
}

impl<S> Source for TappedSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

struct SoundSlot {
    buffer: SoundBuffer,
    sink: Sink,
    pan: f32,
}

/// Microphone capture session.
struct Recording {
    _stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    channels: u16,
    sample_rate: u32,
    save: bool,
}

/// Callback fired while a frequency bin sits above its threshold.
struct FrequencyTrigger {
    frequency: f32,
    threshold: f32,
    callback: Box<dyn FnMut()>,
}

/// Playback + capture + analysis engine.
pub struct SoundEngine {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    slots: Vec<SoundSlot>,
    osc_sinks: Vec<Sink>,
    tap: SharedTap,
    analyzer: SpectrumAnalyzer,
    recording: Option<Recording>,
    recorded: Option<SoundBuffer>,
    triggers: Vec<FrequencyTrigger>,
    sample_rate: u32,
}

impl SoundEngine {
    pub fn new() -> Result<Self, ShaderError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| ShaderError::Audio(format!("no output device: {e}")))?;

        Ok(Self {
            _stream: stream,
            handle,
            slots: Vec::new(),
            osc_sinks: Vec::new(),
            tap: analyzer::new_shared_tap(),
            analyzer: SpectrumAnalyzer::new(),
            recording: None,
            recorded: None,
            triggers: Vec::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        })
    }

    /// Play one oscillator per frequency; `seconds == 0` means until
    /// `stop_freq`.
    pub fn play_freq(
        &mut self,
        freqs: &[f32],
        seconds: f32,
        waveform: Waveform,
    ) -> Result<(), ShaderError> {
        self.osc_sinks.retain(|s| !s.empty());

        for &freq in freqs {
            let sink = Sink::try_new(&self.handle)
                .map_err(|e| ShaderError::Audio(format!("cannot create sink: {e}")))?;
            let osc = Oscillator::new(waveform, freq, self.sample_rate);
            let tapped = TappedSource::new(osc, self.tap.clone());
            if seconds > 0.0 {
                sink.append(tapped.take_duration(Duration::from_secs_f32(seconds)));
            } else {
                sink.append(tapped);
            }
            self.osc_sinks.push(sink);
        }

        debug!("Started {} oscillator(s)", freqs.len());
        Ok(())
    }

    /// Stop `count` oscillators starting at `first_index`.
    pub fn stop_freq(&mut self, first_index: usize, count: usize) {
        for sink in self.osc_sinks.iter().skip(first_index).take(count) {
            sink.stop();
        }
        self.osc_sinks.retain(|s| !s.empty());
    }

    /// Decode an audio file into a new sound slot.
    pub fn add_sound_file(&mut self, path: &str) -> Result<usize, ShaderError> {
        info!("Loading audio file: {}", path);

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| ShaderError::Audio(format!("failed to decode '{path}': {e}")))?;

        let channels = source.channels();
        let sample_rate = source.sample_rate();
        let samples: Vec<f32> = source.convert_samples().collect();
        info!("Audio format: {} Hz, {} channels", sample_rate, channels);

        self.add_sound_buffer(SoundBuffer {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Register a decoded buffer; returns its slot index.
    pub fn add_sound_buffer(&mut self, buffer: SoundBuffer) -> Result<usize, ShaderError> {
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| ShaderError::Audio(format!("cannot create sink: {e}")))?;
        self.slots.push(SoundSlot {
            buffer,
            sink,
            pan: 0.0,
        });
        Ok(self.slots.len() - 1)
    }

    /// Clone an existing slot's buffer into a new slot.
    pub fn copy_sound(&mut self, index: usize) -> Result<usize, ShaderError> {
        let buffer = self.slot(index)?.buffer.clone();
        self.add_sound_buffer(buffer)
    }

    /// Start a slot; `seconds == 0` plays to the end, `repeat` loops.
    pub fn play_sound(&mut self, index: usize, seconds: f32, repeat: bool) -> Result<(), ShaderError> {
        let tap = self.tap.clone();
        let slot = self.slot_mut(index)?;
        let source = SamplesBuffer::new(
            slot.buffer.channels,
            slot.buffer.sample_rate,
            slot.buffer.samples.clone(),
        );

        if repeat {
            append_tapped(&slot.sink, source.repeat_infinite(), slot.pan, tap, seconds);
        } else {
            append_tapped(&slot.sink, source, slot.pan, tap, seconds);
        }
        slot.sink.play();
        Ok(())
    }

    pub fn stop_sound(&mut self, index: usize) -> Result<(), ShaderError> {
        self.slot(index)?.sink.stop();
        Ok(())
    }

    /// Restart a slot from an offset, replacing whatever it was playing.
    pub fn seek_sound(&mut self, index: usize, seek_secs: f32, repeat: bool) -> Result<(), ShaderError> {
        let tap = self.tap.clone();
        let slot = self.slot_mut(index)?;

        let frame = slot.buffer.channels as usize;
        let mut offset = (seek_secs.max(0.0) * slot.buffer.sample_rate as f32) as usize * frame;
        offset = offset.min(slot.buffer.samples.len());
        offset -= offset % frame.max(1);

        let source = SamplesBuffer::new(
            slot.buffer.channels,
            slot.buffer.sample_rate,
            slot.buffer.samples[offset..].to_vec(),
        );

        slot.sink.stop();
        if repeat {
            append_tapped(&slot.sink, source.repeat_infinite(), slot.pan, tap, 0.0);
        } else {
            append_tapped(&slot.sink, source, slot.pan, tap, 0.0);
        }
        slot.sink.play();
        Ok(())
    }

    pub fn set_playback_rate(&mut self, index: usize, rate: f32) -> Result<(), ShaderError> {
        self.slot(index)?.sink.set_speed(rate);
        Ok(())
    }

    pub fn set_volume(&mut self, index: usize, volume: f32) -> Result<(), ShaderError> {
        self.slot(index)?.sink.set_volume(volume);
        Ok(())
    }

    /// Stereo balance, -1 (left) to 1 (right); takes effect on the next
    /// play/seek.
    pub fn set_panning(&mut self, index: usize, pan: f32) -> Result<(), ShaderError> {
        self.slot_mut(index)?.pan = pan.clamp(-1.0, 1.0);
        Ok(())
    }

    /// True while any slot or oscillator is emitting samples.
    pub fn playing(&self) -> bool {
        self.slots
            .iter()
            .any(|s| !s.sink.empty() && !s.sink.is_paused())
            || self.osc_sinks.iter().any(|s| !s.empty() && !s.is_paused())
    }

    /// Byte frequency bins (`fft_size / 2` of them) from the live tap.
    pub fn get_analyzer_data(&mut self, fft_size: usize) -> Vec<u8> {
        let samples = match self.tap.lock() {
            Ok(ring) => ring.latest(fft_size),
            Err(_) => vec![0.0; fft_size],
        };
        self.analyzer
            .byte_frequency_data(&samples, fft_size, DEFAULT_MIN_DB, DEFAULT_MAX_DB)
    }

    /// Frequency bins as floats, optionally normalized to 0-1.
    pub fn get_fft_data(
        &mut self,
        normalized: bool,
        fft_size: usize,
        min_db: f32,
        max_db: f32,
    ) -> Vec<f32> {
        let samples = match self.tap.lock() {
            Ok(ring) => ring.latest(fft_size),
            Err(_) => vec![0.0; fft_size],
        };
        self.analyzer
            .frequency_data(&samples, fft_size, normalized, min_db, max_db)
    }

    /// Capture the default input device into the analyzer tap; with `save`
    /// the raw PCM is kept for `replay_recording`.
    pub fn record(&mut self, save: bool) -> Result<(), ShaderError> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        if self.recording.is_some() {
            return Err(ShaderError::Audio("already recording".to_string()));
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ShaderError::Audio("no default input device".to_string()))?;
        let config = device
            .default_input_config()
            .map_err(|e| ShaderError::Audio(format!("no default input config: {e}")))?;

        info!(
            "Recording input - sample_rate: {}, channels: {}, format: {:?}",
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        let channels = config.channels();
        let sample_rate = config.sample_rate().0;
        let samples = Arc::new(Mutex::new(Vec::new()));

        let (tx, rx) = std::sync::mpsc::channel::<f32>();
        let tap = self.tap.clone();
        let sink_samples = samples.clone();
        let chan = channels as usize;

        // Tap thread: mixes incoming frames to mono for the analyzer and
        // appends raw samples to the recording when requested.
        std::thread::spawn(move || {
            let mut frame = Vec::with_capacity(chan);
            while let Ok(sample) = rx.recv() {
                if save {
                    if let Ok(mut rec) = sink_samples.lock() {
                        rec.push(sample);
                    }
                }
                frame.push(sample);
                if frame.len() == chan {
                    let mono = frame.iter().sum::<f32>() / chan as f32;
                    if let Ok(mut ring) = tap.lock() {
                        ring.push(mono);
                    }
                    frame.clear();
                }
            }
        });

        let cfg: cpal::StreamConfig = config.clone().into();
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_input_stream_f32(&device, &cfg, tx),
            cpal::SampleFormat::I16 => build_input_stream_i16(&device, &cfg, tx),
            cpal::SampleFormat::U16 => build_input_stream_u16(&device, &cfg, tx),
            other => {
                return Err(ShaderError::Audio(format!(
                    "unsupported input sample format {other:?}"
                )))
            }
        }
        .map_err(|e| ShaderError::Audio(format!("cannot build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| ShaderError::Audio(format!("cannot start input stream: {e}")))?;
        info!("Audio input stream started");

        self.recording = Some(Recording {
            _stream: stream,
            samples,
            channels,
            sample_rate,
            save,
        });
        Ok(())
    }

    /// Stop capturing; a saved recording becomes available for replay.
    pub fn stop_record(&mut self) {
        if let Some(recording) = self.recording.take() {
            if recording.save {
                let samples = recording
                    .samples
                    .lock()
                    .map(|s| s.clone())
                    .unwrap_or_default();
                info!("Recorded {} samples", samples.len());
                self.recorded = Some(SoundBuffer {
                    samples,
                    channels: recording.channels,
                    sample_rate: recording.sample_rate,
                });
            }
        }
    }

    /// Queue the last saved recording into a fresh slot and start it.
    pub fn replay_recording(&mut self) -> Result<usize, ShaderError> {
        let buffer = self
            .recorded
            .clone()
            .ok_or_else(|| ShaderError::Audio("no saved recording".to_string()))?;
        let index = self.add_sound_buffer(buffer)?;
        self.play_sound(index, 0.0, false)?;
        Ok(index)
    }

    /// Invoke `callback` whenever the bin nearest `frequency` exceeds
    /// `threshold` (normalized 0-1) during `poll_triggers`.
    pub fn on_frequency_cross(
        &mut self,
        frequency: f32,
        threshold: f32,
        callback: Box<dyn FnMut()>,
    ) {
        self.triggers.push(FrequencyTrigger {
            frequency,
            threshold,
            callback,
        });
    }

    /// Check every registered frequency trigger against the current
    /// spectrum; the helper calls this once per tick.
    pub fn poll_triggers(&mut self) {
        if self.triggers.is_empty() {
            return;
        }

        let samples = match self.tap.lock() {
            Ok(ring) => ring.latest(DEFAULT_FFT_SIZE),
            Err(_) => return,
        };
        let data =
            self.analyzer
                .frequency_data(&samples, DEFAULT_FFT_SIZE, true, DEFAULT_MIN_DB, 0.0);

        let nyquist = self.sample_rate as f32 / 2.0;
        for trigger in &mut self.triggers {
            let index = ((trigger.frequency / nyquist) * data.len() as f32).round() as usize;
            if let Some(&level) = data.get(index) {
                if level > trigger.threshold {
                    (trigger.callback)();
                }
            }
        }
    }

    pub fn sound_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Result<&SoundSlot, ShaderError> {
        self.slots
            .get(index)
            .ok_or_else(|| ShaderError::Audio(format!("no sound at index {index}")))
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut SoundSlot, ShaderError> {
        self.slots
            .get_mut(index)
            .ok_or_else(|| ShaderError::Audio(format!("no sound at index {index}")))
    }
}

/// Route a source through pan and tap stages, then queue it.
fn append_tapped<S>(sink: &Sink, source: S, pan: f32, tap: SharedTap, seconds: f32)
where
    S: Source<Item = f32> + Send + 'static,
{
    let panned = ChannelVolume::new(source, pan_volumes(pan));
    let tapped = TappedSource::new(panned, tap);
    if seconds > 0.0 {
        sink.append(tapped.take_duration(Duration::from_secs_f32(seconds)));
    } else {
        sink.append(tapped);
    }
}

/// Equal-power stereo gains for a pan position in [-1, 1].
fn pan_volumes(pan: f32) -> Vec<f32> {
    let p = (pan.clamp(-1.0, 1.0) + 1.0) * 0.5;
    vec![(1.0 - p).sqrt(), p.sqrt()]
}

fn build_input_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<f32>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    use cpal::traits::DeviceTrait;
    device.build_input_stream(
        config,
        move |data: &[f32], _| {
            for &s in data {
                let _ = tx.send(s);
            }
        },
        move |err| warn!("Audio input error: {err}"),
        None,
    )
}

fn build_input_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<f32>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    use cpal::traits::DeviceTrait;
    device.build_input_stream(
        config,
        move |data: &[i16], _| {
            for &s in data {
                let _ = tx.send(s as f32 / i16::MAX as f32);
            }
        },
        move |err| warn!("Audio input error: {err}"),
        None,
    )
}

fn build_input_stream_u16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<f32>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    use cpal::traits::DeviceTrait;
    device.build_input_stream(
        config,
        move |data: &[u16], _| {
            for &s in data {
                let _ = tx.send((s as f32 / u16::MAX as f32) * 2.0 - 1.0);
            }
        },
        move |err| warn!("Audio input error: {err}"),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_buffer_duration() {
        let buffer = SoundBuffer {
            samples: vec![0.0; 44100 * 2],
            channels: 2,
            sample_rate: 44100,
        };
        assert_eq!(buffer.duration_secs(), 1.0);
    }

    #[test]
    fn test_tapped_source_mixes_to_mono() {
        let tap = analyzer::new_shared_tap();
        // stereo frames: (1, 0), (0.5, 0.5)
        let source = SamplesBuffer::new(2, 44100, vec![1.0f32, 0.0, 0.5, 0.5]);
        let tapped = TappedSource::new(source, tap.clone());

        let forwarded: Vec<f32> = tapped.collect();
        assert_eq!(forwarded, vec![1.0, 0.0, 0.5, 0.5]);

        let ring = tap.lock().unwrap();
        assert_eq!(ring.latest(2), vec![0.5, 0.5]);
    }

    #[test]
    fn test_pan_gains_balance() {
        let center = pan_volumes(0.0);
        assert!((center[0] - center[1]).abs() < 1e-6);

        let left = pan_volumes(-1.0);
        assert_eq!(left[1], 0.0);
        assert!((left[0] - 1.0).abs() < 1e-6);
    }
}
