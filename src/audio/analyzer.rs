/// Real-time FFT analysis of the playback/capture sample tap.
use rustfft::{num_complex::Complex32, FftPlanner};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// ANALYZER TUNING CONSTANTS
// ============================================================================

/// How many recent mono samples the tap retains (enough for the largest FFT)
const TAP_CAPACITY: usize = 16384;

/// Temporal smoothing weight for the previous magnitude (0.0 = instant, 1.0 = frozen)
const SMOOTHING: f32 = 0.8;

/// Decibel window mapped onto the 0-255 byte range
pub const DEFAULT_MIN_DB: f32 = -100.0;
pub const DEFAULT_MAX_DB: f32 = -30.0;

// ============================================================================

/// Ring of the most recent mono samples, shared between the playback/capture
/// threads (writers) and the analyzer (reader).
#[derive(Debug)]
pub struct SampleRing {
    buf: VecDeque<f32>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The most recent `n` samples, zero-padded at the front when fewer have
    /// arrived.
    pub fn latest(&self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n.saturating_sub(self.buf.len())];
        let skip = self.buf.len().saturating_sub(n);
        out.extend(self.buf.iter().skip(skip));
        out
    }
}

/// Handle the audio sources write into as they emit samples.
pub type SharedTap = Arc<Mutex<SampleRing>>;

pub fn new_shared_tap() -> SharedTap {
    Arc::new(Mutex::new(SampleRing::new(TAP_CAPACITY)))
}

/// Frequency-domain view over the sample tap.
///
/// `byte_frequency_data` mirrors the byte semantics shader code expects from
/// an analyser node: `fft_size / 2` bins, Hann windowed, magnitudes smoothed
/// over time, dB-mapped onto 0-255.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    smoothed: Vec<f32>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            smoothed: Vec::new(),
        }
    }

    /// Frequency bins scaled to bytes over the `[min_db, max_db]` window.
    ///
    /// `samples` must hold exactly `fft_size` values (the tap's `latest`
    /// does this). Changing `fft_size` between calls resets the smoothing
    /// state.
    pub fn byte_frequency_data(
        &mut self,
        samples: &[f32],
        fft_size: usize,
        min_db: f32,
        max_db: f32,
    ) -> Vec<u8> {
        let bins = fft_size / 2;
        if self.smoothed.len() != bins {
            self.smoothed = vec![0.0; bins];
        }

        let fft = self.planner.plan_fft_forward(fft_size);

        // Hann window to reduce spectral leakage
        let mut buffer: Vec<Complex32> = (0..fft_size)
            .map(|i| {
                let window = 0.5
                    * (1.0
                        - ((2.0 * std::f32::consts::PI * i as f32) / (fft_size as f32 - 1.0))
                            .cos());
                let sample = samples.get(i).copied().unwrap_or(0.0);
                Complex32::new(sample * window, 0.0)
            })
            .collect();

        fft.process(&mut buffer);

        let range = max_db - min_db;
        let mut out = Vec::with_capacity(bins);
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let c = buffer[k];
            let magnitude = (c.re * c.re + c.im * c.im).sqrt() / fft_size as f32;
            *smoothed = *smoothed * SMOOTHING + magnitude * (1.0 - SMOOTHING);

            let db = 20.0 * smoothed.log10();
            let scaled = ((db - min_db) / range * 255.0).clamp(0.0, 255.0);
            out.push(scaled as u8);
        }

        out
    }

    /// Same bins normalized to 0-1 (or raw byte values as floats).
    pub fn frequency_data(
        &mut self,
        samples: &[f32],
        fft_size: usize,
        normalized: bool,
        min_db: f32,
        max_db: f32,
    ) -> Vec<f32> {
        let bytes = self.byte_frequency_data(samples, fft_size, min_db, max_db);
        if normalized {
            bytes.into_iter().map(|b| b as f32 / 255.0).collect()
        } else {
            bytes.into_iter().map(|b| b as f32).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_most_recent() {
        let mut ring = SampleRing::new(4);
        for i in 0..6 {
            ring.push(i as f32);
        }
        assert_eq!(ring.latest(4), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_ring_zero_pads_short_history() {
        let mut ring = SampleRing::new(8);
        ring.push(1.0);
        ring.push(2.0);
        assert_eq!(ring.latest(4), vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_silence_maps_to_zero_bytes() {
        let mut analyzer = SpectrumAnalyzer::new();
        let bins = analyzer.byte_frequency_data(&vec![0.0; 512], 512, DEFAULT_MIN_DB, DEFAULT_MAX_DB);
        assert_eq!(bins.len(), 256);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_raises_its_bin() {
        let fft_size = 512;
        let sample_rate = 44100.0;
        let freq = 4306.6; // bin 50 at this fft size
        let samples: Vec<f32> = (0..fft_size)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect();

        let mut analyzer = SpectrumAnalyzer::new();
        // run a few frames so smoothing settles
        let mut bins = Vec::new();
        for _ in 0..8 {
            bins = analyzer.byte_frequency_data(&samples, fft_size, DEFAULT_MIN_DB, DEFAULT_MAX_DB);
        }

        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i32 - 50).abs() <= 1, "peak bin was {peak}");
        assert!(bins[peak] > 0);
    }

    #[test]
    fn test_normalized_data_in_unit_range() {
        let mut analyzer = SpectrumAnalyzer::new();
        let samples: Vec<f32> = (0..256).map(|i| ((i % 7) as f32 - 3.0) / 3.0).collect();
        let data = analyzer.frequency_data(&samples, 256, true, DEFAULT_MIN_DB, 0.0);
        assert_eq!(data.len(), 128);
        assert!(data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
