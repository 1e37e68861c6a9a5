//! Fixed-shape MFCC feature frontend feeding the INT8 wake-word network.
//!
//! Accumulates one second of 16kHz audio, slides a 25ms/10ms-hop window
//! across it, and reduces each window to [`N_MFCC`] coefficients via a
//! Hann-windowed DFT, a triangular mel filterbank, and an orthonormal
//! DCT-II. The Hann window, filterbank, and DCT matrix are precomputed once
//! per [`MfccFrontend`] since the shapes never change between calls.

use realfft::RealFftPlanner;
use std::f32::consts::PI;
use std::sync::Arc;

pub const SAMPLE_RATE: f32 = 16_000.0;
pub const INPUT_BUFFER_SIZE: usize = 16_000; // 1s @ 16kHz
pub const WINDOW_SAMPLES: usize = 400; // 25ms
pub const HOP_SAMPLES: usize = 160; // 10ms
pub const N_MELS: usize = 40;
pub const N_MFCC: usize = 13;
pub const N_FRAMES: usize = (INPUT_BUFFER_SIZE - WINDOW_SAMPLES) / HOP_SAMPLES + 1;

fn n_fft() -> usize {
    WINDOW_SAMPLES.next_power_of_two()
}

pub struct MfccFrontend {
    hann: Vec<f32>,
    mel_filterbank: Vec<Vec<f32>>, // N_MELS x (n_fft/2 + 1)
    dct: Vec<Vec<f32>>,            // N_MFCC x N_MELS
    fft: Arc<dyn realfft::RealToComplex<f32>>,
    n_fft: usize,
}

impl MfccFrontend {
    pub fn new() -> Self {
        let n_fft = n_fft();
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            hann: hann_window(WINDOW_SAMPLES),
            mel_filterbank: create_mel_filterbank(N_MELS, n_fft, SAMPLE_RATE),
            dct: create_dct_matrix(N_MFCC, N_MELS),
            fft: planner.plan_fft_forward(n_fft),
            n_fft,
        }
    }

    /// Reduces `INPUT_BUFFER_SIZE` int16 PCM samples into an
    /// `N_FRAMES x N_MFCC` coefficient matrix, row-major.
    pub fn compute(&self, pcm: &[i16]) -> Vec<[f32; N_MFCC]> {
        assert!(
            pcm.len() >= INPUT_BUFFER_SIZE,
            "mfcc frontend requires at least {INPUT_BUFFER_SIZE} samples, got {}",
            pcm.len()
        );

        let samples: Vec<f32> = pcm[..INPUT_BUFFER_SIZE]
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect();

        let mut frames = Vec::with_capacity(N_FRAMES);
        let mut scratch = self.fft.make_input_vec();
        let mut spectrum = self.fft.make_output_vec();

        for frame_idx in 0..N_FRAMES {
            let start = frame_idx * HOP_SAMPLES;
            for i in 0..self.n_fft {
                scratch[i] = if i < WINDOW_SAMPLES {
                    samples[start + i] * self.hann[i]
                } else {
                    0.0
                };
            }

            self.fft
                .process(&mut scratch, &mut spectrum)
                .expect("fixed-size realfft plan never fails on a matching buffer");

            let power: Vec<f32> = spectrum.iter().map(|c| c.norm_sqr()).collect();

            let mut mel_energies = [0.0f32; N_MELS];
            for (m, filter) in self.mel_filterbank.iter().enumerate() {
                let energy: f32 = filter.iter().zip(power.iter()).map(|(w, p)| w * p).sum();
                mel_energies[m] = energy.max(1e-10).log10();
            }

            let mut mfcc = [0.0f32; N_MFCC];
            for (c, row) in self.dct.iter().enumerate() {
                mfcc[c] = row.iter().zip(mel_energies.iter()).map(|(w, e)| w * e).sum();
            }
            frames.push(mfcc);
        }

        frames
    }
}

impl Default for MfccFrontend {
    fn default() -> Self {
        Self::new()
    }
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / (len - 1) as f32).cos())
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank, linear in mel-space, spanning DC to Nyquist.
fn create_mel_filterbank(n_mels: usize, n_fft: usize, sample_rate: f32) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;
    let mel_low = hz_to_mel(0.0);
    let mel_high = hz_to_mel(sample_rate / 2.0);

    let mel_points: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_low + (mel_high - mel_low) * i as f32 / (n_mels + 1) as f32)
        .collect();
    let bin_points: Vec<usize> = mel_points
        .iter()
        .map(|&mel| ((mel_to_hz(mel) * (n_fft as f32 + 1.0) / sample_rate).floor() as usize).min(n_bins - 1))
        .collect();

    let mut filterbank = vec![vec![0.0f32; n_bins]; n_mels];
    for m in 0..n_mels {
        let (left, center, right) = (bin_points[m], bin_points[m + 1], bin_points[m + 2]);
        for bin in left..center.max(left + 1) {
            if bin < n_bins && center > left {
                filterbank[m][bin] = (bin - left) as f32 / (center - left) as f32;
            }
        }
        for bin in center..right.max(center + 1) {
            if bin < n_bins && right > center {
                filterbank[m][bin] = (right - bin) as f32 / (right - center) as f32;
            }
        }
    }
    filterbank
}

/// Orthonormal DCT-II matrix: row 0 scaled by `sqrt(1/n)`, the rest by
/// `sqrt(2/n)`, matching the scipy `norm="ortho"` convention.
fn create_dct_matrix(n_mfcc: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let mut dct = vec![vec![0.0f32; n_mels]; n_mfcc];
    for (k, row) in dct.iter_mut().enumerate() {
        let scale = if k == 0 {
            (1.0 / n_mels as f32).sqrt()
        } else {
            (2.0 / n_mels as f32).sqrt()
        };
        for (n, coef) in row.iter_mut().enumerate() {
            *coef = scale * (PI / n_mels as f32 * (n as f32 + 0.5) * k as f32).cos();
        }
    }
    dct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_produces_the_expected_frame_and_coefficient_shape() {
        let frontend = MfccFrontend::new();
        let pcm = vec![0i16; INPUT_BUFFER_SIZE];
        let frames = frontend.compute(&pcm);
        assert_eq!(frames.len(), N_FRAMES);
        assert_eq!(frames[0].len(), N_MFCC);
    }

    #[test]
    fn silence_produces_finite_coefficients() {
        let frontend = MfccFrontend::new();
        let pcm = vec![0i16; INPUT_BUFFER_SIZE];
        let frames = frontend.compute(&pcm);
        for frame in &frames {
            for &coef in frame {
                assert!(coef.is_finite());
            }
        }
    }

    #[test]
    fn mel_filterbank_rows_only_cover_valid_bins() {
        let n_fft = n_fft();
        let bank = create_mel_filterbank(N_MELS, n_fft, SAMPLE_RATE);
        assert_eq!(bank.len(), N_MELS);
        for row in &bank {
            assert_eq!(row.len(), n_fft / 2 + 1);
            assert!(row.iter().all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn dct_first_row_uses_the_orthonormal_dc_scale() {
        let dct = create_dct_matrix(N_MFCC, N_MELS);
        let expected = (1.0 / N_MELS as f32).sqrt();
        assert!((dct[0][0] - expected).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "requires at least")]
    fn compute_panics_on_undersized_input() {
        let frontend = MfccFrontend::new();
        frontend.compute(&[0i16; 10]);
    }
}
