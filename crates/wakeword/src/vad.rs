//! Energy/zero-crossing-rate gate that decides whether a 20ms frame carries
//! voice before it reaches the MFCC frontend and neural detector. This is
//! the cheap upstream filter, not the neural classifier: it exists so the
//! expensive ONNX inference only runs on frames worth classifying.

use vox_config::settings::WakeWordConfig;

const FRAME_MS: u64 = 20;
const FPS: f64 = 1000.0 / FRAME_MS as f64;
const SMOOTHING_WINDOW: usize = 8;

/// Running energy/ZCR gate with hysteresis. `sensitivity` and the decision
/// windows come straight from [`WakeWordConfig`].
pub struct VoiceGate {
    sample_rate: u32,
    sensitivity: f32,
    frames_for_voice: u32,
    frames_for_silence: u32,
    history: [f32; SMOOTHING_WINDOW],
    history_len: usize,
    history_pos: usize,
    noise_floor: f32,
    voice_run: u32,
    silence_run: u32,
    voicing: bool,
}

/// One 20ms frame's worth of PCM samples, normalized to `[-1.0, 1.0]`.
pub struct Frame<'a> {
    pub samples: &'a [f32],
}

impl VoiceGate {
    pub fn new(config: &WakeWordConfig) -> Self {
        let frames_for_voice =
            (config.vad_voice_decision_ms as f64 / FRAME_MS as f64).ceil().max(1.0) as u32;
        let frames_for_silence =
            (config.vad_silence_decision_ms as f64 / FRAME_MS as f64).ceil().max(1.0) as u32;
        Self {
            sample_rate: config.sample_rate,
            sensitivity: config.vad_sensitivity,
            frames_for_voice,
            frames_for_silence,
            history: [0.0; SMOOTHING_WINDOW],
            history_len: 0,
            history_pos: 0,
            noise_floor: 0.01,
            voice_run: 0,
            silence_run: 0,
            voicing: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frame length in samples implied by this gate's configured sample
    /// rate at the fixed 20ms analysis window.
    pub fn frame_len(&self) -> usize {
        (self.sample_rate as f64 / FPS).round() as usize
    }

    pub fn reset(&mut self) {
        self.history = [0.0; SMOOTHING_WINDOW];
        self.history_len = 0;
        self.history_pos = 0;
        self.voice_run = 0;
        self.silence_run = 0;
        self.voicing = false;
    }

    /// Feeds one frame through the gate, returning whether the smoothed
    /// hysteresis state currently reads as "voice". The decision only flips
    /// after `frames_for_voice`/`frames_for_silence` consecutive frames
    /// agree, so a single noisy frame can't toggle the gate.
    pub fn process(&mut self, frame: &Frame<'_>) -> bool {
        let energy = rms_energy(frame.samples);
        let zcr = zero_crossing_rate(frame.samples);

        self.push_energy(energy);
        let smoothed = self.smoothed_energy();

        let threshold = self.noise_floor * (2.0 - self.sensitivity).max(0.1);
        let is_speech_frame =
            smoothed > threshold || (zcr > 0.1 && smoothed > 0.5 * self.noise_floor);

        if is_speech_frame {
            self.voice_run += 1;
            self.silence_run = 0;
        } else {
            self.silence_run += 1;
            self.voice_run = 0;
            // Only adapt the noise floor while we're confidently in silence,
            // so a sustained wake word doesn't raise its own threshold.
            if self.silence_run >= self.frames_for_silence {
                self.noise_floor = 0.95 * self.noise_floor + 0.05 * smoothed;
            }
        }

        if !self.voicing && self.voice_run >= self.frames_for_voice {
            self.voicing = true;
        } else if self.voicing && self.silence_run >= self.frames_for_silence {
            self.voicing = false;
        }

        self.voicing
    }

    fn push_energy(&mut self, energy: f32) {
        self.history[self.history_pos] = energy;
        self.history_pos = (self.history_pos + 1) % SMOOTHING_WINDOW;
        self.history_len = (self.history_len + 1).min(SMOOTHING_WINDOW);
    }

    fn smoothed_energy(&self) -> f32 {
        if self.history_len == 0 {
            return 0.0;
        }
        self.history[..self.history_len].iter().sum::<f32>() / self.history_len as f32
    }
}

fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WakeWordConfig {
        WakeWordConfig {
            vad_voice_decision_ms: 60,
            vad_silence_decision_ms: 120,
            ..Default::default()
        }
    }

    fn silence_frame(len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    fn loud_frame(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i % 2 == 0 { 0.9 } else { -0.9 })
            .collect()
    }

    #[test]
    fn stays_silent_on_low_energy_frames() {
        let cfg = config();
        let mut gate = VoiceGate::new(&cfg);
        let len = gate.frame_len();
        for _ in 0..10 {
            let samples = silence_frame(len);
            assert!(!gate.process(&Frame { samples: &samples }));
        }
    }

    #[test]
    fn requires_sustained_energy_before_flagging_voice() {
        let cfg = config();
        let mut gate = VoiceGate::new(&cfg);
        let len = gate.frame_len();
        let loud = loud_frame(len);

        let mut flagged = false;
        for _ in 0..10 {
            flagged = gate.process(&Frame { samples: &loud });
            if flagged {
                break;
            }
        }
        assert!(flagged, "sustained loud frames should eventually flip the gate to voice");
    }

    #[test]
    fn drops_back_to_silence_after_sustained_quiet() {
        let cfg = config();
        let mut gate = VoiceGate::new(&cfg);
        let len = gate.frame_len();
        let loud = loud_frame(len);
        let quiet = silence_frame(len);

        for _ in 0..10 {
            gate.process(&Frame { samples: &loud });
        }
        let mut dropped = false;
        for _ in 0..20 {
            if !gate.process(&Frame { samples: &quiet }) {
                dropped = true;
                break;
            }
        }
        assert!(dropped, "sustained silence should eventually drop the voice flag");
    }

    #[test]
    fn reset_clears_history_and_state() {
        let cfg = config();
        let mut gate = VoiceGate::new(&cfg);
        let len = gate.frame_len();
        let loud = loud_frame(len);
        for _ in 0..10 {
            gate.process(&Frame { samples: &loud });
        }
        gate.reset();
        assert_eq!(gate.smoothed_energy(), 0.0);
    }
}
