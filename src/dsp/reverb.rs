//! Convolution reverb send.
//!
//! A mono send bus convolved with a stereo impulse response using uniformly
//! partitioned overlap-save FFT convolution. The impulse is split into
//! block-sized partitions whose spectra are computed once; each block costs
//! one forward FFT plus one inverse FFT per output channel, independent of
//! impulse length apart from the spectral multiply-accumulate.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::impulse::Impulse;

/// Partitioned FFT convolver: mono in, stereo out.
pub struct Convolver {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Impulse partition spectra per output channel.
    partitions: [Vec<Vec<Complex<f32>>>; 2],
    /// Frequency-domain delay line of past input spectra (ring buffer).
    history: Vec<Vec<Complex<f32>>>,
    cursor: usize,
    /// Previous block followed by the current block.
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Consecutive all-zero input blocks; once the delay line has flushed,
    /// processing is skipped.
    idle_blocks: usize,
}

impl Convolver {
    pub fn new(impulse: &Impulse, block: usize) -> Self {
        let size = block * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let count = impulse.len().div_ceil(block).max(1);
        let mut spectra_for = |channel: &[f32]| -> Vec<Vec<Complex<f32>>> {
            (0..count)
                .map(|p| {
                    let mut buf = vec![Complex::default(); size];
                    let start = p * block;
                    let end = (start + block).min(channel.len());
                    for (dst, &src) in buf.iter_mut().zip(channel[start.min(end)..end].iter()) {
                        dst.re = src;
                    }
                    fft.process_with_scratch(&mut buf, &mut scratch);
                    buf
                })
                .collect()
        };
        let partitions = [spectra_for(&impulse.left), spectra_for(&impulse.right)];

        Convolver {
            block,
            fft,
            ifft,
            partitions,
            history: vec![vec![Complex::default(); size]; count],
            cursor: 0,
            window: vec![0.0; size],
            spectrum: vec![Complex::default(); size],
            accum: vec![Complex::default(); size],
            scratch,
            idle_blocks: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block
    }

    /// Convolve one block. All slices must be `block_size()` long; the
    /// result is written (not added) to `left` and `right`.
    pub fn process_block(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        let block = self.block;
        let count = self.history.len();

        if input.iter().all(|&s| s == 0.0) {
            self.idle_blocks = self.idle_blocks.saturating_add(1);
        } else {
            self.idle_blocks = 0;
        }
        if self.idle_blocks > count + 1 {
            left[..block].fill(0.0);
            right[..block].fill(0.0);
            return;
        }

        // Slide the input window and transform it.
        self.window.copy_within(block.., 0);
        self.window[block..].copy_from_slice(&input[..block]);
        for (dst, &src) in self.spectrum.iter_mut().zip(self.window.iter()) {
            *dst = Complex::new(src, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);
        self.history[self.cursor].copy_from_slice(&self.spectrum);

        let norm = 1.0 / (2 * block) as f32;
        for (channel, out) in [left, right].into_iter().enumerate() {
            self.accum.fill(Complex::default());
            for (p, partition) in self.partitions[channel].iter().enumerate() {
                let past = &self.history[(self.cursor + count - p) % count];
                for ((acc, x), h) in self.accum.iter_mut().zip(past).zip(partition) {
                    *acc += x * h;
                }
            }
            self.ifft
                .process_with_scratch(&mut self.accum, &mut self.scratch);
            for (o, y) in out[..block].iter_mut().zip(&self.accum[block..]) {
                *o = y.re * norm;
            }
        }

        self.cursor = (self.cursor + 1) % count;
    }
}

/// The shared reverb send: convolver plus fixed return gain.
pub struct ReverbSend {
    convolver: Convolver,
    pub send_level: f64,
    input: Vec<f32>,
    wet_l: Vec<f32>,
    wet_r: Vec<f32>,
}

impl ReverbSend {
    pub fn new(impulse: &Impulse, block: usize, send_level: f64) -> Self {
        ReverbSend {
            convolver: Convolver::new(impulse, block),
            send_level,
            input: vec![0.0; block],
            wet_l: vec![0.0; block],
            wet_r: vec![0.0; block],
        }
    }

    /// Convolve one block of send signal and return the scaled wet pair.
    pub fn process(&mut self, send: &[f64]) -> (&[f32], &[f32]) {
        for (dst, &src) in self.input.iter_mut().zip(send) {
            *dst = src as f32;
        }
        self.convolver
            .process_block(&self.input, &mut self.wet_l, &mut self.wet_r);
        let level = self.send_level as f32;
        for s in self.wet_l.iter_mut().chain(self.wet_r.iter_mut()) {
            *s *= level;
        }
        (self.wet_l.as_slice(), self.wet_r.as_slice())
    }
}
