//! Band-limited windowed-sinc resampler between the device sample rate and
//! the fixed 48 kHz base rate.
//!
//! Grounded directly in the reference resampler: a stored sinc table of
//! width 64 zero-crossings sampled 32 times per crossing, windowed with a
//! raised cosine, plus a persistent delay line that is shifted one sample at
//! a time as new input arrives.

const WIDTH: usize = 64;
const SAMPLES_PER_ZERO_CROSSING: usize = 32;
const DELAY_SIZE: usize = 140;

pub struct Resampler {
    sinc_table: Vec<f32>,
    delay_buffer: Vec<f32>,
    last_factor: f32,
}

impl Resampler {
    pub fn new() -> Self {
        Self {
            sinc_table: vec![0.0; WIDTH * SAMPLES_PER_ZERO_CROSSING],
            delay_buffer: vec![0.0; 3 * WIDTH],
            last_factor: -1.0,
        }
    }

    /// Clears the delay line. Latency after a reset is approximately `WIDTH`
    /// samples until the line refills.
    pub fn reset(&mut self) {
        self.delay_buffer.iter_mut().for_each(|v| *v = 0.0);
        self.last_factor = -1.0;
    }

    /// Resamples `src` by `factor = srcRate/dstRate`.
    ///
    /// When `dst` is `None`, returns the number of output samples that would
    /// be produced without writing them — used to size buffers ahead of a
    /// real call.
    pub fn resample(&mut self, factor: f32, src: &[f32], mut dst: Option<&mut Vec<f32>>) -> usize {
        if factor != self.last_factor {
            self.make_sinc();
            self.last_factor = factor;
        }

        if let Some(out) = dst.as_deref_mut() {
            out.clear();
        }

        let n_samples = src.len() as i64;
        let mut idx_inp: i64 = 0;
        let mut time_now: f64 = 0.0;
        let mut int_time: i64 = 0;
        let mut data_in = src.first().copied().unwrap_or(0.0);
        let mut n_out = 0usize;
        let mut not_done = true;

        while not_done {
            let mut acc = 0.0f64;
            let mut left_limit = time_now as i64 - WIDTH as i64 + 1;
            let mut right_limit = time_now as i64 + WIDTH as i64;
            if left_limit < 0 {
                left_limit = 0;
            }
            if right_limit > n_samples {
                right_limit = n_samples;
            }

            if factor < 1.0 {
                for j in left_limit..right_limit {
                    acc += self.gimme_data(j - int_time) as f64 * self.sinc(time_now - j as f64);
                }
            } else {
                let one_over_factor = 1.0 / factor as f64;
                for j in left_limit..right_limit {
                    acc += self.gimme_data(j - int_time) as f64
                        * one_over_factor
                        * self.sinc(one_over_factor * (time_now - j as f64));
                }
            }

            if let Some(out) = dst.as_deref_mut() {
                out.push(acc as f32);
            }
            n_out += 1;

            time_now += factor as f64;
            let last_time = int_time;
            int_time = time_now as i64;

            let mut t = last_time;
            while t < int_time {
                idx_inp += 1;
                if idx_inp == n_samples {
                    not_done = false;
                } else {
                    data_in = src[idx_inp as usize];
                }
                self.new_data(data_in);
                t += 1;
            }
        }

        n_out
    }

    fn gimme_data(&self, j: i64) -> f32 {
        self.delay_buffer[(j + WIDTH as i64) as usize]
    }

    fn new_data(&mut self, data: f32) {
        self.delay_buffer.copy_within(1..DELAY_SIZE - 5 + 1, 0);
        self.delay_buffer[DELAY_SIZE - 5] = data;
    }

    fn make_sinc(&mut self) {
        let win_freq = std::f64::consts::PI / WIDTH as f64 / SAMPLES_PER_ZERO_CROSSING as f64;
        self.sinc_table[0] = 1.0;
        for i in 1..WIDTH * SAMPLES_PER_ZERO_CROSSING {
            let temp = i as f64 * std::f64::consts::PI / SAMPLES_PER_ZERO_CROSSING as f64;
            let mut v = temp.sin() / temp;
            let win = 0.5 + 0.5 * (win_freq * i as f64).cos();
            v *= win;
            self.sinc_table[i] = v as f32;
        }
    }

    fn sinc(&self, x: f64) -> f64 {
        if x.abs() >= (WIDTH - 1) as f64 {
            return 0.0;
        }
        let temp = x.abs() * SAMPLES_PER_ZERO_CROSSING as f64;
        let low = temp as usize;
        let delta = temp - low as f64;
        let a = self.sinc_table[low] as f64;
        let b = self.sinc_table[low + 1] as f64;
        a + (b - a) * delta
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}
