//! Length-changing resampling for the audio spectrum feeds.

/// Reduce `input` to roughly `target_len` values by binned averaging.
///
/// The input is walked with a fractional step of `input.len() / target_len`;
/// each bin sums the raw values between consecutive rounded thresholds and
/// divides by `bin_width * scalar`. The walk starts one step in, so the
/// output holds `target_len - 1` values and the trailing partial bin of the
/// input is dropped. Inputs no longer than `target_len` are returned
/// unchanged; this function never upsamples.
pub fn downsample(input: &[f32], target_len: usize, scalar: f32) -> Vec<f32> {
    if input.len() <= target_len || target_len == 0 {
        return input.to_vec();
    }

    let len = input.len();
    let incr = len as f64 / target_len as f64;
    let last_idx = len - 1;

    let mut output = Vec::with_capacity(target_len);
    let mut last = 0usize;
    let mut i = incr;
    while i < len as f64 {
        let mut rounded = i.round() as usize;
        if rounded > last_idx {
            rounded = last_idx;
        }
        let sum: f32 = input[last..rounded].iter().sum();
        output.push(sum / ((rounded - last) as f32 * scalar));
        last = rounded;
        i += incr;
    }

    output
}

/// Stretch `input` to `target_len` values by linear interpolation.
///
/// The first and last output elements are copied verbatim (unscaled);
/// interior elements interpolate between the neighboring samples and are
/// multiplied by `scalar`.
pub fn upsample(input: &[f32], target_len: usize, scalar: f32) -> Vec<f32> {
    if input.is_empty() || target_len == 0 {
        return Vec::new();
    }
    if target_len == 1 {
        return vec![input[0]];
    }

    let spring = (input.len() - 1) as f64 / (target_len - 1) as f64;

    let mut output = Vec::with_capacity(target_len);
    output.push(input[0]);
    for i in 1..target_len - 1 {
        let t = i as f64 * spring;
        let before = t.floor() as usize;
        let after = t.ceil() as usize;
        let frac = (t - before as f64) as f32;
        output.push((input[before] + (input[after] - input[before]) * frac) * scalar);
    }
    output.push(input[input.len() - 1]);

    output
}
