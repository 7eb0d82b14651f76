/// Dot product of two equal-length slices. Callers must guarantee the
/// lengths match.
pub fn weighted_sum(inputs: &[f32], weights: &[f32]) -> f32 {
    debug_assert_eq!(inputs.len(), weights.len());
    inputs.iter().zip(weights).map(|(i, w)| i * w).sum()
}

/// Affine remap of `x` from `[min0, max0]` onto `[min1, max1]`, anchored at
/// the maximum. Values outside the source range extrapolate; nothing clamps.
pub fn normalize(x: f32, min0: f32, max0: f32, min1: f32, max1: f32) -> f32 {
    (max1 - min1) / (max0 - min0) * (x - max0) + max1
}

/// Index of the largest value. Ties keep the earliest index.
pub fn arg_max(values: &[f32]) -> usize {
    let mut index = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[index] {
            index = i;
        }
    }
    index
}

/// Average over the last `window` samples, updated incrementally. The mean
/// starts at zero and warms up as the window fills.
pub struct MovingMean {
    window: Vec<f32>,
    next: usize,
    mean: f32,
}

impl MovingMean {
    pub fn new(window: usize) -> Self {
        assert!(window > 0);
        Self {
            window: vec![0.0; window],
            next: 0,
            mean: 0.0,
        }
    }

    pub fn update(&mut self, value: f32) -> f32 {
        let removed = self.window[self.next];
        self.window[self.next] = value;
        self.next = (self.next + 1) % self.window.len();
        self.mean += (value - removed) / self.window.len() as f32;
        self.mean
    }

    pub fn mean(&self) -> f32 {
        self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_dots_the_slices() {
        assert_eq!(weighted_sum(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]), 3.0);
        assert_eq!(weighted_sum(&[], &[]), 0.0);
    }

    #[test]
    fn normalize_remaps_unit_range() {
        assert_eq!(normalize(5.0, 0.0, 10.0, 0.0, 1.0), 0.5);
        assert_eq!(normalize(0.0, 0.0, 10.0, 0.0, 1.0), 0.0);
        assert_eq!(normalize(10.0, 0.0, 10.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn normalize_extrapolates_outside_the_source_range() {
        assert_eq!(normalize(15.0, 0.0, 10.0, 0.0, 1.0), 1.5);
        assert_eq!(normalize(-5.0, 0.0, 10.0, 0.0, 1.0), -0.5);
    }

    #[test]
    fn arg_max_keeps_the_earliest_tie() {
        assert_eq!(arg_max(&[0.1, 0.9, 0.3]), 1);
        assert_eq!(arg_max(&[0.5, 0.5, 0.5]), 0);
        assert_eq!(arg_max(&[2.0]), 0);
    }

    #[test]
    fn moving_mean_tracks_the_window() {
        let mut mean = MovingMean::new(4);
        assert_eq!(mean.update(4.0), 1.0);
        assert_eq!(mean.update(4.0), 2.0);
        assert_eq!(mean.update(4.0), 3.0);
        assert_eq!(mean.update(4.0), 4.0);

        // A full window of equal samples stays put.
        assert_eq!(mean.update(4.0), 4.0);

        // New samples displace the oldest.
        assert_eq!(mean.update(8.0), 5.0);
        assert_eq!(mean.mean(), 5.0);
    }

    #[test]
    #[should_panic]
    fn moving_mean_rejects_an_empty_window() {
        MovingMean::new(0);
    }
}
