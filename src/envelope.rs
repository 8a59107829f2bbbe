use crate::coefficients::BlockCoefficients;

/// Gain reduction envelope, the only state that survives from one block to the next.
///
/// The envelope tracks how far the signal's magnitude exceeds the threshold, divided by the ratio.
/// Above the threshold it approaches that target with the attack coefficient and the output
/// magnitude becomes `threshold + envelope`. Below the threshold it decays towards zero with the
/// release coefficient and the sample passes through untouched. The makeup gain is applied to
/// every sample either way.
#[derive(Debug, Default, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32, coeffs: &BlockCoefficients) -> f32 {
        let magnitude = sample.abs();
        let compressed = if magnitude > coeffs.linear_threshold {
            let excess = magnitude - coeffs.linear_threshold;
            // A ratio of one still smooths towards the full excess rather than bypassing
            let target = excess / coeffs.ratio;
            self.envelope += coeffs.attack * (target - self.envelope);

            let level = coeffs.linear_threshold + self.envelope;
            if sample > 0.0 {
                level
            } else {
                -level
            }
        } else {
            self.envelope -= coeffs.release * self.envelope;
            self.envelope = self.envelope.max(0.0);
            sample
        };

        compressed * coeffs.linear_gain
    }

    pub fn process(&mut self, samples: &mut [f32], coeffs: &BlockCoefficients) {
        for sample in samples {
            *sample = self.process_sample(*sample, coeffs);
        }
    }
}
