use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Gain curve of a crossfade
///
/// `t` is fade progress in `[0.0, 1.0]`. Both sides ramp independently, so
/// the gains of a linear fade do not have to sum to one mid-transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Straight ramps, both clips audible mid-fade
    #[default]
    Linear,
    /// Sine/cosine ramps with `out² + in² = 1`
    EqualPower,
}

impl FadeCurve {
    /// Gain for the outgoing clip: 1.0 at `t = 0`, 0.0 at `t = 1`
    pub fn outgoing_gain(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let gain = match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        };
        gain.clamp(0.0, 1.0)
    }

    /// Gain for the incoming clip: 0.0 at `t = 0`, 1.0 at `t = 1`
    pub fn incoming_gain(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let gain = match self {
            FadeCurve::Linear => t,
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        };
        gain.clamp(0.0, 1.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::EqualPower => "equal_power",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_endpoints() {
        assert_eq!(FadeCurve::Linear.outgoing_gain(0.0), 1.0);
        assert_eq!(FadeCurve::Linear.outgoing_gain(1.0), 0.0);
        assert_eq!(FadeCurve::Linear.incoming_gain(0.0), 0.0);
        assert_eq!(FadeCurve::Linear.incoming_gain(1.0), 1.0);
        assert_eq!(FadeCurve::Linear.incoming_gain(1.5), 1.0);
    }

    #[test]
    fn test_equal_power_keeps_energy() {
        for i in 0..=50 {
            let t = i as f32 / 50.0;
            let out = FadeCurve::EqualPower.outgoing_gain(t);
            let inc = FadeCurve::EqualPower.incoming_gain(t);
            assert!((out * out + inc * inc - 1.0).abs() < 1e-5, "t = {}", t);
        }
        assert_eq!(FadeCurve::EqualPower.outgoing_gain(1.0), 0.0);
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in [FadeCurve::Linear, FadeCurve::EqualPower] {
            let mut prev_out = f32::MAX;
            let mut prev_in = f32::MIN;
            for i in 0..=50 {
                let t = i as f32 / 50.0;
                assert!(curve.outgoing_gain(t) <= prev_out);
                assert!(curve.incoming_gain(t) >= prev_in);
                prev_out = curve.outgoing_gain(t);
                prev_in = curve.incoming_gain(t);
            }
        }
    }

    #[test]
    fn test_serde_names() {
        let yaml = serde_yaml::to_string(&FadeCurve::EqualPower).unwrap();
        assert_eq!(yaml.trim(), "equal_power");
        let parsed: FadeCurve = serde_yaml::from_str("linear").unwrap();
        assert_eq!(parsed, FadeCurve::Linear);
    }
}
