//! Tunable gameplay configuration
//!
//! All timing constants and speed epsilons from the game design are exposed
//! here. Hosts may pass a JSON object of overrides; each field is applied
//! independently and only when the value is a finite number, so a partial or
//! garbage config never breaks a mount.

use serde_json::Value;

/// Gameplay tuning (times in milliseconds, speeds in reference px/s)
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Downward gravity acceleration (px/s^2)
    pub gravity: f32,
    /// Minimum time in `Dropping` before stuck-checking starts
    pub min_drop_ms: f64,
    /// Continuous low-speed window that arms the stuck warning
    pub no_motion_ms: f64,
    /// Stuck warning pulse duration before forced despawn
    pub stuck_pulse_ms: f64,
    /// Minimum time inside a bin before a catch can confirm
    pub catch_linger_min_ms: f64,
    /// Continuous stillness window required to confirm a catch
    pub catch_still_ms: f64,
    /// Hold in `Rewarding` before despawn and score bump
    pub post_confirm_hold_ms: f64,
    /// Base delay before the intro "get ready" beat
    pub next_letter_delay_ms: f64,
    /// Randomized suspense window (drumroll plays for the drawn duration)
    pub suspense_min_ms: f64,
    pub suspense_max_ms: f64,
    /// Beat between drumroll end and letter reveal
    pub reveal_beat_ms: f64,
    /// Speed below which the letter counts as motionless (stuck heuristic)
    pub stuck_eps: f32,
    /// Speed below which the letter counts as settled (catch heuristic)
    pub catch_eps: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gravity: 1500.0,
            min_drop_ms: 2200.0,
            no_motion_ms: 2600.0,
            stuck_pulse_ms: 2200.0,
            catch_linger_min_ms: 1200.0,
            catch_still_ms: 520.0,
            post_confirm_hold_ms: 1100.0,
            next_letter_delay_ms: 1800.0,
            suspense_min_ms: 1000.0,
            suspense_max_ms: 3000.0,
            reveal_beat_ms: 650.0,
            stuck_eps: 14.0,
            catch_eps: 28.0,
        }
    }
}

/// Pull a finite numeric field out of a JSON object, or None
fn finite(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

impl GameConfig {
    /// Build a config from defaults plus an optional JSON override object.
    ///
    /// Unknown keys are ignored; non-numeric or non-finite values leave the
    /// default in place.
    pub fn from_overrides(overrides: Option<&Value>) -> Self {
        let mut cfg = Self::default();
        if let Some(obj) = overrides {
            cfg.apply_overrides(obj);
        }
        cfg
    }

    pub fn apply_overrides(&mut self, obj: &Value) {
        if let Some(v) = finite(obj, "gravity") {
            self.gravity = v as f32;
        }
        if let Some(v) = finite(obj, "minDropMs") {
            self.min_drop_ms = v;
        }
        if let Some(v) = finite(obj, "noMotionMs") {
            self.no_motion_ms = v;
        }
        if let Some(v) = finite(obj, "stuckPulseMs") {
            self.stuck_pulse_ms = v;
        }
        if let Some(v) = finite(obj, "catchLingerMinMs") {
            self.catch_linger_min_ms = v;
        }
        if let Some(v) = finite(obj, "catchStillMs") {
            self.catch_still_ms = v;
        }
        if let Some(v) = finite(obj, "postConfirmHoldMs") {
            self.post_confirm_hold_ms = v;
        }
        if let Some(v) = finite(obj, "nextLetterDelayMs") {
            self.next_letter_delay_ms = v;
        }
        if let Some(v) = finite(obj, "suspenseMinMs") {
            self.suspense_min_ms = v;
        }
        if let Some(v) = finite(obj, "suspenseMaxMs") {
            self.suspense_max_ms = v;
        }
        if let Some(v) = finite(obj, "revealBeatMs") {
            self.reveal_beat_ms = v;
        }
        if let Some(v) = finite(obj, "stuckEps") {
            self.stuck_eps = v as f32;
        }
        if let Some(v) = finite(obj, "catchEps") {
            self.catch_eps = v as f32;
        }
        // Keep the suspense window well-formed even with odd overrides
        if self.suspense_max_ms < self.suspense_min_ms {
            self.suspense_max_ms = self.suspense_min_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_design() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.min_drop_ms, 2200.0);
        assert_eq!(cfg.no_motion_ms, 2600.0);
        assert_eq!(cfg.stuck_pulse_ms, 2200.0);
        assert_eq!(cfg.catch_linger_min_ms, 1200.0);
        assert_eq!(cfg.catch_still_ms, 520.0);
        assert_eq!(cfg.post_confirm_hold_ms, 1100.0);
        assert_eq!(cfg.next_letter_delay_ms, 1800.0);
        assert_eq!(cfg.suspense_min_ms, 1000.0);
        assert_eq!(cfg.suspense_max_ms, 3000.0);
        assert_eq!(cfg.reveal_beat_ms, 650.0);
    }

    #[test]
    fn test_overrides_apply_independently() {
        let cfg = GameConfig::from_overrides(Some(&json!({
            "gravity": 900.0,
            "minDropMs": 100.0,
            "catchStillMs": "not a number",
            "unknownKey": 5.0,
        })));
        assert_eq!(cfg.gravity, 900.0);
        assert_eq!(cfg.min_drop_ms, 100.0);
        // Bad value falls back to default
        assert_eq!(cfg.catch_still_ms, 520.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        // JSON cannot encode NaN/inf; null and strings exercise the same path
        let cfg = GameConfig::from_overrides(Some(&json!({
            "gravity": null,
            "noMotionMs": [1, 2],
        })));
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn test_suspense_window_stays_ordered() {
        let cfg = GameConfig::from_overrides(Some(&json!({
            "suspenseMinMs": 4000.0,
        })));
        assert!(cfg.suspense_max_ms >= cfg.suspense_min_ms);
    }

    #[test]
    fn test_no_overrides_is_default() {
        assert_eq!(GameConfig::from_overrides(None), GameConfig::default());
    }
}
