use serde::Serialize;

/// Frames in every score animation.
pub const TWEEN_STEPS: u32 = 60;
pub const GAUGE_DURATION_MS: u32 = 1200;
pub const CIRCLE_DURATION_MS: u32 = 1000;

/// Linear count-up from 0 to `target`: frame `k` of `TWEEN_STEPS` shows
/// `round(k * target / TWEEN_STEPS)` and the last frame shows `target` exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTween {
    pub target: u32,
    pub duration_ms: u32,
    pub step_ms: u32,
    pub frames: Vec<u32>,
}

impl ScoreTween {
    pub fn new(target: u32, duration_ms: u32) -> Self {
        let frames = (1..=TWEEN_STEPS).map(|step| frame_value(target, step)).collect();
        Self {
            target,
            duration_ms,
            step_ms: duration_ms / TWEEN_STEPS,
            frames,
        }
    }
}

fn frame_value(target: u32, step: u32) -> u32 {
    if step >= TWEEN_STEPS {
        return target;
    }
    // Round half up in integer math: (2·k·t + n) / 2n, widened so any u32 target fits
    let steps = u64::from(TWEEN_STEPS);
    let value = (2 * u64::from(step) * u64::from(target) + steps) / (2 * steps);
    u32::try_from(value).unwrap_or(target)
}
