//! SVG geometry for the score circle (dashboard cards) and the semicircular
//! overall-score gauge (report header).

use std::f64::consts::PI;

use serde::Serialize;

use super::tier::Badge;
use super::tween::{ScoreTween, CIRCLE_DURATION_MS, GAUGE_DURATION_MS};

const CIRCLE_RADIUS: f64 = 40.0;
const CIRCLE_STROKE: f64 = 7.0;
const GAUGE_RADIUS: f64 = 40.0;
const GAUGE_STROKE: f64 = 8.0;
pub const GAUGE_PATH: &str = "M10,45 A40,40 0 0,1 90,45";
const TRACK_COLOR: &str = "#E4E7EC";

fn fraction(score: u32) -> f64 {
    f64::from(score.min(100)) / 100.0
}

/// Full ring around the card score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCircle {
    pub score: u32,
    pub badge: Badge,
    pub radius: f64,
    pub stroke_width: f64,
    pub dash_array: f64,
    pub dash_offset: f64,
    pub animation: ScoreTween,
}

impl ScoreCircle {
    pub fn new(score: u32) -> Self {
        let normalized_radius = CIRCLE_RADIUS - CIRCLE_STROKE / 2.0;
        let circumference = 2.0 * PI * normalized_radius;
        Self {
            score,
            badge: Badge::for_score(score),
            radius: normalized_radius,
            stroke_width: CIRCLE_STROKE,
            dash_array: circumference,
            dash_offset: circumference * (1.0 - fraction(score)),
            animation: ScoreTween::new(score, CIRCLE_DURATION_MS),
        }
    }

    /// Static SVG of the finished animation.
    pub fn to_svg(&self) -> String {
        let palette = self.badge.palette;
        format!(
            r##"<svg viewBox="0 0 100 100" width="100" height="100" xmlns="http://www.w3.org/2000/svg"><defs><linearGradient id="score-grad-{score}" x1="0%" y1="0%" x2="100%" y2="100%"><stop offset="0%" stop-color="{start}"/><stop offset="100%" stop-color="{end}"/></linearGradient></defs><g transform="rotate(-90 50 50)"><circle cx="50" cy="50" r="{r}" stroke="{track}" stroke-width="{w}" fill="transparent"/><circle cx="50" cy="50" r="{r}" stroke="url(#score-grad-{score})" stroke-width="{w}" fill="transparent" stroke-dasharray="{da:.3}" stroke-dashoffset="{off:.3}" stroke-linecap="round"/></g><text x="50" y="54" text-anchor="middle" font-weight="bold">{score}</text></svg>"##,
            score = self.score,
            start = palette.gradient_start,
            end = palette.gradient_end,
            r = self.radius,
            track = TRACK_COLOR,
            w = self.stroke_width,
            da = self.dash_array,
            off = self.dash_offset,
        )
    }
}

/// Half-ring gauge for the overall score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreGauge {
    pub score: u32,
    pub badge: Badge,
    pub path: &'static str,
    pub stroke_width: f64,
    pub path_length: f64,
    pub dash_offset: f64,
    pub animation: ScoreTween,
}

impl ScoreGauge {
    pub fn new(score: u32) -> Self {
        let path_length = PI * GAUGE_RADIUS;
        Self {
            score,
            badge: Badge::for_score(score),
            path: GAUGE_PATH,
            stroke_width: GAUGE_STROKE,
            path_length,
            dash_offset: path_length * (1.0 - fraction(score)),
            animation: ScoreTween::new(score, GAUGE_DURATION_MS),
        }
    }

    pub fn to_svg(&self) -> String {
        let palette = self.badge.palette;
        format!(
            r##"<svg viewBox="0 0 100 50" xmlns="http://www.w3.org/2000/svg"><defs><linearGradient id="gaugeGrad-{score}" x1="0%" y1="0%" x2="100%" y2="0%"><stop offset="0%" stop-color="{start}"/><stop offset="100%" stop-color="{end}"/></linearGradient></defs><path d="{path}" fill="none" stroke="{track}" stroke-width="{w}" stroke-linecap="round"/><path d="{path}" fill="none" stroke="url(#gaugeGrad-{score})" stroke-width="{w}" stroke-linecap="round" stroke-dasharray="{len:.3}" stroke-dashoffset="{off:.3}"/><text x="50" y="44" text-anchor="middle" font-weight="bold">{score}/100</text></svg>"##,
            score = self.score,
            start = palette.gradient_start,
            end = palette.gradient_end,
            path = self.path,
            track = TRACK_COLOR,
            w = self.stroke_width,
            len = self.path_length,
            off = self.dash_offset,
        )
    }
}
