// View models for the results page and dashboard: tiers, score animations,
// gauge geometry and the details accordion. Pure, no I/O.

pub mod accordion;
pub mod gauge;
pub mod report;
pub mod tier;
pub mod tween;
