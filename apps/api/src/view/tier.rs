use serde::Serialize;

/// Lowest score in the Strong tier.
pub const STRONG_MIN: u32 = 70;
/// Lowest score in the Good tier.
pub const GOOD_MIN: u32 = 50;

/// Cosmetic three-way bucket for a 0–100 score. Shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Strong,
    Good,
    NeedsWork,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub gradient_start: &'static str,
    pub gradient_end: &'static str,
    pub text_class: &'static str,
    pub badge_class: &'static str,
}

impl Tier {
    pub fn from_score(score: u32) -> Self {
        if score >= STRONG_MIN {
            Tier::Strong
        } else if score >= GOOD_MIN {
            Tier::Good
        } else {
            Tier::NeedsWork
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Strong => "Strong",
            Tier::Good => "Good",
            Tier::NeedsWork => "Needs Work",
        }
    }

    /// The ATS card calls its top tier "Excellent".
    pub fn ats_label(self) -> &'static str {
        match self {
            Tier::Strong => "Excellent",
            other => other.label(),
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Tier::Strong => Palette {
                gradient_start: "#12B76A",
                gradient_end: "#039855",
                text_class: "text-emerald-700",
                badge_class: "bg-emerald-100 text-emerald-700 border-emerald-200",
            },
            Tier::Good => Palette {
                gradient_start: "#F79009",
                gradient_end: "#DC6803",
                text_class: "text-amber-700",
                badge_class: "bg-amber-100 text-amber-700 border-amber-200",
            },
            Tier::NeedsWork => Palette {
                gradient_start: "#F04438",
                gradient_end: "#D92D20",
                text_class: "text-red-700",
                badge_class: "bg-red-100 text-red-700 border-red-200",
            },
        }
    }
}

/// Tier plus its presentation, as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub tier: Tier,
    pub label: &'static str,
    pub palette: Palette,
}

impl Badge {
    pub fn for_score(score: u32) -> Self {
        let tier = Tier::from_score(score);
        Self {
            tier,
            label: tier.label(),
            palette: tier.palette(),
        }
    }
}
