use serde::{Deserialize, Serialize};

/// Role needs this many primary-tier hits; fewer can only reach secondary.
pub const PRIMARY_ROLE_MIN_EVIDENCE: u32 = 5;

pub const NO_EVIDENCE_CEILING: u8 = 10;
pub const SINGLE_PRIMARY_CEILING: u8 = 70;
pub const SINGLE_SUPPORTING_CEILING: u8 = 50;
pub const REPEATED_PRIMARY_CEILING: u8 = 85;
pub const REPEATED_SUPPORTING_CEILING: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkRole {
    Primary,
    Secondary,
    Reference,
}

impl FrameworkRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Reference => "reference",
        }
    }
}

/// Tier hits accumulated over every occurrence of one framework.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceCounts {
    pub primary: u32,
    pub secondary: u32,
    pub compliance: u32,
}

impl EvidenceCounts {
    pub fn strength(&self) -> u32 {
        25 * self.primary + 20 * self.compliance + 10 * self.secondary
    }

    pub fn is_empty(&self) -> bool {
        self.primary == 0 && self.secondary == 0 && self.compliance == 0
    }

    pub fn add(&mut self, other: EvidenceCounts) {
        self.primary += other.primary;
        self.secondary += other.secondary;
        self.compliance += other.compliance;
    }
}

pub fn confidence(total_occurrences: usize, relevant_occurrences: usize, evidence: EvidenceCounts) -> u8 {
    let strength = evidence.strength();
    let has_primary = evidence.primary > 0;

    let capped = |base: u32, ceiling: u8| base.saturating_add(strength).min(u32::from(ceiling)) as u8;

    match relevant_occurrences {
        0 => total_occurrences
            .saturating_mul(2)
            .min(usize::from(NO_EVIDENCE_CEILING)) as u8,
        1 if has_primary => capped(50, SINGLE_PRIMARY_CEILING),
        1 => capped(30, SINGLE_SUPPORTING_CEILING),
        _ if has_primary => capped(60, REPEATED_PRIMARY_CEILING),
        _ => capped(40, REPEATED_SUPPORTING_CEILING),
    }
}

/// Depends on raw tier counts only, never on confidence.
pub fn role(evidence: EvidenceCounts) -> FrameworkRole {
    if evidence.primary >= PRIMARY_ROLE_MIN_EVIDENCE {
        FrameworkRole::Primary
    } else if evidence.primary > 0 || evidence.compliance > 0 {
        FrameworkRole::Secondary
    } else {
        FrameworkRole::Reference
    }
}
