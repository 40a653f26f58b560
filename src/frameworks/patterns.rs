use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrameworkId {
    #[serde(rename = "GRI")]
    Gri,
    #[serde(rename = "TCFD")]
    Tcfd,
    #[serde(rename = "SASB")]
    Sasb,
    #[serde(rename = "CDP")]
    Cdp,
    #[serde(rename = "ISO")]
    Iso,
    #[serde(rename = "IFRS")]
    Ifrs,
    #[serde(rename = "CSRD")]
    Csrd,
}

impl FrameworkId {
    pub const ALL: [FrameworkId; 7] = [
        FrameworkId::Gri,
        FrameworkId::Tcfd,
        FrameworkId::Sasb,
        FrameworkId::Cdp,
        FrameworkId::Iso,
        FrameworkId::Ifrs,
        FrameworkId::Csrd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gri => "GRI",
            Self::Tcfd => "TCFD",
            Self::Sasb => "SASB",
            Self::Cdp => "CDP",
            Self::Iso => "ISO",
            Self::Ifrs => "IFRS",
            Self::Csrd => "CSRD",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Self::Gri => "Global Reporting Initiative",
            Self::Tcfd => "Task Force on Climate-related Financial Disclosures",
            Self::Sasb => "Sustainability Accounting Standards Board",
            Self::Cdp => "Carbon Disclosure Project",
            Self::Iso => "International Organization for Standardization",
            Self::Ifrs => "International Financial Reporting Standards",
            Self::Csrd => "Corporate Sustainability Reporting Directive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|framework| framework.as_str() == upper)
    }
}

impl std::fmt::Display for FrameworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Bare acronym.
    Exact,
    /// Spelled-out framework name.
    Phrase,
    /// Named standard or standard family.
    Standard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkPattern {
    pub framework: FrameworkId,
    pub patterns: Vec<(&'static str, PatternKind)>,
}

pub fn framework_patterns() -> Vec<FrameworkPattern> {
    use PatternKind::{Exact, Phrase, Standard};

    vec![
        FrameworkPattern {
            framework: FrameworkId::Gri,
            patterns: vec![
                ("GRI", Exact),
                ("Global Reporting Initiative", Phrase),
                ("GRI Standards", Standard),
                ("GRI Universal Standards", Standard),
                ("GRI Topic Standards", Standard),
            ],
        },
        FrameworkPattern {
            framework: FrameworkId::Tcfd,
            patterns: vec![
                ("TCFD", Exact),
                ("Task Force on Climate-related Financial Disclosures", Phrase),
            ],
        },
        FrameworkPattern {
            framework: FrameworkId::Sasb,
            patterns: vec![
                ("SASB", Exact),
                ("Sustainability Accounting Standards Board", Phrase),
                ("SASB Standards", Standard),
            ],
        },
        FrameworkPattern {
            framework: FrameworkId::Cdp,
            patterns: vec![("CDP", Exact), ("Carbon Disclosure Project", Phrase)],
        },
        FrameworkPattern {
            framework: FrameworkId::Iso,
            patterns: vec![
                ("ISO 14064", Standard),
                ("ISO 14001", Standard),
                ("ISO 26000", Standard),
                ("ISO 50001", Standard),
            ],
        },
        FrameworkPattern {
            framework: FrameworkId::Ifrs,
            patterns: vec![
                ("IFRS S1", Standard),
                ("IFRS S2", Standard),
                ("International Financial Reporting Standards", Phrase),
            ],
        },
        FrameworkPattern {
            framework: FrameworkId::Csrd,
            patterns: vec![
                ("CSRD", Exact),
                ("Corporate Sustainability Reporting Directive", Phrase),
                ("ESRS", Exact),
            ],
        },
    ]
}

/// Context phrases per evidence tier, matched against the lower-cased
/// occurrence sentence. None of them is a bare framework name, so a mention
/// alone never counts as evidence.
#[derive(Debug, Clone, Copy)]
pub struct TierIndicators {
    pub primary: &'static [&'static str],
    pub secondary: &'static [&'static str],
    pub compliance: &'static [&'static str],
}

const SHARED_PRIMARY: &[&str] = &[
    "in accordance",
    "prepared following",
    "prepared in line with",
    "reporting framework",
    "meets the requirements",
    "structured around",
    "reported under",
];

const SHARED_SECONDARY: &[&str] = &[
    "aligned with",
    "alignment with",
    "consistent with",
    "supplementary",
    "with reference to",
    "guided by",
    "informed by",
];

const SHARED_COMPLIANCE: &[&str] = &[
    "certified",
    "certification",
    "audited",
    "verified",
    "verification",
    "compliance",
    "compliant",
    "assurance",
];

pub fn shared_indicators() -> TierIndicators {
    TierIndicators {
        primary: SHARED_PRIMARY,
        secondary: SHARED_SECONDARY,
        compliance: SHARED_COMPLIANCE,
    }
}

pub fn framework_indicators(framework: FrameworkId) -> TierIndicators {
    match framework {
        FrameworkId::Gri => TierIndicators {
            primary: &["gri content index", "core option", "comprehensive option"],
            secondary: &["material topics"],
            compliance: &[],
        },
        FrameworkId::Tcfd => TierIndicators {
            primary: &["tcfd recommendations", "tcfd index", "four pillars"],
            secondary: &["climate-related risks", "climate risk", "scenario analysis"],
            compliance: &["adoption"],
        },
        FrameworkId::Sasb => TierIndicators {
            primary: &["sasb index", "industry standard for"],
            secondary: &["industry-specific metrics"],
            compliance: &[],
        },
        FrameworkId::Cdp => TierIndicators {
            primary: &["cdp response", "responded to cdp", "cdp questionnaire"],
            secondary: &["cdp score", "emissions disclosure"],
            compliance: &["submission", "participation"],
        },
        FrameworkId::Iso => TierIndicators {
            primary: &["iso reporting framework", "report prepared following iso"],
            secondary: &["management system", "environmental management"],
            compliance: &["accredited"],
        },
        FrameworkId::Ifrs => TierIndicators {
            primary: &["sustainability disclosure standards", "issb"],
            secondary: &["climate-related disclosures"],
            compliance: &["adoption"],
        },
        FrameworkId::Csrd => TierIndicators {
            primary: &["double materiality", "sustainability statement"],
            secondary: &["non-financial reporting", "esg reporting"],
            compliance: &["implementation"],
        },
    }
}

/// Label prefix and regex for disclosure references seen in occurrence
/// sentences; the first capture group is the reference number.
pub fn disclosure_ref_pattern(framework: FrameworkId) -> Option<(&'static str, &'static str)> {
    match framework {
        FrameworkId::Gri => Some(("GRI", r"(?i)\bGRI\s+(\d{3})(?:-\d{1,2})?\b")),
        FrameworkId::Iso => Some(("ISO", r"(?i)\bISO\s+(\d{4,5})\b")),
        FrameworkId::Ifrs => Some(("IFRS", r"(?i)\bIFRS\s+(S[12])\b")),
        FrameworkId::Csrd => Some(("ESRS", r"(?i)\bESRS\s+([ESG]\d)\b")),
        FrameworkId::Tcfd | FrameworkId::Sasb | FrameworkId::Cdp => None,
    }
}
