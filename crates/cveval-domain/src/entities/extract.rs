//! Transient chain-step-1 extract shapes (§3).

use serde::{Deserialize, Serialize};

/// Structured extract of a candidate's CV, produced by chain step 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvExtract {
    /// Named skills found in the CV.
    pub skills: Vec<String>,
    /// Prior work experiences, one entry per role.
    pub experiences: Vec<String>,
    /// Notable personal/professional projects.
    pub projects: Vec<String>,
    /// A short free-text summary.
    pub summary: String,
}

/// Structured extract of a candidate's project report, produced by chain step 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectExtract {
    /// Requirements the report claims to satisfy.
    pub requirements: Vec<String>,
    /// Architectural decisions described in the report.
    pub architecture: Vec<String>,
    /// Strengths called out in the report.
    pub strengths: Vec<String>,
    /// Risks or gaps called out in the report.
    pub risks: Vec<String>,
    /// A short free-text summary.
    pub summary: String,
}
