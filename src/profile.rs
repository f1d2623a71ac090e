//! Pore-radius profile parsing.
//!
//! Pore-profiling tools emit logs that mix banner text, warnings and numeric
//! data lines with variable spacing. Only the numeric lines matter here: any
//! line whose first three whitespace-separated tokens parse as finite numbers
//! is taken as a profile sample (axial position, radius; the remaining
//! columns are tool-specific extras and are ignored). Everything else is
//! skipped silently.

use crate::error::{AnalysisError, Result};

/// One `(axial position, radius)` sample of a pore profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSample {
    /// Position along the pore axis, in Å.
    pub axial: f64,
    /// Pore radius at that position, in Å.
    pub radius: f64,
}

/// An ordered pore-radius profile for one model.
///
/// Samples are strictly ascending in axial position; downstream gate-segment
/// logic relies on this.
#[derive(Debug, Clone, PartialEq)]
pub struct PoreProfile {
    samples: Vec<ProfileSample>,
}

impl PoreProfile {
    /// The samples, ascending in axial position.
    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the profile holds no samples. Never true for a parsed profile.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Build a profile directly from samples. Sorts by axial position and
    /// keeps the first sample of any duplicated position, so the strict
    /// ordering invariant holds regardless of input order.
    pub fn from_samples(samples: impl IntoIterator<Item = (f64, f64)>) -> Result<Self> {
        let mut samples: Vec<ProfileSample> = samples
            .into_iter()
            .filter(|(z, r)| z.is_finite() && r.is_finite())
            .map(|(axial, radius)| ProfileSample { axial, radius })
            .collect();
        if samples.is_empty() {
            return Err(AnalysisError::Parse {
                kind: "pore profile",
                reason: "no numeric (position, radius) samples found".to_string(),
            });
        }
        samples.sort_by(|a, b| a.axial.total_cmp(&b.axial));
        samples.dedup_by(|next, kept| next.axial == kept.axial);
        Ok(Self { samples })
    }
}

/// Parse a pore-profile log into a [`PoreProfile`].
///
/// Fails with [`AnalysisError::Parse`] if zero valid samples are extracted.
pub fn parse_profile_log(text: &str) -> Result<PoreProfile> {
    parse_profile_lines(text.lines())
}

/// Line-iterator variant of [`parse_profile_log`].
pub fn parse_profile_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<PoreProfile> {
    PoreProfile::from_samples(lines.filter_map(sample_from_line))
}

/// Extract `(axial, radius)` from a line if its first three tokens are all
/// numeric, `None` otherwise.
fn sample_from_line(line: &str) -> Option<(f64, f64)> {
    let mut tokens = line.split_whitespace();
    let z: f64 = tokens.next()?.parse().ok()?;
    let r: f64 = tokens.next()?.parse().ok()?;
    let _third: f64 = tokens.next()?.parse().ok()?;
    Some((z, r))
}
