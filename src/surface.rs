//! Surface-area and hydrogen-bond report parsing.
//!
//! Both reports come from the visualization tool's saved logs and are only
//! semi-structured: the SASA report is an HTML-ish log dump mixing command
//! echoes with measurement lines, and the H-bond report is a plain-text list
//! with headers and footers. The parsers here are deliberately lenient:
//! malformed lines are skipped and counted rather than aborting the parse, so
//! a caller can distinguish "empty input" (zero records, zero warnings) from
//! "garbled input" (zero records, many warnings).
//!
//! Recognized shapes:
//! - total SASA: a line mentioning `area` with an `=` followed by a number,
//!   e.g. `Solvent accessible area for #1/A:294-302 = 1643.2`;
//! - per-residue SASA: a line carrying a residue spec like `#1/A:298` (the
//!   model prefix is optional) and an `area` token followed by a number;
//! - H-bond record: a non-header line whose last or second-to-last token
//!   parses as a number (the measured distance).

use crate::model::{ModelId, ResidueId, ResidueSet};
use polars::prelude::*;
use tracing::debug;

/// Parsed surface-area measurements for one model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SasaReport {
    /// Total solvent-accessible surface area, in Å². Taken from explicit
    /// total lines when present (summed if there are several), otherwise the
    /// sum of per-residue areas.
    pub total: Option<f64>,
    /// Per-residue areas, restricted to the requested region. Residues of
    /// the region absent from the report are omitted, not zero-filled.
    pub per_residue: Vec<(ResidueId, f64)>,
    /// Count of malformed lines plus region residues missing from the report.
    pub warnings: u32,
}

/// Parsed hydrogen-bond measurements for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HbondReport {
    /// Number of bond records found.
    pub count: u32,
    /// Count of lines that looked like records but could not be parsed.
    pub warnings: u32,
}

/// Combined surface/H-bond measurements for one model, as merged downstream.
/// Either sub-report may be absent when its file was never produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceBondRecord {
    /// Total SASA, if a surface report was parsed.
    pub total_sasa: Option<f64>,
    /// H-bond count, if a bond report was parsed.
    pub hbond_count: Option<u32>,
    /// Per-residue SASA over the region of interest.
    pub per_residue_sasa: Vec<(ResidueId, f64)>,
    /// Summed warning count across both parses.
    pub parse_warnings: u32,
}

impl SurfaceBondRecord {
    /// Assemble the per-model record from whichever sub-reports exist.
    pub fn from_reports(sasa: Option<SasaReport>, hbonds: Option<HbondReport>) -> Self {
        let mut record = Self::default();
        if let Some(sasa) = sasa {
            record.total_sasa = sasa.total;
            record.per_residue_sasa = sasa.per_residue;
            record.parse_warnings += sasa.warnings;
        }
        if let Some(hbonds) = hbonds {
            record.hbond_count = Some(hbonds.count);
            record.parse_warnings += hbonds.warnings;
        }
        record
    }

    /// True when neither sub-report contributed a measurement.
    pub fn is_vacant(&self) -> bool {
        self.total_sasa.is_none() && self.hbond_count.is_none() && self.per_residue_sasa.is_empty()
    }
}

/// Parse a surface-area report, keeping per-residue values for `region` only.
pub fn parse_sasa_report(text: &str, region: &ResidueSet) -> SasaReport {
    let mut report = SasaReport::default();
    let mut explicit_total: Option<f64> = None;
    let mut found = Vec::new();

    for raw in text.lines() {
        let line = strip_markup(raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_ascii_lowercase();
        if !lower.contains("area") {
            continue;
        }

        if let Some(eq) = line.find('=') {
            // Total line. A broken number after '=' is worth a warning.
            match first_number(&line[eq + 1..]) {
                Some(v) => *explicit_total.get_or_insert(0.0) += v,
                None => report.warnings += 1,
            }
            continue;
        }

        // Per-residue line: residue spec + "area <value>".
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let residue = tokens.iter().find_map(|t| residue_spec(t));
        let value = tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case("area"))
            .and_then(|i| tokens.get(i + 1))
            .and_then(|t| t.parse::<f64>().ok());
        match (residue, value) {
            (Some(residue), Some(value)) => found.push((residue, value)),
            // Mentions "area" but is not a measurement we can read.
            _ => report.warnings += 1,
        }
    }

    for residue in region.iter() {
        match found.iter().find(|(r, _)| r == residue) {
            Some((_, area)) => report.per_residue.push((residue.clone(), *area)),
            None => report.warnings += 1,
        }
    }

    report.total = explicit_total.or_else(|| {
        if report.per_residue.is_empty() {
            None
        } else {
            Some(report.per_residue.iter().map(|(_, a)| a).sum())
        }
    });
    debug!(
        "SASA report: total={:?}, {} region residues, {} warnings",
        report.total,
        report.per_residue.len(),
        report.warnings
    );
    report
}

/// Parse a hydrogen-bond report into a record count.
pub fn parse_hbond_report(text: &str) -> HbondReport {
    let mut report = HbondReport::default();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.ends_with(':') {
            continue;
        }
        // Lines without digits are banner/footer commentary.
        if !line.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        // Summary footers ("2 hydrogen bonds found", "0 H-bonds") carry a
        // count, not a record. They are expected in well-formed reports and
        // must not register as warnings.
        let lower = line.to_ascii_lowercase();
        if lower.contains("hydrogen bond") || lower.contains("h-bond") {
            continue;
        }
        // A record carries its measured distance as the last column, with an
        // optional trailing marker such as "N/A".
        let has_distance = line
            .split_whitespace()
            .rev()
            .take(2)
            .any(|t| t.parse::<f64>().is_ok());
        if has_distance {
            report.count += 1;
        } else {
            report.warnings += 1;
        }
    }
    debug!("H-bond report: {} records, {} warnings", report.count, report.warnings);
    report
}

/// Drop `<...>` markup spans so saved HTML logs parse like plain text.
fn strip_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Read a residue spec such as `#1/A:298`, `/A:298` or `A:298` from a token.
fn residue_spec(token: &str) -> Option<ResidueId> {
    let token = token.trim_matches(|c: char| c == ',' || c == ';');
    let spec = match token.rfind('/') {
        Some(i) => &token[i + 1..],
        None => token,
    };
    let (chain, resi) = spec.split_once(':')?;
    if chain.is_empty() || !chain.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ResidueId::new(chain, resi.parse().ok()?))
}

/// First parsable number in a piece of text.
fn first_number(text: &str) -> Option<f64> {
    text.split_whitespace().find_map(|t| t.parse().ok())
}

/// Build the surface/bond summary table: one row per model.
pub fn surface_summary_df(rows: &[(ModelId, SurfaceBondRecord)]) -> DataFrame {
    df!(
        "label" => rows.iter().map(|(id, _)| id.as_str().to_owned()).collect::<Vec<String>>(),
        "total_sasa" => rows.iter().map(|(_, r)| r.total_sasa).collect::<Vec<Option<f64>>>(),
        "hbond_count" => rows.iter().map(|(_, r)| r.hbond_count).collect::<Vec<Option<u32>>>(),
        "parse_warnings" => rows.iter().map(|(_, r)| r.parse_warnings).collect::<Vec<u32>>(),
    )
    .unwrap()
    .sort(["label"], Default::default())
    .unwrap()
}

/// Build the companion per-residue SASA table, keyed by (model, residue).
pub fn per_residue_sasa_df(rows: &[(ModelId, SurfaceBondRecord)]) -> DataFrame {
    let flat: Vec<(&ModelId, &ResidueId, f64)> = rows
        .iter()
        .flat_map(|(id, r)| r.per_residue_sasa.iter().map(move |(res, a)| (id, res, *a)))
        .collect();
    df!(
        "label" => flat.iter().map(|(id, _, _)| id.as_str().to_owned()).collect::<Vec<String>>(),
        "chain" => flat.iter().map(|(_, res, _)| res.chain.to_owned()).collect::<Vec<String>>(),
        "resi" => flat.iter().map(|(_, res, _)| res.resi as i64).collect::<Vec<i64>>(),
        "sasa" => flat.iter().map(|(_, _, a)| *a).collect::<Vec<f64>>(),
    )
    .unwrap()
    .sort(["label", "chain", "resi"], Default::default())
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SASA_LOG: &str = "\
<html><body>
<div class=\"cxcmd\">measure sasa #2/A:296-300</div>
Solvent accessible area for #2/A:296-300 = 512.75
residue id #2/A:296 GLN 296 area 120.5
residue id #2/A:297 LEU 297 area 80.25
residue id #2/A:299 SER 299 area 44.0
residue id #2/A:300 VAL 300 area garbled
</body></html>
";

    fn region(expr: &str) -> ResidueSet {
        ResidueSet::from_expr(expr).unwrap()
    }

    #[test]
    fn total_comes_from_the_explicit_line() {
        let report = parse_sasa_report(SASA_LOG, &region("A:296-297"));
        assert_eq!(report.total, Some(512.75));
        assert_eq!(report.per_residue.len(), 2);
        assert_eq!(report.per_residue[0], (ResidueId::new("A", 296), 120.5));
    }

    #[test]
    fn missing_region_residues_are_omitted_and_counted() {
        // 298 never appears and 300's value is garbled: both end up as
        // warnings (plus one for the garbled line itself), neither as a zero.
        let report = parse_sasa_report(SASA_LOG, &region("A:296-300"));
        let resis: Vec<isize> = report.per_residue.iter().map(|(r, _)| r.resi).collect();
        assert_eq!(resis, vec![296, 297, 299]);
        assert_eq!(report.warnings, 3);
    }

    #[test]
    fn total_falls_back_to_per_residue_sum() {
        let text = "residue id /A:1 GLY 1 area 10.0\nresidue id /A:2 ALA 2 area 5.5\n";
        let report = parse_sasa_report(text, &region("A:1-2"));
        assert_eq!(report.total, Some(15.5));
    }

    #[test]
    fn empty_and_garbled_inputs_are_distinguishable() {
        let empty = parse_sasa_report("", &ResidueSet::default());
        assert_eq!(empty.total, None);
        assert_eq!(empty.warnings, 0);

        let garbled = parse_sasa_report(
            "area area area\nsurface area = broken\n",
            &ResidueSet::default(),
        );
        assert_eq!(garbled.total, None);
        assert!(garbled.warnings > 0, "garbled input must leave a trace");
    }

    const HBOND_LOG: &str = "\
H-bonds (donor, acceptor, hydrogen, D..A dist, D-H..A dist):
#1/A GLN 296 NE2  #1/A GLU 299 OE1  no hydrogen  2.897  N/A
#1/A SER 297 OG   #1/A VAL 300 O    no hydrogen  3.104  N/A
#1/A LYS 301 NZ   #1/A ASP 305 OD2  no hydrogen  corrupted  N/A

2 hydrogen bonds found
";

    #[test]
    fn bond_records_are_counted_and_bad_lines_warned() {
        let report = parse_hbond_report(HBOND_LOG);
        // Only the corrupted record warns; the "2 hydrogen bonds found"
        // footer is part of a well-formed report.
        assert_eq!(report.count, 2);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn empty_hbond_report_is_zero_zero() {
        let report = parse_hbond_report("H-bonds (donor, acceptor):\n\n");
        assert_eq!(report, HbondReport { count: 0, warnings: 0 });
    }

    #[test]
    fn zero_bond_report_is_valid_not_garbled() {
        // A region with no bonds still produces a clean report; its summary
        // footer must not read as a malformed record.
        let report = parse_hbond_report(
            "H-bonds (donor, acceptor, hydrogen, D..A dist, D-H..A dist):\n\
             0 hydrogen bonds found\n",
        );
        assert_eq!(report, HbondReport { count: 0, warnings: 0 });
    }

    #[test]
    fn vacant_record_detection() {
        let record = SurfaceBondRecord::from_reports(None, None);
        assert!(record.is_vacant());
        let record =
            SurfaceBondRecord::from_reports(None, Some(HbondReport { count: 0, warnings: 0 }));
        assert!(!record.is_vacant());
    }
}
