//! Human-readable derivation of a packing result.
//!
//! The trace is built once per calculation and always contains every step.
//! Hiding pallet lines is a rendering decision taken through `TraceOptions`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::ValidatedInput;

/// Policy for pallet-related trace lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PalletLines {
    /// Hide pallet lines when every container is its own pallet.
    #[default]
    Auto,
    Always,
    Never,
}

impl PalletLines {
    pub fn as_str(&self) -> &'static str {
        match self {
            PalletLines::Auto => "auto",
            PalletLines::Always => "always",
            PalletLines::Never => "never",
        }
    }
}

impl fmt::Display for PalletLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PalletLines {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PalletLines::Auto),
            "always" | "show" => Ok(PalletLines::Always),
            "never" | "hide" => Ok(PalletLines::Never),
            other => Err(format!(
                "unknown pallet line policy '{}', expected auto, always or never",
                other
            )),
        }
    }
}

/// Presentation options for rendering a trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceOptions {
    pub pallet_lines: PalletLines,
}

impl TraceOptions {
    pub const fn with_pallet_lines(pallet_lines: PalletLines) -> Self {
        Self { pallet_lines }
    }
}

/// Step a trace line describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TraceLineKind {
    TotalUnits,
    UnitsPerContainer,
    ContainersPerPallet,
    ContainerDivision,
    PalletDivision,
    PalletedContainers,
    LeftoverContainers,
    PalletSummary,
    Summary,
}

impl TraceLineKind {
    /// Lines that only carry meaning when containers are grouped on pallets.
    pub fn is_pallet_line(&self) -> bool {
        matches!(
            self,
            TraceLineKind::ContainersPerPallet
                | TraceLineKind::PalletDivision
                | TraceLineKind::PalletedContainers
                | TraceLineKind::LeftoverContainers
                | TraceLineKind::PalletSummary
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct TraceLine {
    pub kind: TraceLineKind,
    pub text: String,
}

impl TraceLine {
    fn new(kind: TraceLineKind, text: String) -> Self {
        Self { kind, text }
    }
}

/// Numbers the trace narrates, taken from a finished calculation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TraceFacts {
    pub full_containers: u64,
    pub remainder_units: u64,
    pub total_containers: u64,
    pub full_pallets: u64,
    pub remainder_containers: u64,
}

/// Ordered derivation of a packing result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivationTrace {
    lines: Vec<TraceLine>,
    unit_pallet: bool,
}

fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

impl DerivationTrace {
    pub(crate) fn build(input: &ValidatedInput, facts: TraceFacts) -> Self {
        let units = input.total_units();
        let per_container = input.units_per_container();
        let per_pallet = input.containers_per_pallet();
        let paletted = per_pallet * facts.full_pallets;

        let mut lines = Vec::with_capacity(9);
        lines.push(TraceLine::new(
            TraceLineKind::TotalUnits,
            format!("Total pieces: {}", units),
        ));
        lines.push(TraceLine::new(
            TraceLineKind::UnitsPerContainer,
            format!("Pieces per container: {}", per_container),
        ));
        lines.push(TraceLine::new(
            TraceLineKind::ContainersPerPallet,
            format!("Containers per pallet: {}", per_pallet),
        ));

        let mut division = format!(
            "{} / {} = {} full {}",
            units,
            per_container,
            facts.full_containers,
            plural(facts.full_containers, "container", "containers")
        );
        if facts.remainder_units > 0 {
            division.push_str(&format!(
                " ({} {} left over, 1 extra container)",
                facts.remainder_units,
                plural(facts.remainder_units, "piece", "pieces")
            ));
        }
        lines.push(TraceLine::new(TraceLineKind::ContainerDivision, division));

        let mut pallet_division = format!(
            "{} / {} = {} full {}",
            facts.total_containers,
            per_pallet,
            facts.full_pallets,
            plural(facts.full_pallets, "pallet", "pallets")
        );
        if facts.remainder_containers > 0 {
            pallet_division.push_str(&format!(
                " ({} {} left over)",
                facts.remainder_containers,
                plural(facts.remainder_containers, "container", "containers")
            ));
        }
        lines.push(TraceLine::new(TraceLineKind::PalletDivision, pallet_division));

        lines.push(TraceLine::new(
            TraceLineKind::PalletedContainers,
            format!(
                "{} * {} = {} {} on full pallets",
                per_pallet,
                facts.full_pallets,
                paletted,
                plural(paletted, "container", "containers")
            ),
        ));
        lines.push(TraceLine::new(
            TraceLineKind::LeftoverContainers,
            format!(
                "{} - {} = {} leftover {}",
                facts.total_containers,
                paletted,
                facts.remainder_containers,
                plural(facts.remainder_containers, "container", "containers")
            ),
        ));

        let mut pallet_summary = format!("Total pallets: {} full", facts.full_pallets);
        if facts.remainder_containers > 0 {
            pallet_summary.push_str(&format!(
                " and 1 incomplete pallet with {} {}",
                facts.remainder_containers,
                plural(facts.remainder_containers, "container", "containers")
            ));
        }
        lines.push(TraceLine::new(TraceLineKind::PalletSummary, pallet_summary));

        lines.push(TraceLine::new(
            TraceLineKind::Summary,
            format!(
                "{} {} distributed across {} {}",
                units,
                plural(units, "piece", "pieces"),
                facts.total_containers,
                plural(facts.total_containers, "container", "containers")
            ),
        ));

        Self {
            lines,
            unit_pallet: input.is_unit_pallet(),
        }
    }

    /// All lines in derivation order, pallet lines included.
    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    /// Iterates the lines that survive the given presentation options.
    pub fn render(&self, options: TraceOptions) -> impl Iterator<Item = &TraceLine> + '_ {
        let hide_pallets = match options.pallet_lines {
            PalletLines::Always => false,
            PalletLines::Never => true,
            PalletLines::Auto => self.unit_pallet,
        };
        self.lines
            .iter()
            .filter(move |line| !(hide_pallets && line.kind.is_pallet_line()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::compute;

    fn kinds(trace: &DerivationTrace, options: TraceOptions) -> Vec<TraceLineKind> {
        trace.render(options).map(|line| line.kind).collect()
    }

    #[test]
    fn full_trace_follows_derivation_order() {
        let result = compute(1025, 50, 10).unwrap();
        let texts: Vec<&str> = result
            .derivation_trace
            .lines()
            .iter()
            .map(|line| line.text.as_str())
            .collect();

        assert_eq!(
            texts,
            vec![
                "Total pieces: 1025",
                "Pieces per container: 50",
                "Containers per pallet: 10",
                "1025 / 50 = 20 full containers (25 pieces left over, 1 extra container)",
                "21 / 10 = 2 full pallets (1 container left over)",
                "10 * 2 = 20 containers on full pallets",
                "21 - 20 = 1 leftover container",
                "Total pallets: 2 full and 1 incomplete pallet with 1 container",
                "1025 pieces distributed across 21 containers",
            ]
        );
    }

    #[test]
    fn exact_division_omits_remainder_notes() {
        let result = compute(500, 50, 10).unwrap();
        let lines = result.derivation_trace.lines();
        assert_eq!(lines[3].text, "500 / 50 = 10 full containers");
        assert_eq!(lines[4].text, "10 / 10 = 1 full pallet");
        assert_eq!(lines[7].text, "Total pallets: 1 full");
    }

    #[test]
    fn auto_hides_pallet_lines_in_unit_pallet_mode() {
        let result = compute(1025, 50, 1).unwrap();
        assert_eq!(
            kinds(&result.derivation_trace, TraceOptions::default()),
            vec![
                TraceLineKind::TotalUnits,
                TraceLineKind::UnitsPerContainer,
                TraceLineKind::ContainerDivision,
                TraceLineKind::Summary,
            ]
        );
    }

    #[test]
    fn auto_keeps_pallet_lines_when_grouping() {
        let result = compute(1025, 50, 10).unwrap();
        let rendered = kinds(&result.derivation_trace, TraceOptions::default());
        assert_eq!(rendered.len(), result.derivation_trace.lines().len());
    }

    #[test]
    fn explicit_policies_override_auto() {
        let unit = compute(1025, 50, 1).unwrap();
        let always = TraceOptions::with_pallet_lines(PalletLines::Always);
        assert_eq!(
            unit.derivation_trace.render(always).count(),
            unit.derivation_trace.lines().len()
        );

        let grouped = compute(1025, 50, 10).unwrap();
        let never = TraceOptions::with_pallet_lines(PalletLines::Never);
        assert!(
            grouped
                .derivation_trace
                .render(never)
                .all(|line| !line.kind.is_pallet_line())
        );
    }

    #[test]
    fn hidden_pallet_lines_leave_pallet_counts_intact() {
        let result = compute(1025, 50, 1).unwrap();
        let text = result.trace_text(TraceOptions::with_pallet_lines(PalletLines::Never));

        assert_eq!(
            text,
            "Total pieces: 1025\n\
             Pieces per container: 50\n\
             1025 / 50 = 20 full containers (25 pieces left over, 1 extra container)\n\
             1025 pieces distributed across 21 containers"
        );
        assert!(!text.contains("pallet"));
        assert_eq!(result.total_pallets, 21);
        assert_eq!(result.full_pallets, 21);
    }

    #[test]
    fn never_policy_hides_pallets_for_grouped_containers() {
        let result = compute(1025, 50, 10).unwrap();
        let text = result.trace_text(TraceOptions::with_pallet_lines(PalletLines::Never));

        assert_eq!(text.lines().count(), 4);
        assert!(!text.contains("pallet"));
        assert!(text.ends_with("1025 pieces distributed across 21 containers"));
        assert_eq!(result.total_pallets, 3);
        assert_eq!(
            result.trace_lines(TraceOptions::default()).len(),
            result.derivation_trace.lines().len()
        );
    }

    #[test]
    fn pallet_policy_parses_aliases() {
        assert_eq!("AUTO".parse::<PalletLines>(), Ok(PalletLines::Auto));
        assert_eq!(" show ".parse::<PalletLines>(), Ok(PalletLines::Always));
        assert_eq!("hide".parse::<PalletLines>(), Ok(PalletLines::Never));
        assert!("sometimes".parse::<PalletLines>().is_err());
    }
}
