//! Data models for the label packing calculation.
//!
//! This module defines the value types shared by the calculator, the trace
//! builder and the service layer:
//! - `PackingInput`: the raw piece count and the two capacities
//! - `ValidatedInput`: the same triple after the divisor checks
//! - `PackingResult`: labels, pallets and remainders derived from an input
//! - `CalcError`: the single failure mode of the calculation

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::trace::{DerivationTrace, TraceOptions};

/// Error raised when a calculation input is out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("Invalid argument: {name} must be {expected}, got: {value}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        value: i64,
    },
}

impl CalcError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            CalcError::InvalidArgument { name, .. } => *name,
        }
    }
}

fn validate_count(value: i64, name: &'static str) -> Result<u64, CalcError> {
    u64::try_from(value).map_err(|_| CalcError::InvalidArgument {
        name,
        expected: "zero or greater",
        value,
    })
}

fn validate_capacity(value: i64, name: &'static str) -> Result<u64, CalcError> {
    if value < 1 {
        return Err(CalcError::InvalidArgument {
            name,
            expected: "at least 1",
            value,
        });
    }
    Ok(value as u64)
}

/// Raw calculation input, typically taken straight from a form.
///
/// # Fields
/// * `total_units` - Pieces produced in the batch
/// * `units_per_container` - Pieces that fit into one container
/// * `containers_per_pallet` - Containers that fit onto one pallet (`1` disables grouping)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackingInput {
    #[schema(example = 1025)]
    pub total_units: i64,
    #[schema(example = 50)]
    pub units_per_container: i64,
    #[schema(example = 10)]
    pub containers_per_pallet: i64,
}

impl PackingInput {
    pub const fn new(total_units: i64, units_per_container: i64, containers_per_pallet: i64) -> Self {
        Self {
            total_units,
            units_per_container,
            containers_per_pallet,
        }
    }

    /// Checks both divisors and the piece count before any arithmetic happens.
    ///
    /// # Examples
    /// ```
    /// use label_packer::model::PackingInput;
    ///
    /// assert!(PackingInput::new(1025, 50, 10).validate().is_ok());
    /// assert!(PackingInput::new(10, 0, 5).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<ValidatedInput, CalcError> {
        let units_per_container = validate_capacity(self.units_per_container, "units_per_container")?;
        let containers_per_pallet =
            validate_capacity(self.containers_per_pallet, "containers_per_pallet")?;
        let total_units = validate_count(self.total_units, "total_units")?;

        Ok(ValidatedInput {
            total_units,
            units_per_container,
            containers_per_pallet,
        })
    }
}

/// Input triple whose divisors are known to be at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValidatedInput {
    total_units: u64,
    units_per_container: u64,
    containers_per_pallet: u64,
}

impl ValidatedInput {
    #[inline]
    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    #[inline]
    pub fn units_per_container(&self) -> u64 {
        self.units_per_container
    }

    #[inline]
    pub fn containers_per_pallet(&self) -> u64 {
        self.containers_per_pallet
    }

    /// Every container is its own pallet.
    #[inline]
    pub fn is_unit_pallet(&self) -> bool {
        self.containers_per_pallet == 1
    }
}

/// Labels, pallets and remainders derived from one input.
///
/// Values are immutable once computed; a changed input produces a new result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackingResult {
    pub input: ValidatedInput,
    pub full_containers: u64,
    pub remainder_units: u64,
    pub extra_container_needed: bool,
    /// Number of labels to print.
    pub total_containers: u64,
    pub full_pallets: u64,
    pub remainder_containers: u64,
    pub total_pallets: u64,
    pub derivation_trace: DerivationTrace,
}

impl PackingResult {
    /// Labels to print, one per container.
    #[inline]
    pub fn labels_needed(&self) -> u64 {
        self.total_containers
    }

    /// Pieces that end up in the partially filled container.
    #[inline]
    pub fn extra_pieces(&self) -> u64 {
        self.remainder_units
    }

    /// True when nothing was produced and there is nothing to display.
    pub fn is_empty(&self) -> bool {
        self.input.total_units() == 0
    }

    /// Renders the derivation trace with the given presentation options.
    pub fn trace_lines(&self, options: TraceOptions) -> Vec<&str> {
        self.derivation_trace
            .render(options)
            .map(|line| line.text.as_str())
            .collect()
    }

    /// Rendered trace joined into display text.
    pub fn trace_text(&self, options: TraceOptions) -> String {
        self.trace_lines(options).join("\n")
    }

    /// Short headline for the result panel, e.g. `21 (20 full + 1 extra with 25 pieces)`.
    pub fn label_summary(&self) -> String {
        if self.extra_container_needed {
            format!(
                "{} ({} full + 1 extra with {} pieces)",
                self.total_containers, self.full_containers, self.remainder_units
            )
        } else {
            self.total_containers.to_string()
        }
    }
}
