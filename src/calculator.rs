//! Label and pallet calculation.
//!
//! Converts a raw piece count into the number of container labels to print,
//! the pieces left over and the pallets the containers occupy. The calculation
//! is integer-only, has no side effects and depends on nothing but its inputs.

use crate::model::{CalcError, PackingInput, PackingResult, ValidatedInput};
use crate::trace::{DerivationTrace, TraceFacts};

/// Computes labels and pallets for a batch.
///
/// A partially filled container still receives a label, and pallets are
/// counted from the total number of containers including that extra one.
///
/// # Parameters
/// * `total_units` - Pieces produced (`>= 0`)
/// * `units_per_container` - Container capacity in pieces (`>= 1`)
/// * `containers_per_pallet` - Pallet capacity in containers (`>= 1`)
///
/// # Returns
/// `Ok(PackingResult)` for valid inputs, `Err(CalcError::InvalidArgument)` otherwise
///
/// # Examples
/// ```
/// use label_packer::calculator::compute;
///
/// let result = compute(1025, 50, 10).unwrap();
/// assert_eq!(result.total_containers, 21);
/// assert_eq!(result.remainder_units, 25);
/// assert_eq!(result.total_pallets, 3);
///
/// assert!(compute(10, 0, 5).is_err());
/// ```
pub fn compute(
    total_units: i64,
    units_per_container: i64,
    containers_per_pallet: i64,
) -> Result<PackingResult, CalcError> {
    compute_input(&PackingInput::new(
        total_units,
        units_per_container,
        containers_per_pallet,
    ))
}

/// Same as `compute`, taking the input as a value.
pub fn compute_input(input: &PackingInput) -> Result<PackingResult, CalcError> {
    let validated = input.validate()?;
    Ok(compute_validated(validated))
}

/// Infallible calculation for an already validated input.
pub fn compute_validated(input: ValidatedInput) -> PackingResult {
    let per_container = input.units_per_container();
    let per_pallet = input.containers_per_pallet();

    let full_containers = input.total_units() / per_container;
    let remainder_units = input.total_units() % per_container;
    let extra_container_needed = remainder_units > 0;
    let total_containers = full_containers + u64::from(extra_container_needed);

    let full_pallets = total_containers / per_pallet;
    let remainder_containers = total_containers % per_pallet;
    let total_pallets = full_pallets + u64::from(remainder_containers > 0);

    let derivation_trace = DerivationTrace::build(
        &input,
        TraceFacts {
            full_containers,
            remainder_units,
            total_containers,
            full_pallets,
            remainder_containers,
        },
    );

    PackingResult {
        input,
        full_containers,
        remainder_units,
        extra_container_needed,
        total_containers,
        full_pallets,
        remainder_containers,
        total_pallets,
        derivation_trace,
    }
}

impl PackingInput {
    /// Runs the calculation for this input.
    pub fn compute(&self) -> Result<PackingResult, CalcError> {
        compute_input(self)
    }
}
