//! Action decoding - controller outputs to movement commands
//!
//! Level 3 - Step-level implementation

use gridrun_core::Direction;

use crate::config::VariantConfig;
use crate::error::EvalError;

/// Index of the strict maximum; the lowest index wins ties.
///
/// NaN never compares greater, so an all-NaN (or all negative infinity)
/// vector selects nothing.
pub fn argmax(outputs: &[f64]) -> Option<usize> {
    let mut best = None;
    let mut max = f64::NEG_INFINITY;
    for (i, &v) in outputs.iter().enumerate() {
        if v > max {
            max = v;
            best = Some(i);
        }
    }
    best
}

/// Maps the arg-max output index through a configurable direction table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionDecoder {
    table: [Direction; 4],
}

impl ActionDecoder {
    pub fn new(table: [Direction; 4]) -> Self {
        Self { table }
    }

    pub fn from_variant(variant: &VariantConfig) -> Self {
        Self::new(variant.action_table)
    }

    pub fn table(&self) -> &[Direction; 4] {
        &self.table
    }

    /// Pick the command for one controller output vector.
    ///
    /// Outputs beyond the table length are ignored.
    pub fn decode(&self, outputs: &[f64]) -> Result<Direction, EvalError> {
        if outputs.len() < self.table.len() {
            return Err(EvalError::OutputShape {
                expected: self.table.len(),
                got: outputs.len(),
            });
        }
        argmax(&outputs[..self.table.len()])
            .map(|i| self.table[i])
            .ok_or(EvalError::NoActionSelected {
                outputs: outputs.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lurd() -> ActionDecoder {
        ActionDecoder::from_variant(&VariantConfig::hazard_aware())
    }

    #[test]
    fn test_argmax_basic() {
        assert_eq!(argmax(&[0.1, 0.7, 0.3, -2.0]), Some(1));
        assert_eq!(argmax(&[-5.0, -4.0, -3.0, -2.0]), Some(3));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.9, 0.5, 0.9]), Some(1));
        assert_eq!(argmax(&[1.0, 1.0, 1.0, 1.0]), Some(0));
        assert_eq!(lurd().decode(&[0.0, 0.5, 0.5, 0.0]).unwrap(), Direction::Up);
    }

    #[test]
    fn test_nan_is_never_selected() {
        assert_eq!(argmax(&[f64::NAN, 0.1, f64::NAN, 0.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN; 4]), None);
    }

    #[test]
    fn test_variant_tables_differ() {
        let outputs = [0.0, 1.0, 0.0, 0.0];
        assert_eq!(lurd().decode(&outputs).unwrap(), Direction::Up);
        let lrud = ActionDecoder::from_variant(&VariantConfig::wide_window());
        assert_eq!(lrud.decode(&outputs).unwrap(), Direction::Right);
    }

    #[test]
    fn test_no_action_selected_is_an_error() {
        let err = lurd().decode(&[f64::NEG_INFINITY; 4]).unwrap_err();
        assert!(matches!(err, EvalError::NoActionSelected { outputs: 4 }));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_short_output_is_an_error() {
        let err = lurd().decode(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EvalError::OutputShape { expected, got } if expected == 4 && got == 2
        ));
    }

    #[test]
    fn test_extra_outputs_ignored() {
        assert_eq!(lurd().decode(&[0.0, 0.0, 0.0, 0.1, 9.0]).unwrap(), Direction::Down);
    }
}
