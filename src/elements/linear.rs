//! Resistor element.

use crate::circuit::{ElementId, NodeId};
use crate::error::{GalvaniError, Result};

use super::check_terminals;

/// A resistor with resistance >= 0.
///
/// A resistance of exactly zero is a distinguished case: it cannot be
/// expressed as a conductance, so the equation builder gives it an explicit
/// branch-current unknown and the constraint `V(node0) = V(node1)`, the same
/// treatment as a battery with zero EMF.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub id: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor. Fails fast on equal terminals, a negative
    /// resistance, or a non-finite resistance.
    pub fn new(id: ElementId, node0: NodeId, node1: NodeId, resistance: f64) -> Result<Self> {
        check_terminals("resistor", node0, node1)?;
        if !resistance.is_finite() || resistance < 0.0 {
            return Err(GalvaniError::invalid_element(
                "resistor",
                format!("resistance must be finite and >= 0, got {resistance}"),
            ));
        }
        Ok(Self {
            id,
            node0,
            node1,
            resistance,
        })
    }

    /// Whether this resistor needs an explicit branch-current unknown.
    pub fn is_zero_resistance(&self) -> bool {
        self.resistance == 0.0
    }

    /// Conductance (1/R). Only meaningful for nonzero resistance.
    pub fn conductance(&self) -> f64 {
        debug_assert!(!self.is_zero_resistance());
        1.0 / self.resistance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn conductance_is_reciprocal_resistance() {
        let r = Resistor::new(ElementId(0), NodeId(1), NodeId(0), 1000.0).unwrap();
        assert_relative_eq!(r.conductance(), 0.001);
        assert!(!r.is_zero_resistance());
    }

    #[test]
    fn zero_resistance_is_distinguished_not_invalid() {
        let r = Resistor::new(ElementId(0), NodeId(1), NodeId(0), 0.0).unwrap();
        assert!(r.is_zero_resistance());
    }

    #[test]
    fn negative_resistance_rejected() {
        assert!(Resistor::new(ElementId(0), NodeId(1), NodeId(0), -1.0).is_err());
    }
}
