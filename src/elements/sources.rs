//! Battery and current source elements.

use crate::circuit::{ElementId, NodeId};
use crate::error::{GalvaniError, Result};

use super::check_terminals;

/// An ideal battery (voltage source).
///
/// Requires an explicit branch-current unknown in the MNA system. The
/// constraint it enforces is `V(node0) - V(node1) = voltage`; inside the
/// source, current flows from the low terminal to the high one.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    pub id: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    pub voltage: f64,
}

impl Battery {
    /// Create a new battery. Fails fast on equal terminals or a non-finite
    /// voltage.
    pub fn new(id: ElementId, node0: NodeId, node1: NodeId, voltage: f64) -> Result<Self> {
        check_terminals("battery", node0, node1)?;
        if !voltage.is_finite() {
            return Err(GalvaniError::invalid_element(
                "battery",
                format!("voltage must be finite, got {voltage}"),
            ));
        }
        Ok(Self {
            id,
            node0,
            node1,
            voltage,
        })
    }
}

/// An ideal current source.
///
/// Contributes only to the right-hand side of the node KCL equations:
/// the source drives `current` amps out of `node0` and into `node1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSource {
    pub id: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    pub current: f64,
}

impl CurrentSource {
    /// Create a new current source. Fails fast on equal terminals or a
    /// non-finite current.
    pub fn new(id: ElementId, node0: NodeId, node1: NodeId, current: f64) -> Result<Self> {
        check_terminals("current source", node0, node1)?;
        if !current.is_finite() {
            return Err(GalvaniError::invalid_element(
                "current source",
                format!("current must be finite, got {current}"),
            ));
        }
        Ok(Self {
            id,
            node0,
            node1,
            current,
        })
    }
}
