//! Element models for the circuit core.
//!
//! Resistive elements (battery, resistor, current source) are the native
//! vocabulary of the equation builder and are closed under the [`Element`]
//! enum. Reactive elements (capacitor, inductor) enter a solve only through
//! their step-local companion models.

mod linear;
mod reactive;
mod sources;

pub use linear::Resistor;
pub use reactive::{Capacitor, CompanionState, Inductor};
pub use sources::{Battery, CurrentSource};

use crate::circuit::{ElementId, NodeId};
use crate::error::{GalvaniError, Result};

/// A two-terminal resistive element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Battery(Battery),
    Resistor(Resistor),
    CurrentSource(CurrentSource),
}

impl Element {
    /// The element's stable id.
    pub fn id(&self) -> ElementId {
        match self {
            Element::Battery(b) => b.id,
            Element::Resistor(r) => r.id,
            Element::CurrentSource(c) => c.id,
        }
    }

    /// First terminal.
    pub fn node0(&self) -> NodeId {
        match self {
            Element::Battery(b) => b.node0,
            Element::Resistor(r) => r.node0,
            Element::CurrentSource(c) => c.node0,
        }
    }

    /// Second terminal.
    pub fn node1(&self) -> NodeId {
        match self {
            Element::Battery(b) => b.node1,
            Element::Resistor(r) => r.node1,
            Element::CurrentSource(c) => c.node1,
        }
    }
}

/// Terminal validation shared by all element constructors.
fn check_terminals(kind: &'static str, node0: NodeId, node1: NodeId) -> Result<()> {
    if node0 == node1 {
        return Err(GalvaniError::invalid_element(
            kind,
            format!("terminals must be distinct, both are {node0}"),
        ));
    }
    Ok(())
}
