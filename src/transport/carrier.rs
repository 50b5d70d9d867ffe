//! Visual charge carriers and per-element transport state.

use crate::circuit::{ElementId, NodeId};

/// A discrete visual carrier on an element. Purely cosmetic: carriers depict
/// the solved current, they never influence it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Carrier {
    /// Element the carrier currently rides on.
    pub element: ElementId,
    /// Position along the element, in `[0, path_length]`; 0 is at `node0`.
    pub distance: f64,
    /// +1 for conventional-current carriers, -1 for electrons.
    pub charge_sign: f64,
}

/// Per-element state the transport engine keeps: geometry, the latest solved
/// current, and the pending-relayout flag set by topology edits.
#[derive(Debug, Clone, Copy)]
pub struct TransportElement {
    pub id: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    /// Length of the carrier path; the straight-line terminal distance for
    /// simple elements, longer for curved filaments.
    pub path_length: f64,
    /// Latest signed current, measured from `node0` to `node1`.
    pub current: f64,
    /// Set after a topology edit until the element is re-laid-out; carriers
    /// on a dirty element do not move.
    pub layout_dirty: bool,
}
