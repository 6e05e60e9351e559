//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and stylus pointer events into a unified
//! `InputEvent` enum consumed by the stroke batcher. Each event names the
//! pointer it belongs to so concurrent contacts can be tracked separately.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Identifier of one physical contact (finger, pen, mouse).
///
/// Stable from pointer-down until release; the platform may hand the same
/// value to a later contact once the first one is gone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerId(pub i32);

impl fmt::Debug for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Physical samples the platform folded into a single move event.
///
/// Pens commonly report 2–4 samples per display frame, so the inline
/// capacity avoids a heap allocation for nearly every event.
pub type Coalesced = SmallVec<[Point; 8]>;

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { pointer: PointerId, position: Point },

    /// Pointer moved while pressed.
    PointerMove {
        pointer: PointerId,
        position: Point,
        /// Coalesced samples in delivery order. When non-empty these replace
        /// `position` as the samples of the event (the last one normally
        /// equals `position`).
        coalesced: Coalesced,
    },

    /// Pointer released.
    PointerUp { pointer: PointerId, position: Point },

    /// Pointer interrupted by the platform (palm rejection, lost capture).
    PointerCancel { pointer: PointerId, position: Point },
}

impl InputEvent {
    pub fn down(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::PointerDown {
            pointer,
            position: Point::new(x, y),
        }
    }

    pub fn moved(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::PointerMove {
            pointer,
            position: Point::new(x, y),
            coalesced: SmallVec::new(),
        }
    }

    /// A move carrying the platform's coalesced samples.
    pub fn moved_coalesced(
        pointer: PointerId,
        x: f64,
        y: f64,
        samples: impl IntoIterator<Item = Point>,
    ) -> Self {
        Self::PointerMove {
            pointer,
            position: Point::new(x, y),
            coalesced: samples.into_iter().collect(),
        }
    }

    pub fn up(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::PointerUp {
            pointer,
            position: Point::new(x, y),
        }
    }

    pub fn cancel(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::PointerCancel {
            pointer,
            position: Point::new(x, y),
        }
    }

    pub fn pointer(&self) -> PointerId {
        match self {
            Self::PointerDown { pointer, .. }
            | Self::PointerMove { pointer, .. }
            | Self::PointerUp { pointer, .. }
            | Self::PointerCancel { pointer, .. } => *pointer,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Self::PointerDown { position, .. }
            | Self::PointerMove { position, .. }
            | Self::PointerUp { position, .. }
            | Self::PointerCancel { position, .. } => *position,
        }
    }

    /// The samples a move contributes to its stroke, in order.
    ///
    /// Non-move events have no samples.
    pub fn samples(&self) -> &[Point] {
        match self {
            Self::PointerMove {
                position,
                coalesced,
                ..
            } => {
                if coalesced.is_empty() {
                    std::slice::from_ref(position)
                } else {
                    coalesced.as_slice()
                }
            }
            _ => &[],
        }
    }
}

/// Rebuild coalesced points from a flat `[x0, y0, x1, y1, ...]` buffer, the
/// shape hosts use to pass samples across FFI boundaries. A trailing odd
/// value is ignored.
pub fn points_from_flat(flat: &[f64]) -> Coalesced {
    flat.chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}
