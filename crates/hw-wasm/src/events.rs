//! DOM `PointerEvent` → `InputEvent` decoding.
//!
//! Coordinates are read through `Reflect` rather than the typed getters:
//! `MouseEvent.clientX` is fractional in current browsers, and the typed
//! binding truncates it to an integer.

use hw_core::input::Coalesced;
use hw_core::{InputEvent, Point, PointerId};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::PointerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerPhase {
    /// Map a DOM event `type` to a phase; unrelated events give `None`.
    pub fn from_event_type(kind: &str) -> Option<Self> {
        match kind {
            "pointerdown" => Some(Self::Down),
            "pointermove" => Some(Self::Move),
            "pointerup" => Some(Self::Up),
            "pointercancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

pub fn decode_pointer_event(event: &PointerEvent) -> Option<InputEvent> {
    let phase = PointerPhase::from_event_type(&event.type_())?;
    let pointer = PointerId(event.pointer_id());
    let position = client_point(event.as_ref())?;
    Some(match phase {
        PointerPhase::Down => InputEvent::PointerDown { pointer, position },
        PointerPhase::Move => InputEvent::PointerMove {
            pointer,
            position,
            coalesced: coalesced_points(event),
        },
        PointerPhase::Up => InputEvent::PointerUp { pointer, position },
        PointerPhase::Cancel => InputEvent::PointerCancel { pointer, position },
    })
}

fn client_point(event: &JsValue) -> Option<Point> {
    let x = Reflect::get(event, &JsValue::from_str("clientX")).ok()?.as_f64()?;
    let y = Reflect::get(event, &JsValue::from_str("clientY")).ok()?.as_f64()?;
    Some(Point::new(x, y))
}

/// Samples from `getCoalescedEvents()`, or empty where the browser does not
/// implement it.
fn coalesced_points(event: &PointerEvent) -> Coalesced {
    let getter = Reflect::get(event.as_ref(), &JsValue::from_str("getCoalescedEvents"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());
    let Some(getter) = getter else {
        return Coalesced::new();
    };
    match getter.call0(event.as_ref()) {
        Ok(list) => Array::from(&list)
            .iter()
            .filter_map(|sample| client_point(&sample))
            .collect(),
        Err(_) => Coalesced::new(),
    }
}
