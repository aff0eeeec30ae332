// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seat devices and input routing.
//!
//! Every raw device event resolves to a window through the surface it was
//! delivered on (events with no resolvable window are dropped), then to a
//! widget through the seat's per-device-class focus, falling back to the
//! surface's own widget. The handler's return value becomes the new focus
//! for that class.
//!
//! Pointer, keyboard, and touch carry surface addressing on their enter
//! events and are latched between them. The space navigator and joystick
//! have no surface addressing at all and broadcast to every window's root
//! widget instead, in window list order, stopping at the first claim.

use kurbo::Point;
use wayland_client::protocol::{
    wl_keyboard::{self, WlKeyboard},
    wl_pointer::{self, WlPointer},
    wl_seat::{self, WlSeat},
    wl_touch::{self, WlTouch},
};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};

use orogen_core::event::{
    ButtonState, DeviceClass, KeyboardEvent, PointerEvent, TouchEvent, WidgetEvent,
};
use orogen_core::focus::FocusMap;

use crate::display::{DisplayContext, DisplayShared};
use crate::widget::{ROOT_WIDGET, SurfaceTag, WidgetId};
use crate::window::WindowId;

/// A focused widget, qualified by its window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct FocusRef {
    pub(crate) window: WindowId,
    pub(crate) widget: WidgetId,
}

/// One advertised seat and its live device handles.
#[derive(Debug)]
pub(crate) struct Seat {
    pub(crate) seat: WlSeat,
    pub(crate) registry_name: u32,
    pointer: Option<WlPointer>,
    keyboard: Option<WlKeyboard>,
    touch: Option<WlTouch>,
    focus: FocusMap<FocusRef>,
    pointer_at: Point,
    pointer_surface: Option<SurfaceTag>,
    keyboard_surface: Option<SurfaceTag>,
    touch_surface: Option<SurfaceTag>,
}

impl Seat {
    pub(crate) fn new(seat: WlSeat, registry_name: u32) -> Self {
        Self {
            seat,
            registry_name,
            pointer: None,
            keyboard: None,
            touch: None,
            focus: FocusMap::default(),
            pointer_at: Point::ZERO,
            pointer_surface: None,
            keyboard_surface: None,
            touch_surface: None,
        }
    }

    pub(crate) fn release_devices(&mut self) {
        // The release requests arrived in wl_seat version 3; older devices
        // can only be leaked.
        if let Some(pointer) = self.pointer.take()
            && pointer.version() >= 3
        {
            pointer.release();
        }
        if let Some(keyboard) = self.keyboard.take()
            && keyboard.version() >= 3
        {
            keyboard.release();
        }
        if let Some(touch) = self.touch.take()
            && touch.version() >= 3
        {
            touch.release();
        }
    }

    fn sync_capabilities(
        &mut self,
        capabilities: wl_seat::Capability,
        qh: &QueueHandle<DisplayContext>,
    ) {
        let wants_pointer = capabilities.contains(wl_seat::Capability::Pointer);
        if wants_pointer && self.pointer.is_none() {
            self.pointer = Some(self.seat.get_pointer(qh, ()));
        } else if !wants_pointer && let Some(pointer) = self.pointer.take() {
            if pointer.version() >= 3 {
                pointer.release();
            }
            self.focus.clear(DeviceClass::Pointer);
            self.pointer_surface = None;
        }

        let wants_keyboard = capabilities.contains(wl_seat::Capability::Keyboard);
        if wants_keyboard && self.keyboard.is_none() {
            self.keyboard = Some(self.seat.get_keyboard(qh, ()));
        } else if !wants_keyboard && let Some(keyboard) = self.keyboard.take() {
            if keyboard.version() >= 3 {
                keyboard.release();
            }
            self.focus.clear(DeviceClass::Keyboard);
            self.keyboard_surface = None;
        }

        let wants_touch = capabilities.contains(wl_seat::Capability::Touch);
        if wants_touch && self.touch.is_none() {
            self.touch = Some(self.seat.get_touch(qh, ()));
        } else if !wants_touch && let Some(touch) = self.touch.take() {
            if touch.version() >= 3 {
                touch.release();
            }
            self.focus.clear(DeviceClass::Touch);
            self.touch_surface = None;
        }
    }

    /// Routes one event: window from `tag`, widget from focus with the
    /// tagged widget as fallback, focus updated from the handler's answer.
    ///
    /// Dropped silently when the window is gone or the target widget has no
    /// handler, with no focus mutation in the window-gone case.
    fn route(
        &mut self,
        shared: &DisplayShared,
        class: DeviceClass,
        tag: SurfaceTag,
        event: WidgetEvent,
    ) {
        let Some(window) = shared.window(tag.window) else {
            return;
        };
        route_resolved(
            &mut self.focus,
            class,
            tag,
            |widget| window.has_widget(widget),
            |target| window.deliver(target, &event),
        );
    }

    fn on_pointer(
        &mut self,
        shared: &DisplayShared,
        pointer: &WlPointer,
        event: wl_pointer::Event,
    ) {
        match event {
            wl_pointer::Event::Enter {
                serial,
                surface,
                surface_x,
                surface_y,
            } => {
                let Some(tag) = surface.data::<SurfaceTag>().copied() else {
                    return;
                };
                // The application paints its own cursor if it wants one.
                pointer.set_cursor(serial, None, 0, 0);
                self.pointer_at = Point::new(surface_x, surface_y);
                self.pointer_surface = Some(tag);
                self.route(
                    shared,
                    DeviceClass::Pointer,
                    tag,
                    PointerEvent::Enter {
                        position: self.pointer_at,
                    }
                    .into(),
                );
            }
            wl_pointer::Event::Leave { surface, .. } => {
                let Some(tag) = surface.data::<SurfaceTag>().copied() else {
                    return;
                };
                // Clearing first keeps a handler that re-claims focus from
                // racing against the stale reference.
                self.focus.clear(DeviceClass::Pointer);
                self.pointer_surface = None;
                self.route(shared, DeviceClass::Pointer, tag, PointerEvent::Leave.into());
            }
            wl_pointer::Event::Motion {
                surface_x,
                surface_y,
                ..
            } => {
                self.pointer_at = Point::new(surface_x, surface_y);
                let Some(tag) = self.pointer_surface else {
                    return;
                };
                self.route(
                    shared,
                    DeviceClass::Pointer,
                    tag,
                    PointerEvent::Motion {
                        position: self.pointer_at,
                    }
                    .into(),
                );
            }
            wl_pointer::Event::Button { button, state, .. } => {
                let Some(tag) = self.pointer_surface else {
                    return;
                };
                let Some(state) = button_state(state) else {
                    return;
                };
                self.route(
                    shared,
                    DeviceClass::Pointer,
                    tag,
                    PointerEvent::Button {
                        position: self.pointer_at,
                        button,
                        state,
                    }
                    .into(),
                );
            }
            wl_pointer::Event::Axis { axis, value, .. } => {
                let Some(tag) = self.pointer_surface else {
                    return;
                };
                let (horizontal, vertical) = match axis {
                    WEnum::Value(wl_pointer::Axis::HorizontalScroll) => (value, 0.0),
                    WEnum::Value(wl_pointer::Axis::VerticalScroll) => (0.0, value),
                    _ => return,
                };
                self.route(
                    shared,
                    DeviceClass::Pointer,
                    tag,
                    PointerEvent::Axis {
                        horizontal,
                        vertical,
                    }
                    .into(),
                );
            }
            _ => {}
        }
    }

    fn on_keyboard(&mut self, shared: &DisplayShared, event: wl_keyboard::Event) {
        match event {
            wl_keyboard::Event::Enter { surface, .. } => {
                let Some(tag) = surface.data::<SurfaceTag>().copied() else {
                    return;
                };
                // Keyboard focus always lands on the root widget; nested
                // widgets never hold it.
                let root = SurfaceTag {
                    window: tag.window,
                    widget: ROOT_WIDGET,
                };
                self.focus.set(
                    DeviceClass::Keyboard,
                    FocusRef {
                        window: tag.window,
                        widget: ROOT_WIDGET,
                    },
                );
                self.keyboard_surface = Some(root);
                self.route(
                    shared,
                    DeviceClass::Keyboard,
                    root,
                    KeyboardEvent::Enter.into(),
                );
            }
            wl_keyboard::Event::Leave { surface, .. } => {
                let Some(tag) = surface.data::<SurfaceTag>().copied() else {
                    return;
                };
                self.focus.clear(DeviceClass::Keyboard);
                self.keyboard_surface = None;
                self.route(
                    shared,
                    DeviceClass::Keyboard,
                    SurfaceTag {
                        window: tag.window,
                        widget: ROOT_WIDGET,
                    },
                    KeyboardEvent::Leave.into(),
                );
            }
            wl_keyboard::Event::Key { key, state, .. } => {
                let Some(tag) = self.keyboard_surface else {
                    return;
                };
                let Some(state) = key_state(state) else {
                    return;
                };
                self.route(
                    shared,
                    DeviceClass::Keyboard,
                    tag,
                    KeyboardEvent::Key { key, state }.into(),
                );
            }
            wl_keyboard::Event::Modifiers {
                mods_depressed,
                mods_latched,
                mods_locked,
                group,
                ..
            } => {
                let Some(tag) = self.keyboard_surface else {
                    return;
                };
                self.route(
                    shared,
                    DeviceClass::Keyboard,
                    tag,
                    KeyboardEvent::Modifiers {
                        depressed: mods_depressed,
                        latched: mods_latched,
                        locked: mods_locked,
                        group,
                    }
                    .into(),
                );
            }
            // Dropping the keymap event closes its descriptor.
            _ => {}
        }
    }

    fn on_touch(&mut self, shared: &DisplayShared, event: wl_touch::Event) {
        match event {
            wl_touch::Event::Down {
                surface, id, x, y, ..
            } => {
                let Some(tag) = surface.data::<SurfaceTag>().copied() else {
                    return;
                };
                self.touch_surface = Some(tag);
                self.route(
                    shared,
                    DeviceClass::Touch,
                    tag,
                    TouchEvent::Down {
                        id,
                        position: Point::new(x, y),
                    }
                    .into(),
                );
            }
            wl_touch::Event::Up { id, .. } => {
                let Some(tag) = self.touch_surface else {
                    return;
                };
                self.route(shared, DeviceClass::Touch, tag, TouchEvent::Up { id }.into());
            }
            wl_touch::Event::Motion { id, x, y, .. } => {
                let Some(tag) = self.touch_surface else {
                    return;
                };
                self.route(
                    shared,
                    DeviceClass::Touch,
                    tag,
                    TouchEvent::Motion {
                        id,
                        position: Point::new(x, y),
                    }
                    .into(),
                );
            }
            wl_touch::Event::Cancel => {
                let Some(tag) = self.touch_surface.take() else {
                    return;
                };
                self.focus.clear(DeviceClass::Touch);
                self.route(shared, DeviceClass::Touch, tag, TouchEvent::Cancel.into());
            }
            _ => {}
        }
    }
}

/// Resolves the delivery target for an event on `tag` and applies the
/// handler's focus answer.
///
/// The focused widget wins when it belongs to the same window and still
/// exists; a slot naming a destroyed widget is cleared and delivery falls
/// back to the tagged widget. `deliver` returns `None` when the target has
/// no handler, which leaves focus as it stands.
fn route_resolved(
    focus: &mut FocusMap<FocusRef>,
    class: DeviceClass,
    tag: SurfaceTag,
    widget_exists: impl FnOnce(WidgetId) -> bool,
    deliver: impl FnOnce(WidgetId) -> Option<Option<WidgetId>>,
) {
    let target = match focus.get(class).copied() {
        Some(held) if held.window == tag.window => {
            if widget_exists(held.widget) {
                held.widget
            } else {
                focus.clear(class);
                tag.widget
            }
        }
        _ => tag.widget,
    };
    let Some(answer) = deliver(target) else {
        return;
    };
    match answer {
        Some(widget) => {
            focus.set(
                class,
                FocusRef {
                    window: tag.window,
                    widget,
                },
            );
        }
        None => {
            focus.clear(class);
        }
    }
}

fn button_state(state: WEnum<wl_pointer::ButtonState>) -> Option<ButtonState> {
    match state {
        WEnum::Value(wl_pointer::ButtonState::Pressed) => Some(ButtonState::Pressed),
        WEnum::Value(wl_pointer::ButtonState::Released) => Some(ButtonState::Released),
        _ => None,
    }
}

fn key_state(state: WEnum<wl_keyboard::KeyState>) -> Option<ButtonState> {
    match state {
        WEnum::Value(wl_keyboard::KeyState::Pressed) => Some(ButtonState::Pressed),
        WEnum::Value(wl_keyboard::KeyState::Released) => Some(ButtonState::Released),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(window: u64, widget: u64) -> SurfaceTag {
        SurfaceTag {
            window: WindowId(window),
            widget: WidgetId(widget),
        }
    }

    fn focused(window: u64, widget: u64) -> FocusRef {
        FocusRef {
            window: WindowId(window),
            widget: WidgetId(widget),
        }
    }

    #[test]
    fn focused_widget_receives_events_tagged_for_its_window() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Pointer, focused(1, 5));
        let mut delivered = None;
        route_resolved(
            &mut focus,
            DeviceClass::Pointer,
            tag(1, 0),
            |_| true,
            |target| {
                delivered = Some(target);
                Some(Some(target))
            },
        );
        assert_eq!(delivered, Some(WidgetId(5)));
        assert_eq!(focus.get(DeviceClass::Pointer), Some(&focused(1, 5)));
    }

    #[test]
    fn destroyed_focus_holder_falls_back_to_the_tagged_widget() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Pointer, focused(1, 5));
        let mut delivered = None;
        route_resolved(
            &mut focus,
            DeviceClass::Pointer,
            tag(1, 0),
            |widget| widget != WidgetId(5),
            |target| {
                delivered = Some(target);
                None
            },
        );
        assert_eq!(delivered, Some(ROOT_WIDGET), "dead holder must not be targeted");
        assert_eq!(focus.get(DeviceClass::Pointer), None, "stale slot must be cleared");
    }

    #[test]
    fn focus_held_in_another_window_is_not_consulted() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Pointer, focused(2, 9));
        let mut delivered = None;
        route_resolved(
            &mut focus,
            DeviceClass::Pointer,
            tag(1, 3),
            |_| true,
            |target| {
                delivered = Some(target);
                None
            },
        );
        assert_eq!(delivered, Some(WidgetId(3)));
    }

    #[test]
    fn events_without_a_handler_leave_focus_untouched() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Keyboard, focused(1, 4));
        route_resolved(&mut focus, DeviceClass::Keyboard, tag(1, 0), |_| true, |_| None);
        assert_eq!(focus.get(DeviceClass::Keyboard), Some(&focused(1, 4)));
    }

    #[test]
    fn handler_answers_move_and_clear_focus() {
        let mut focus = FocusMap::default();
        route_resolved(
            &mut focus,
            DeviceClass::Touch,
            tag(1, 0),
            |_| true,
            |_| Some(Some(WidgetId(7))),
        );
        assert_eq!(focus.get(DeviceClass::Touch), Some(&focused(1, 7)));

        route_resolved(&mut focus, DeviceClass::Touch, tag(1, 0), |_| true, |_| Some(None));
        assert_eq!(focus.get(DeviceClass::Touch), None);
    }

    #[test]
    fn focus_recovers_after_leave_then_enter() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Pointer, focused(1, 5));
        // Leave clears the slot before the event is dispatched.
        focus.clear(DeviceClass::Pointer);
        // The next enter routes to the tagged widget, whose handler claims
        // focus again.
        route_resolved(
            &mut focus,
            DeviceClass::Pointer,
            tag(1, 5),
            |_| true,
            |target| Some(Some(target)),
        );
        assert_eq!(focus.get(DeviceClass::Pointer), Some(&focused(1, 5)));
    }
}

impl Dispatch<WlSeat, u32> for DisplayContext {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _: &u32,
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(capabilities),
        } = event
            && let Some(entry) = state.seats.iter_mut().find(|entry| entry.seat == *seat)
        {
            entry.sync_capabilities(capabilities, qh);
        }
    }
}

impl Dispatch<WlPointer, ()> for DisplayContext {
    fn event(
        state: &mut Self,
        pointer: &WlPointer,
        event: wl_pointer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let shared = state.shared.clone();
        if let Some(seat) = state
            .seats
            .iter_mut()
            .find(|seat| seat.pointer.as_ref() == Some(pointer))
        {
            seat.on_pointer(&shared, pointer, event);
        }
    }
}

impl Dispatch<WlKeyboard, ()> for DisplayContext {
    fn event(
        state: &mut Self,
        keyboard: &WlKeyboard,
        event: wl_keyboard::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let shared = state.shared.clone();
        if let Some(seat) = state
            .seats
            .iter_mut()
            .find(|seat| seat.keyboard.as_ref() == Some(keyboard))
        {
            seat.on_keyboard(&shared, event);
        }
    }
}

impl Dispatch<WlTouch, ()> for DisplayContext {
    fn event(
        state: &mut Self,
        touch: &WlTouch,
        event: wl_touch::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let shared = state.shared.clone();
        if let Some(seat) = state
            .seats
            .iter_mut()
            .find(|seat| seat.touch.as_ref() == Some(touch))
        {
            seat.on_touch(&shared, event);
        }
    }
}
