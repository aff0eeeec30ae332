// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input event types delivered to widgets.
//!
//! The backend translates raw device traffic into these types and routes
//! each event to the widget holding focus for the event's [`DeviceClass`].
//! Surface-local coordinates use [`kurbo::Point`] in buffer pixels.

use kurbo::Point;

/// The class of input device an event originated from.
///
/// Focus is tracked independently per class: a window can route pointer
/// events to one widget while keyboard events go to another.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DeviceClass {
    /// Relative or absolute pointing device with buttons.
    Pointer,
    /// Key-based text and control input.
    Keyboard,
    /// Direct touch contact points.
    Touch,
    /// Six-degree-of-freedom space navigator.
    Spacenav,
    /// Axis-and-button game controller.
    Joystick,
}

/// State of a button or key in an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ButtonState {
    Released,
    Pressed,
}

/// A pointer event in surface-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// The pointer entered the widget at the given position.
    Enter { position: Point },
    /// The pointer left the widget.
    Leave,
    /// The pointer moved while over the widget.
    Motion { position: Point },
    /// A button changed state. `button` is the platform button code.
    Button {
        position: Point,
        button: u32,
        state: ButtonState,
    },
    /// Scroll motion along one axis, in pixels.
    Axis { horizontal: f64, vertical: f64 },
}

/// A keyboard event.
///
/// `key` is the platform scancode; symbolic interpretation is left to the
/// consumer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyboardEvent {
    /// The widget gained keyboard focus.
    Enter,
    /// The widget lost keyboard focus.
    Leave,
    /// A key changed state.
    Key { key: u32, state: ButtonState },
    /// Modifier state changed.
    Modifiers {
        depressed: u32,
        latched: u32,
        locked: u32,
        group: u32,
    },
}

/// A touch event. `id` distinguishes concurrent contact points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TouchEvent {
    Down { id: i32, position: Point },
    Up { id: i32 },
    Motion { id: i32, position: Point },
    /// The compositor cancelled the touch sequence.
    Cancel,
}

/// A six-degree-of-freedom motion or button report from a space navigator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpacenavEvent {
    /// Translation and rotation deltas, in device units.
    Motion {
        translation: [i32; 3],
        rotation: [i32; 3],
    },
    Button { button: u32, state: ButtonState },
}

/// A joystick axis or button report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoystickEvent {
    /// Axis `number` moved to `value` (full-scale i16 range).
    Axis { number: u8, value: i16 },
    Button { number: u8, state: ButtonState },
}

/// Any input event deliverable to a widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WidgetEvent {
    Pointer(PointerEvent),
    Keyboard(KeyboardEvent),
    Touch(TouchEvent),
    Spacenav(SpacenavEvent),
    Joystick(JoystickEvent),
}

impl WidgetEvent {
    /// The device class this event belongs to.
    #[must_use]
    pub const fn device_class(&self) -> DeviceClass {
        match self {
            Self::Pointer(_) => DeviceClass::Pointer,
            Self::Keyboard(_) => DeviceClass::Keyboard,
            Self::Touch(_) => DeviceClass::Touch,
            Self::Spacenav(_) => DeviceClass::Spacenav,
            Self::Joystick(_) => DeviceClass::Joystick,
        }
    }
}

impl From<PointerEvent> for WidgetEvent {
    fn from(event: PointerEvent) -> Self {
        Self::Pointer(event)
    }
}

impl From<KeyboardEvent> for WidgetEvent {
    fn from(event: KeyboardEvent) -> Self {
        Self::Keyboard(event)
    }
}

impl From<TouchEvent> for WidgetEvent {
    fn from(event: TouchEvent) -> Self {
        Self::Touch(event)
    }
}

impl From<SpacenavEvent> for WidgetEvent {
    fn from(event: SpacenavEvent) -> Self {
        Self::Spacenav(event)
    }
}

impl From<JoystickEvent> for WidgetEvent {
    fn from(event: JoystickEvent) -> Self {
        Self::Joystick(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_class_follows_variant() {
        let motion = WidgetEvent::from(PointerEvent::Motion {
            position: Point::new(4.0, 2.0),
        });
        assert_eq!(motion.device_class(), DeviceClass::Pointer);

        let key = WidgetEvent::from(KeyboardEvent::Key {
            key: 30,
            state: ButtonState::Pressed,
        });
        assert_eq!(key.device_class(), DeviceClass::Keyboard);

        let spnav = WidgetEvent::from(SpacenavEvent::Motion {
            translation: [1, 2, 3],
            rotation: [0, 0, 0],
        });
        assert_eq!(spnav.device_class(), DeviceClass::Spacenav);
    }
}
