// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-device-class focus tracking.
//!
//! Each window keeps one [`FocusMap`] recording which widget currently
//! receives events of each [`DeviceClass`]. Focus moves when a widget's
//! event handler claims it by returning a new target; the routing layer
//! clears a slot when its holder goes away.

use crate::event::DeviceClass;

/// Which widget holds focus for each device class.
///
/// `W` is the widget identifier type. A `None` slot means events of that
/// class fall through to the window's root widget.
#[derive(Clone, Copy, Debug)]
pub struct FocusMap<W> {
    pointer: Option<W>,
    keyboard: Option<W>,
    touch: Option<W>,
    spacenav: Option<W>,
    joystick: Option<W>,
}

impl<W> Default for FocusMap<W> {
    fn default() -> Self {
        Self {
            pointer: None,
            keyboard: None,
            touch: None,
            spacenav: None,
            joystick: None,
        }
    }
}

impl<W> FocusMap<W> {
    fn slot(&mut self, class: DeviceClass) -> &mut Option<W> {
        match class {
            DeviceClass::Pointer => &mut self.pointer,
            DeviceClass::Keyboard => &mut self.keyboard,
            DeviceClass::Touch => &mut self.touch,
            DeviceClass::Spacenav => &mut self.spacenav,
            DeviceClass::Joystick => &mut self.joystick,
        }
    }

    /// The widget focused for `class`, if any.
    #[must_use]
    pub const fn get(&self, class: DeviceClass) -> Option<&W> {
        match class {
            DeviceClass::Pointer => self.pointer.as_ref(),
            DeviceClass::Keyboard => self.keyboard.as_ref(),
            DeviceClass::Touch => self.touch.as_ref(),
            DeviceClass::Spacenav => self.spacenav.as_ref(),
            DeviceClass::Joystick => self.joystick.as_ref(),
        }
    }

    /// Moves focus for `class` to `widget`, returning the previous holder.
    pub fn set(&mut self, class: DeviceClass, widget: W) -> Option<W> {
        self.slot(class).replace(widget)
    }

    /// Drops focus for `class`, returning the previous holder.
    pub fn clear(&mut self, class: DeviceClass) -> Option<W> {
        self.slot(class).take()
    }
}

#[cfg(test)]
mod tests {
    use super::FocusMap;
    use crate::event::DeviceClass;

    #[test]
    fn classes_are_independent() {
        let mut focus = FocusMap::default();
        assert_eq!(focus.set(DeviceClass::Pointer, 1_u32), None);
        assert_eq!(focus.set(DeviceClass::Keyboard, 2), None);

        assert_eq!(focus.get(DeviceClass::Pointer), Some(&1));
        assert_eq!(focus.get(DeviceClass::Keyboard), Some(&2));
        assert_eq!(focus.get(DeviceClass::Touch), None);
    }

    #[test]
    fn set_returns_displaced_holder() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Pointer, 1_u32);
        assert_eq!(focus.set(DeviceClass::Pointer, 2), Some(1));
        assert_eq!(focus.get(DeviceClass::Pointer), Some(&2));
    }

    #[test]
    fn cleared_class_returns_the_displaced_holder() {
        let mut focus = FocusMap::default();
        focus.set(DeviceClass::Touch, 7_u32);
        assert_eq!(focus.clear(DeviceClass::Touch), Some(7));
        assert_eq!(focus.get(DeviceClass::Touch), None);
        assert_eq!(focus.clear(DeviceClass::Touch), None);
    }
}
