// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output (monitor) tracking.

use wayland_client::protocol::wl_output;

/// Identifier of an output, from the registry advertisement.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OutputId(pub u32);

/// How an output's content is rotated or flipped relative to its panel.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Transform {
    #[default]
    Normal,
    Rotated90,
    Rotated180,
    Rotated270,
    Flipped,
    Flipped90,
    Flipped180,
    Flipped270,
}

impl Transform {
    pub(crate) fn from_wayland(transform: wl_output::Transform) -> Self {
        match transform {
            wl_output::Transform::Normal => Self::Normal,
            wl_output::Transform::_90 => Self::Rotated90,
            wl_output::Transform::_180 => Self::Rotated180,
            wl_output::Transform::_270 => Self::Rotated270,
            wl_output::Transform::Flipped => Self::Flipped,
            wl_output::Transform::Flipped90 => Self::Flipped90,
            wl_output::Transform::Flipped180 => Self::Flipped180,
            wl_output::Transform::Flipped270 => Self::Flipped270,
            _ => Self::Normal,
        }
    }

    /// True when the transform swaps the panel's width and height.
    #[must_use]
    pub const fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Rotated90 | Self::Rotated270 | Self::Flipped90 | Self::Flipped270
        )
    }
}

/// A snapshot of one output's geometry.
///
/// `width` and `height` are the panel's native mode; [`OutputInfo::oriented_size`]
/// gives the size as seen by clients after the transform is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputInfo {
    pub id: OutputId,
    /// Native mode width, pixels.
    pub width: i32,
    /// Native mode height, pixels.
    pub height: i32,
    pub transform: Transform,
    pub scale: i32,
}

impl OutputInfo {
    pub(crate) fn new(id: OutputId) -> Self {
        Self {
            id,
            width: 0,
            height: 0,
            transform: Transform::Normal,
            scale: 1,
        }
    }

    /// The output's size in the orientation clients see.
    #[must_use]
    pub const fn oriented_size(&self) -> (i32, i32) {
        if self.transform.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turns_swap_the_reported_size() {
        let mut info = OutputInfo::new(OutputId(1));
        info.width = 1920;
        info.height = 1080;

        assert_eq!(info.oriented_size(), (1920, 1080));
        info.transform = Transform::Rotated90;
        assert_eq!(info.oriented_size(), (1080, 1920));
        info.transform = Transform::Rotated180;
        assert_eq!(info.oriented_size(), (1920, 1080));
        info.transform = Transform::Flipped270;
        assert_eq!(info.oriented_size(), (1080, 1920));
    }
}
