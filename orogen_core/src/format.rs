// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel formats shared by the shm and dmabuf buffer paths.

/// Builds a DRM fourcc code from its four ASCII characters.
const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

/// A pixel format a buffer can be allocated in.
///
/// Covers the packed RGB formats used for shm window buffers plus the
/// planar and packed YUV formats accepted by the dmabuf import path.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
    /// 32-bit ARGB, 8 bits per channel.
    Argb8888,
    /// 32-bit RGB with unused alpha.
    Xrgb8888,
    /// 16-bit RGB, 5-6-5.
    Rgb565,
    /// Two-plane YUV 4:2:0, chroma interleaved.
    Nv12,
    /// Two-plane YUV 4:2:2, chroma interleaved.
    Nv16,
    /// Packed YUV 4:2:2, U-Y-V-Y ordering.
    Uyvy,
    /// Packed YUV 4:2:2, Y-U-Y-V ordering.
    Yuyv,
    /// Packed YUV 4:2:2, Y-V-Y-U ordering.
    Yvyu,
    /// Single-plane 8-bit greyscale.
    Gray8,
}

impl PixelFormat {
    /// The DRM fourcc code, as used by the dmabuf import protocol.
    #[must_use]
    pub const fn drm_fourcc(self) -> u32 {
        match self {
            Self::Argb8888 => fourcc(b'A', b'R', b'2', b'4'),
            Self::Xrgb8888 => fourcc(b'X', b'R', b'2', b'4'),
            Self::Rgb565 => fourcc(b'R', b'G', b'1', b'6'),
            Self::Nv12 => fourcc(b'N', b'V', b'1', b'2'),
            Self::Nv16 => fourcc(b'N', b'V', b'1', b'6'),
            Self::Uyvy => fourcc(b'U', b'Y', b'V', b'Y'),
            Self::Yuyv => fourcc(b'Y', b'U', b'Y', b'V'),
            Self::Yvyu => fourcc(b'Y', b'V', b'Y', b'U'),
            Self::Gray8 => fourcc(b'R', b'8', b' ', b' '),
        }
    }

    /// The wl_shm format code, for formats usable as shm buffers.
    ///
    /// The shm protocol reserves 0 and 1 for the two 32-bit RGB formats;
    /// every other code equals the DRM fourcc. Planar formats are not
    /// supported by shm pools and return `None`.
    #[must_use]
    pub const fn shm_code(self) -> Option<u32> {
        match self {
            Self::Argb8888 => Some(0),
            Self::Xrgb8888 => Some(1),
            Self::Rgb565 | Self::Uyvy | Self::Yuyv | Self::Yvyu | Self::Gray8 => {
                Some(self.drm_fourcc())
            }
            Self::Nv12 | Self::Nv16 => None,
        }
    }

    /// Number of memory planes a buffer of this format occupies.
    #[must_use]
    pub const fn plane_count(self) -> u32 {
        match self {
            Self::Nv12 | Self::Nv16 => 2,
            _ => 1,
        }
    }

    /// Bytes per pixel in the first plane.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Argb8888 | Self::Xrgb8888 => 4,
            Self::Rgb565 | Self::Uyvy | Self::Yuyv | Self::Yvyu => 2,
            Self::Nv12 | Self::Nv16 | Self::Gray8 => 1,
        }
    }

    /// Row stride in bytes of the first plane, for a tightly packed buffer
    /// `width` pixels wide.
    #[must_use]
    pub const fn stride(self, width: u32) -> u32 {
        width * self.bytes_per_pixel()
    }

    /// Total bytes of a tightly packed `width` x `height` buffer, all
    /// planes included.
    #[must_use]
    pub const fn buffer_size(self, width: u32, height: u32) -> u32 {
        let first = self.stride(width) * height;
        match self {
            // Interleaved chroma plane at half vertical resolution.
            Self::Nv12 => first + self.stride(width) * height.div_ceil(2),
            // Interleaved chroma plane at full vertical resolution.
            Self::Nv16 => first * 2,
            _ => first,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PixelFormat;

    #[test]
    fn fourcc_codes_match_drm_constants() {
        // Spot checks against drm_fourcc.h values.
        assert_eq!(PixelFormat::Argb8888.drm_fourcc(), 0x3432_5241);
        assert_eq!(PixelFormat::Rgb565.drm_fourcc(), 0x3631_4752);
        assert_eq!(PixelFormat::Nv12.drm_fourcc(), 0x3231_564E);
        assert_eq!(PixelFormat::Yuyv.drm_fourcc(), 0x5659_5559);
    }

    #[test]
    fn shm_reserves_low_codes_for_rgb32() {
        assert_eq!(PixelFormat::Argb8888.shm_code(), Some(0));
        assert_eq!(PixelFormat::Xrgb8888.shm_code(), Some(1));
        assert_eq!(
            PixelFormat::Rgb565.shm_code(),
            Some(PixelFormat::Rgb565.drm_fourcc())
        );
        assert_eq!(PixelFormat::Nv12.shm_code(), None);
    }

    #[test]
    fn buffer_sizes_account_for_chroma_planes() {
        assert_eq!(PixelFormat::Argb8888.buffer_size(100, 10), 4000);
        assert_eq!(PixelFormat::Rgb565.buffer_size(100, 10), 2000);
        // NV12: 100x10 luma + 100x5 interleaved chroma.
        assert_eq!(PixelFormat::Nv12.buffer_size(100, 10), 1500);
        // Odd heights round the chroma plane up.
        assert_eq!(PixelFormat::Nv12.buffer_size(100, 11), 1100 + 600);
        // NV16 chroma is full height.
        assert_eq!(PixelFormat::Nv16.buffer_size(100, 10), 2000);
    }
}
