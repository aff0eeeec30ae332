// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Auxiliary input devices without surface addressing.
//!
//! Both devices are optional: a missing daemon socket or device node is
//! reported to the caller, who logs and continues. Their events broadcast
//! to every window's root widget.

use std::io::{self, Read};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;

use orogen_core::event::{ButtonState, JoystickEvent, SpacenavEvent, WidgetEvent};

use crate::display::EventRouter;
use crate::error::DisplayError;
use crate::event_loop::{EventSource, Readiness, SourceAction};

/// Default socket of the spacenavd daemon.
pub const SPACENAV_SOCKET: &str = "/var/run/spnav.sock";

/// Default kernel joystick node.
pub const JOYSTICK_DEVICE: &str = "/dev/input/js0";

const SPACENAV_PACKET: usize = 32;

/// Decodes one 8-word spacenavd packet.
fn parse_spacenav_packet(packet: &[u8; SPACENAV_PACKET]) -> Option<SpacenavEvent> {
    let mut words = [0_i32; 8];
    for (word, chunk) in words.iter_mut().zip(packet.chunks_exact(4)) {
        *word = i32::from_le_bytes(chunk.try_into().ok()?);
    }
    match words[0] {
        0 => Some(SpacenavEvent::Motion {
            translation: [words[1], words[2], words[3]],
            rotation: [words[4], words[5], words[6]],
        }),
        1 => Some(SpacenavEvent::Button {
            button: u32::try_from(words[1]).ok()?,
            state: ButtonState::Pressed,
        }),
        2 => Some(SpacenavEvent::Button {
            button: u32::try_from(words[1]).ok()?,
            state: ButtonState::Released,
        }),
        _ => None,
    }
}

/// Six-degree-of-freedom input from the spacenavd daemon.
#[derive(Debug)]
pub struct SpacenavSource {
    stream: UnixStream,
    partial: [u8; SPACENAV_PACKET],
    filled: usize,
}

impl SpacenavSource {
    /// Connects to the daemon's default socket.
    pub fn open() -> io::Result<Self> {
        Self::open_at(SPACENAV_SOCKET)
    }

    pub fn open_at(path: &str) -> io::Result<Self> {
        let stream = UnixStream::connect(path)?;
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            partial: [0; SPACENAV_PACKET],
            filled: 0,
        })
    }

    #[cfg(test)]
    fn from_stream(stream: UnixStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            partial: [0; SPACENAV_PACKET],
            filled: 0,
        })
    }
}

impl EventSource for SpacenavSource {
    fn fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }

    fn ready(
        &mut self,
        router: &mut EventRouter<'_>,
        readiness: Readiness,
    ) -> Result<SourceAction, DisplayError> {
        loop {
            match self.stream.read(&mut self.partial[self.filled..]) {
                Ok(0) => return Ok(SourceAction::Remove),
                Ok(n) => {
                    self.filled += n;
                    if self.filled == SPACENAV_PACKET {
                        self.filled = 0;
                        if let Some(event) = parse_spacenav_packet(&self.partial) {
                            router.broadcast(&WidgetEvent::Spacenav(event));
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        if readiness.hangup {
            return Ok(SourceAction::Remove);
        }
        Ok(SourceAction::Continue)
    }
}

const JS_EVENT_SIZE: usize = 8;
const JS_EVENT_BUTTON: u8 = 0x01;
const JS_EVENT_AXIS: u8 = 0x02;
const JS_EVENT_INIT: u8 = 0x80;

/// Decodes one kernel `js_event` record. Synthetic init events describing
/// the device's resting state are skipped.
fn parse_js_event(record: &[u8; JS_EVENT_SIZE]) -> Option<JoystickEvent> {
    let value = i16::from_le_bytes([record[4], record[5]]);
    let kind = record[6];
    let number = record[7];
    if kind & JS_EVENT_INIT != 0 {
        return None;
    }
    if kind & JS_EVENT_BUTTON != 0 {
        return Some(JoystickEvent::Button {
            number,
            state: if value != 0 {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            },
        });
    }
    if kind & JS_EVENT_AXIS != 0 {
        return Some(JoystickEvent::Axis { number, value });
    }
    None
}

/// Axis-and-button input from the kernel joystick interface.
#[derive(Debug)]
pub struct JoystickSource {
    file: std::fs::File,
    partial: [u8; JS_EVENT_SIZE],
    filled: usize,
}

impl JoystickSource {
    /// Opens the first joystick node.
    pub fn open() -> io::Result<Self> {
        Self::open_at(JOYSTICK_DEVICE)
    }

    pub fn open_at(path: &str) -> io::Result<Self> {
        let fd = rustix::fs::open(
            path,
            rustix::fs::OFlags::RDONLY
                | rustix::fs::OFlags::NONBLOCK
                | rustix::fs::OFlags::CLOEXEC,
            rustix::fs::Mode::empty(),
        )
        .map_err(io::Error::from)?;
        Ok(Self {
            file: fd.into(),
            partial: [0; JS_EVENT_SIZE],
            filled: 0,
        })
    }
}

impl EventSource for JoystickSource {
    fn fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }

    fn ready(
        &mut self,
        router: &mut EventRouter<'_>,
        readiness: Readiness,
    ) -> Result<SourceAction, DisplayError> {
        loop {
            match self.file.read(&mut self.partial[self.filled..]) {
                Ok(0) => return Ok(SourceAction::Remove),
                Ok(n) => {
                    self.filled += n;
                    if self.filled == JS_EVENT_SIZE {
                        self.filled = 0;
                        if let Some(event) = parse_js_event(&self.partial) {
                            router.broadcast(&WidgetEvent::Joystick(event));
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        if readiness.hangup {
            return Ok(SourceAction::Remove);
        }
        Ok(SourceAction::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowInner;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn empty_window_list() -> Mutex<Vec<Arc<WindowInner>>> {
        Mutex::new(Vec::new())
    }

    fn spacenav_motion_packet(values: [i32; 6]) -> [u8; SPACENAV_PACKET] {
        let mut packet = [0_u8; SPACENAV_PACKET];
        for (index, value) in std::iter::once(0).chain(values).enumerate() {
            packet[index * 4..index * 4 + 4].copy_from_slice(&value.to_le_bytes());
        }
        packet
    }

    #[test]
    fn spacenav_motion_packet_decodes_all_axes() {
        let packet = spacenav_motion_packet([1, -2, 3, -4, 5, -6]);
        assert_eq!(
            parse_spacenav_packet(&packet),
            Some(SpacenavEvent::Motion {
                translation: [1, -2, 3],
                rotation: [-4, 5, -6],
            })
        );
    }

    #[test]
    fn spacenav_button_packets_decode_press_and_release() {
        let mut packet = [0_u8; SPACENAV_PACKET];
        packet[..4].copy_from_slice(&1_i32.to_le_bytes());
        packet[4..8].copy_from_slice(&2_i32.to_le_bytes());
        assert_eq!(
            parse_spacenav_packet(&packet),
            Some(SpacenavEvent::Button {
                button: 2,
                state: ButtonState::Pressed,
            })
        );
        packet[..4].copy_from_slice(&2_i32.to_le_bytes());
        assert_eq!(
            parse_spacenav_packet(&packet),
            Some(SpacenavEvent::Button {
                button: 2,
                state: ButtonState::Released,
            })
        );
    }

    #[test]
    fn unknown_spacenav_packet_types_are_dropped() {
        let mut packet = [0_u8; SPACENAV_PACKET];
        packet[..4].copy_from_slice(&9_i32.to_le_bytes());
        assert_eq!(parse_spacenav_packet(&packet), None);
    }

    fn js_record(value: i16, kind: u8, number: u8) -> [u8; JS_EVENT_SIZE] {
        let mut record = [0_u8; JS_EVENT_SIZE];
        record[4..6].copy_from_slice(&value.to_le_bytes());
        record[6] = kind;
        record[7] = number;
        record
    }

    #[test]
    fn joystick_axis_and_button_records_decode() {
        assert_eq!(
            parse_js_event(&js_record(-12000, JS_EVENT_AXIS, 1)),
            Some(JoystickEvent::Axis {
                number: 1,
                value: -12000,
            })
        );
        assert_eq!(
            parse_js_event(&js_record(1, JS_EVENT_BUTTON, 3)),
            Some(JoystickEvent::Button {
                number: 3,
                state: ButtonState::Pressed,
            })
        );
    }

    #[test]
    fn joystick_init_records_are_skipped() {
        let record = js_record(1, JS_EVENT_BUTTON | JS_EVENT_INIT, 0);
        assert_eq!(parse_js_event(&record), None);
    }

    #[test]
    fn spacenav_source_survives_split_packets() {
        let (mut writer, reader) = UnixStream::pair().expect("socket pair");
        let mut source = SpacenavSource::from_stream(reader).expect("source");
        let windows = empty_window_list();
        let mut router = EventRouter::new(&windows);

        let packet = spacenav_motion_packet([1, 2, 3, 4, 5, 6]);
        writer.write_all(&packet[..10]).expect("write head");
        let action = source
            .ready(&mut router, Readiness { readable: true, hangup: false })
            .expect("ready");
        assert_eq!(action, SourceAction::Continue);
        assert_eq!(source.filled, 10);

        writer.write_all(&packet[10..]).expect("write tail");
        let action = source
            .ready(&mut router, Readiness { readable: true, hangup: false })
            .expect("ready");
        assert_eq!(action, SourceAction::Continue);
        assert_eq!(source.filled, 0);
    }

    #[test]
    fn spacenav_source_removes_itself_on_hangup() {
        let (writer, reader) = UnixStream::pair().expect("socket pair");
        let mut source = SpacenavSource::from_stream(reader).expect("source");
        let windows = empty_window_list();
        let mut router = EventRouter::new(&windows);
        drop(writer);

        let action = source
            .ready(&mut router, Readiness { readable: true, hangup: true })
            .expect("ready");
        assert_eq!(action, SourceAction::Remove);
    }
}
