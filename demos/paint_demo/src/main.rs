// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scribble on a window with the pointer. Space navigator and joystick
//! events, if those devices exist, are logged as they broadcast.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use orogen_backend_wayland::{
    Display, DisplayError, JoystickSource, ROOT_WIDGET, SpacenavSource, WindowConfig,
};
use orogen_core::event::{ButtonState, PointerEvent, WidgetEvent};

const BACKGROUND: u32 = 0xFF20_2028;
const INK: u32 = 0xFFE8_C060;
const DOT: i64 = 3;

fn draw_dot(bytes: &mut [u8], stride: usize, width: i64, height: i64, x: f64, y: f64) {
    let (cx, cy) = (x as i64, y as i64);
    for dy in -DOT..=DOT {
        for dx in -DOT..=DOT {
            let (px, py) = (cx + dx, cy + dy);
            if px < 0 || py < 0 || px >= width || py >= height {
                continue;
            }
            let at = py as usize * stride + px as usize * 4;
            bytes[at..at + 4].copy_from_slice(&INK.to_le_bytes());
        }
    }
}

fn main() -> Result<(), DisplayError> {
    env_logger::init();
    let display = Display::connect()?;

    // Optional devices: absence is logged, never fatal.
    match SpacenavSource::open() {
        Ok(source) => display.register_source(Box::new(source))?,
        Err(err) => log::info!("no space navigator: {err}"),
    }
    match JoystickSource::open() {
        Ok(source) => display.register_source(Box::new(source))?,
        Err(err) => log::info!("no joystick: {err}"),
    }
    for output in display.outputs() {
        let (width, height) = output.oriented_size();
        log::info!("output {:?}: {width}x{height}", output.id);
    }

    let strokes: Arc<Mutex<Vec<(f64, f64)>>> = Arc::new(Mutex::new(Vec::new()));

    let paint_strokes = Arc::clone(&strokes);
    let window = display.create_window(&WindowConfig::new("Orogen paint", 800, 600), move |canvas| {
        canvas.fill(BACKGROUND);
        let (width, height, stride) = (
            i64::from(canvas.width()),
            i64::from(canvas.height()),
            canvas.stride() as usize,
        );
        let points = paint_strokes.lock().expect("stroke lock").clone();
        let bytes = canvas.bytes_mut();
        for (x, y) in points {
            draw_dot(bytes, stride, width, height, x, y);
        }
    })?;

    let scheduler = window.scheduler();
    let input_strokes = strokes;
    let mut drawing = false;
    window.set_event_handler(move |event: &WidgetEvent| {
        match event {
            WidgetEvent::Pointer(PointerEvent::Button {
                position, state, ..
            }) => {
                drawing = *state == ButtonState::Pressed;
                if drawing {
                    input_strokes
                        .lock()
                        .expect("stroke lock")
                        .push((position.x, position.y));
                    scheduler.schedule();
                }
            }
            WidgetEvent::Pointer(PointerEvent::Motion { position }) if drawing => {
                input_strokes
                    .lock()
                    .expect("stroke lock")
                    .push((position.x, position.y));
                scheduler.schedule();
            }
            WidgetEvent::Spacenav(event) => log::info!("spacenav: {event:?}"),
            WidgetEvent::Joystick(event) => log::info!("joystick: {event:?}"),
            _ => {}
        }
        Some(ROOT_WIDGET)
    });

    while !window.close_requested() {
        std::thread::sleep(Duration::from_millis(50));
    }
    if let Some(fps) = window.frames_per_second() {
        log::info!("presented around {fps:.1} frames per second");
    }
    window.close();
    display.shutdown();
    Ok(())
}
