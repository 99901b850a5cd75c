//! Linux virtual keyboard sink
//!
//! Creates a uinput device so a host can receive the resolved keystrokes as
//! if they came from a USB keyboard. Needs write access to `/dev/uinput`.

use super::{HidSink, SinkError};
use crate::keyboard::HidKeycode;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use log::info;
use std::io;

/// Name the virtual device registers under.
pub const DEVICE_NAME: &str = "spectrum-hid virtual keyboard";

pub struct UinputSink {
    device: VirtualDevice,
}

impl UinputSink {
    pub fn new() -> io::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 0..=u8::MAX {
            if let Some(key) = evdev_key(HidKeycode(code)) {
                keys.insert(key);
            }
        }

        let device = VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .with_keys(&keys)?
            .build()?;
        info!("Created uinput device '{}'", DEVICE_NAME);

        Ok(Self { device })
    }

    fn emit(&mut self, keycode: HidKeycode, value: i32) -> Result<(), SinkError> {
        let key = evdev_key(keycode).ok_or(SinkError::Unmapped(keycode))?;
        self.device
            .emit(&[InputEvent::new(EventType::KEY, key.code(), value)])?;
        Ok(())
    }
}

impl HidSink for UinputSink {
    fn press(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        self.emit(keycode, 1)
    }

    fn release(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        self.emit(keycode, 0)
    }
}

/// Linux input key for a HID keyboard usage.
pub fn evdev_key(keycode: HidKeycode) -> Option<Key> {
    let key = match keycode {
        HidKeycode::A => Key::KEY_A,
        HidKeycode::B => Key::KEY_B,
        HidKeycode::C => Key::KEY_C,
        HidKeycode::D => Key::KEY_D,
        HidKeycode::E => Key::KEY_E,
        HidKeycode::F => Key::KEY_F,
        HidKeycode::G => Key::KEY_G,
        HidKeycode::H => Key::KEY_H,
        HidKeycode::I => Key::KEY_I,
        HidKeycode::J => Key::KEY_J,
        HidKeycode::K => Key::KEY_K,
        HidKeycode::L => Key::KEY_L,
        HidKeycode::M => Key::KEY_M,
        HidKeycode::N => Key::KEY_N,
        HidKeycode::O => Key::KEY_O,
        HidKeycode::P => Key::KEY_P,
        HidKeycode::Q => Key::KEY_Q,
        HidKeycode::R => Key::KEY_R,
        HidKeycode::S => Key::KEY_S,
        HidKeycode::T => Key::KEY_T,
        HidKeycode::U => Key::KEY_U,
        HidKeycode::V => Key::KEY_V,
        HidKeycode::W => Key::KEY_W,
        HidKeycode::X => Key::KEY_X,
        HidKeycode::Y => Key::KEY_Y,
        HidKeycode::Z => Key::KEY_Z,
        HidKeycode::ONE => Key::KEY_1,
        HidKeycode::TWO => Key::KEY_2,
        HidKeycode::THREE => Key::KEY_3,
        HidKeycode::FOUR => Key::KEY_4,
        HidKeycode::FIVE => Key::KEY_5,
        HidKeycode::SIX => Key::KEY_6,
        HidKeycode::SEVEN => Key::KEY_7,
        HidKeycode::EIGHT => Key::KEY_8,
        HidKeycode::NINE => Key::KEY_9,
        HidKeycode::ZERO => Key::KEY_0,
        HidKeycode::ENTER => Key::KEY_ENTER,
        HidKeycode::ESCAPE => Key::KEY_ESC,
        HidKeycode::BACKSPACE => Key::KEY_BACKSPACE,
        HidKeycode::TAB => Key::KEY_TAB,
        HidKeycode::SPACE => Key::KEY_SPACE,
        HidKeycode::MINUS => Key::KEY_MINUS,
        HidKeycode::EQUALS => Key::KEY_EQUAL,
        HidKeycode::LEFT_BRACKET => Key::KEY_LEFTBRACE,
        HidKeycode::RIGHT_BRACKET => Key::KEY_RIGHTBRACE,
        HidKeycode::BACKSLASH => Key::KEY_BACKSLASH,
        HidKeycode::SEMICOLON => Key::KEY_SEMICOLON,
        HidKeycode::QUOTE => Key::KEY_APOSTROPHE,
        HidKeycode::GRAVE_ACCENT => Key::KEY_GRAVE,
        HidKeycode::COMMA => Key::KEY_COMMA,
        HidKeycode::PERIOD => Key::KEY_DOT,
        HidKeycode::FORWARD_SLASH => Key::KEY_SLASH,
        HidKeycode::CAPS_LOCK => Key::KEY_CAPSLOCK,
        HidKeycode::F1 => Key::KEY_F1,
        HidKeycode::F2 => Key::KEY_F2,
        HidKeycode::F3 => Key::KEY_F3,
        HidKeycode::F4 => Key::KEY_F4,
        HidKeycode::F5 => Key::KEY_F5,
        HidKeycode::F6 => Key::KEY_F6,
        HidKeycode::F7 => Key::KEY_F7,
        HidKeycode::F8 => Key::KEY_F8,
        HidKeycode::F9 => Key::KEY_F9,
        HidKeycode::F10 => Key::KEY_F10,
        HidKeycode::F11 => Key::KEY_F11,
        HidKeycode::F12 => Key::KEY_F12,
        HidKeycode::PRINT_SCREEN => Key::KEY_SYSRQ,
        HidKeycode::SCROLL_LOCK => Key::KEY_SCROLLLOCK,
        HidKeycode::PAUSE => Key::KEY_PAUSE,
        HidKeycode::INSERT => Key::KEY_INSERT,
        HidKeycode::HOME => Key::KEY_HOME,
        HidKeycode::PAGE_UP => Key::KEY_PAGEUP,
        HidKeycode::DELETE => Key::KEY_DELETE,
        HidKeycode::END => Key::KEY_END,
        HidKeycode::PAGE_DOWN => Key::KEY_PAGEDOWN,
        HidKeycode::RIGHT_ARROW => Key::KEY_RIGHT,
        HidKeycode::LEFT_ARROW => Key::KEY_LEFT,
        HidKeycode::DOWN_ARROW => Key::KEY_DOWN,
        HidKeycode::UP_ARROW => Key::KEY_UP,
        HidKeycode::LEFT_CONTROL => Key::KEY_LEFTCTRL,
        HidKeycode::LEFT_SHIFT => Key::KEY_LEFTSHIFT,
        HidKeycode::LEFT_ALT => Key::KEY_LEFTALT,
        HidKeycode::LEFT_GUI => Key::KEY_LEFTMETA,
        HidKeycode::RIGHT_CONTROL => Key::KEY_RIGHTCTRL,
        HidKeycode::RIGHT_SHIFT => Key::KEY_RIGHTSHIFT,
        HidKeycode::RIGHT_ALT => Key::KEY_RIGHTALT,
        HidKeycode::RIGHT_GUI => Key::KEY_RIGHTMETA,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_letters_digits_and_modifiers() {
        assert_eq!(evdev_key(HidKeycode::A), Some(Key::KEY_A));
        assert_eq!(evdev_key(HidKeycode::ZERO), Some(Key::KEY_0));
        assert_eq!(evdev_key(HidKeycode::LEFT_ALT), Some(Key::KEY_LEFTALT));
        assert_eq!(evdev_key(HidKeycode::RIGHT_ARROW), Some(Key::KEY_RIGHT));
    }

    #[test]
    fn unknown_usage_is_unmapped() {
        assert_eq!(evdev_key(HidKeycode(0x90)), None);
    }
}
