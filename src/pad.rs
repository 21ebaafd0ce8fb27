//! Controller input block for one port on one frame
//!
//! The 18 bytes follow the DualShock 2 report layout:
//!
//! | Offset | Size | Field                                        |
//! |--------|------|----------------------------------------------|
//! | 0      | 1    | digital buttons, group one (active low)      |
//! | 1      | 1    | digital buttons, group two (active low)      |
//! | 2      | 1    | right stick X                                |
//! | 3      | 1    | right stick Y                                |
//! | 4      | 1    | left stick X                                 |
//! | 5      | 1    | left stick Y                                 |
//! | 6..18  | 12   | pressure: right, left, up, down, triangle,   |
//! |        |      | circle, cross, square, L1, R1, L2, R2        |

use crate::storage::CONTROLLER_INPUT_BYTES;

/// Stick value at rest
pub const ANALOG_NEUTRAL: u8 = 0x7F;

/// Pressure reported for a fully pressed button
pub const PRESSURE_MAX: u8 = 0xFF;

const PRESSURE_OFFSET: usize = 6;

/// Digital buttons carried in the first two bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Select
    Select,
    /// Left stick click
    L3,
    /// Right stick click
    R3,
    /// Start
    Start,
    /// D-pad up
    Up,
    /// D-pad right
    Right,
    /// D-pad down
    Down,
    /// D-pad left
    Left,
    /// Left trigger
    L2,
    /// Right trigger
    R2,
    /// Left bumper
    L1,
    /// Right bumper
    R1,
    /// Triangle
    Triangle,
    /// Circle
    Circle,
    /// Cross
    Cross,
    /// Square
    Square,
}

impl Button {
    /// Every button, in bit order
    pub const ALL: [Self; 16] = [
        Self::Select,
        Self::L3,
        Self::R3,
        Self::Start,
        Self::Up,
        Self::Right,
        Self::Down,
        Self::Left,
        Self::L2,
        Self::R2,
        Self::L1,
        Self::R1,
        Self::Triangle,
        Self::Circle,
        Self::Cross,
        Self::Square,
    ];

    /// Byte index and bit mask of the button's digital flag
    #[must_use]
    pub fn flag(self) -> (usize, u8) {
        let position = self as usize;
        (position / 8, 1 << (position % 8))
    }

    /// Byte index of the button's pressure value, if it reports one
    #[must_use]
    pub fn pressure_index(self) -> Option<usize> {
        let slot = match self {
            Self::Right => 0,
            Self::Left => 1,
            Self::Up => 2,
            Self::Down => 3,
            Self::Triangle => 4,
            Self::Circle => 5,
            Self::Cross => 6,
            Self::Square => 7,
            Self::L1 => 8,
            Self::R1 => 9,
            Self::L2 => 10,
            Self::R2 => 11,
            Self::Select | Self::L3 | Self::R3 | Self::Start => return None,
        };
        Some(PRESSURE_OFFSET + slot)
    }
}

/// Raw controller bytes for one port on one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadData {
    bytes: [u8; CONTROLLER_INPUT_BYTES],
}

impl Default for PadData {
    /// Idle controller: nothing pressed, sticks centered
    fn default() -> Self {
        let mut bytes = [0u8; CONTROLLER_INPUT_BYTES];
        bytes[0] = 0xFF;
        bytes[1] = 0xFF;
        bytes[2..PRESSURE_OFFSET].fill(ANALOG_NEUTRAL);
        Self { bytes }
    }
}

impl PadData {
    /// Wrap raw bytes as read from a recording
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CONTROLLER_INPUT_BYTES]) -> Self {
        Self { bytes }
    }

    /// Raw bytes as written to a recording
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CONTROLLER_INPUT_BYTES] {
        &self.bytes
    }

    /// Byte at `index`, if in range
    #[must_use]
    pub fn poll(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Overwrite the byte at `index`; returns false if out of range
    pub fn update(&mut self, index: usize, value: u8) -> bool {
        match self.bytes.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Whether `button` is held
    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        let (index, mask) = button.flag();
        self.bytes[index] & mask == 0
    }

    /// Press or release `button`, keeping its pressure byte consistent
    pub fn set_pressed(&mut self, button: Button, pressed: bool) {
        let (index, mask) = button.flag();
        if pressed {
            self.bytes[index] &= !mask;
        } else {
            self.bytes[index] |= mask;
        }
        if let Some(pressure) = button.pressure_index() {
            self.bytes[pressure] = if pressed { PRESSURE_MAX } else { 0 };
        }
    }

    /// Pressure of `button`, for buttons that report one
    #[must_use]
    pub fn pressure(&self, button: Button) -> Option<u8> {
        button.pressure_index().map(|index| self.bytes[index])
    }

    /// Held buttons, in bit order
    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(|&b| self.is_pressed(b))
    }

    /// Left stick (x, y)
    #[must_use]
    pub fn left_stick(&self) -> (u8, u8) {
        (self.bytes[4], self.bytes[5])
    }

    /// Right stick (x, y)
    #[must_use]
    pub fn right_stick(&self) -> (u8, u8) {
        (self.bytes[2], self.bytes[3])
    }

    /// Set the left stick position
    pub fn set_left_stick(&mut self, x: u8, y: u8) {
        self.bytes[4] = x;
        self.bytes[5] = y;
    }

    /// Set the right stick position
    pub fn set_right_stick(&mut self, x: u8, y: u8) {
        self.bytes[2] = x;
        self.bytes[3] = y;
    }
}

impl From<[u8; CONTROLLER_INPUT_BYTES]> for PadData {
    fn from(bytes: [u8; CONTROLLER_INPUT_BYTES]) -> Self {
        Self::from_bytes(bytes)
    }
}
