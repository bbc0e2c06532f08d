//! Constants for the tracker wire formats

// Legacy fixed-layout format
pub const LEGACY_DATAGRAM_SIZE: usize = 124;
pub const LEGACY_MAGIC: u32 = 0x544d_4531; // "1EMT" little-endian
pub const LEGACY_OFFSET_COUNTER: usize = 8; // u32
pub const LEGACY_OFFSET_DOUBLES: usize = 12; // 14 × f64 follow back to back

// Public tagged format header
pub const PUBLIC_MAGIC: &[u8; 5] = b"DMC01";
pub const PUBLIC_RESERVED_BYTE: u8 = b' '; // byte 5, ignored on decode
pub const PUBLIC_HEADER_SIZE: usize = 8;
pub const PUBLIC_OFFSET_TYPE: usize = 6;
pub const PUBLIC_OFFSET_SUBFORMAT: usize = 7;

// Header tags
pub const TYPE_CONSTANTS: u8 = b'C';
pub const TYPE_PARAMETERS: u8 = b'P';
pub const SUBFORMAT_BINARY: u8 = b'B';
pub const SUBFORMAT_ASCII: u8 = b'A';

// ASCII parameters: payload starting with this byte carries an id token
pub const ASCII_ID_MARKER: u8 = b'I';

// Binary constants struct (64 bytes)
pub const CONSTANTS_STRUCT_SIZE: usize = 64;
pub const CONST_OFFSET_ID: usize = 0; // u32
pub const CONST_OFFSET_IMAGE_WIDTH: usize = 4; // i32
pub const CONST_OFFSET_IMAGE_HEIGHT: usize = 8; // i32
pub const CONST_OFFSET_BLANK_LEFT: usize = 12; // i32
pub const CONST_OFFSET_BLANK_RIGHT: usize = 16; // i32
pub const CONST_OFFSET_BLANK_TOP: usize = 20; // i32
pub const CONST_OFFSET_BLANK_BOTTOM: usize = 24; // i32
pub const CONST_OFFSET_CHIP_WIDTH: usize = 32; // f64, 28..32 is padding
pub const CONST_OFFSET_CHIP_HEIGHT: usize = 40; // f64
pub const CONST_OFFSET_FAKE_CHIP_WIDTH: usize = 48; // f64
pub const CONST_OFFSET_FAKE_CHIP_HEIGHT: usize = 56; // f64

// Binary parameters struct (200 bytes)
pub const PARAMS_STRUCT_SIZE: usize = 200;
pub const PARAM_OFFSET_ID: usize = 0; // u32
pub const PARAM_OFFSET_FORMAT: usize = 4; // u32
pub const PARAM_OFFSET_TRANSFORM: usize = 8; // 16 × f64 (Euler uses the first 6)
pub const PARAM_OFFSET_FOV: usize = 136; // f64
pub const PARAM_OFFSET_CENTER_X: usize = 144; // f64
pub const PARAM_OFFSET_CENTER_Y: usize = 152; // f64
pub const PARAM_OFFSET_K1: usize = 160; // f64
pub const PARAM_OFFSET_K2: usize = 168; // f64
pub const PARAM_OFFSET_FOCUS_DISTANCE: usize = 176; // f64
pub const PARAM_OFFSET_APERTURE: usize = 184; // f64
pub const PARAM_OFFSET_COUNTER: usize = 192; // u32, 196..200 is padding

// Receive buffer
pub const MAX_DATAGRAM_SIZE: usize = 4096;
