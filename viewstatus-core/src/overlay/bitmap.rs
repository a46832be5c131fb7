//! Built-in 5x7 bitmap face used when no TrueType font can be loaded.
//!
//! Covers the caption alphabet only; anything else renders as a hollow box.

/// Glyph cell width in font units.
pub const CELL_WIDTH: u32 = 5;
/// Glyph cell height in font units.
pub const CELL_HEIGHT: u32 = 7;
/// Horizontal advance in font units (one unit of spacing).
pub const ADVANCE: u32 = 6;

const MISSING: [u8; 7] = [
    0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111,
];

/// Row bitmaps, top row first, bit 4 is the leftmost column.
pub fn rows(c: char) -> [u8; 7] {
    match c {
        ' ' => [0; 7],
        'v' => [0, 0, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'i' => [0b00100, 0, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'e' => [0, 0, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'w' => [0, 0, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010],
        'd' => [
            0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10011, 0b01101,
        ],
        'f' => [
            0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000,
        ],
        'o' => [0, 0, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'r' => [0, 0, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        '0' => [
            0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
        ],
        '1' => [
            0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ],
        '2' => [
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
        ],
        '3' => [
            0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110,
        ],
        '4' => [
            0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
        ],
        '5' => [
            0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
        ],
        '6' => [
            0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
        ],
        '7' => [
            0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
        ],
        '8' => [
            0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
        ],
        '9' => [
            0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100,
        ],
        '%' => [
            0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011,
        ],
        _ => MISSING,
    }
}

/// Expand a glyph into an 8-bit coverage mask at an integer scale.
pub fn coverage(c: char, scale: u32) -> Vec<u8> {
    let scale = scale.max(1);
    let width = CELL_WIDTH * scale;
    let height = CELL_HEIGHT * scale;
    let rows = rows(c);
    let mut mask = vec![0u8; (width * height) as usize];

    for y in 0..height {
        let bits = rows[(y / scale) as usize];
        for x in 0..width {
            let column = x / scale;
            if bits & (1 << (CELL_WIDTH - 1 - column)) != 0 {
                mask[(y * width + x) as usize] = 255;
            }
        }
    }

    mask
}
