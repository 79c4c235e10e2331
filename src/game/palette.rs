use bevy::color::Color;

/// The sixteen fixed colours every palette index maps to.
pub const PALETTE: [u32; 16] = [
    0x000000, 0x1D2B53, 0x7E2553, 0x008751,
    0xAB5236, 0x5F574F, 0xC2C3C7, 0xFFF1E8,
    0xFF004D, 0xFFA300, 0xFFEC27, 0x00E436,
    0x29ADFF, 0x83769C, 0xFF77A8, 0xFFCCAA,
];

/// Indices past the end wrap around, as the palette is only 4 bits deep.
pub fn rgba(col: u8) -> [u8; 4] {
    let rgb = PALETTE[col as usize % PALETTE.len()];
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xFF]
}

pub fn color(col: u8) -> Color {
    let [r, g, b, _] = rgba(col);
    Color::srgb_u8(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_channels() {
        assert_eq!(rgba(8), [0xFF, 0x00, 0x4D, 0xFF]);
        assert_eq!(rgba(0), [0, 0, 0, 0xFF]);
        assert_eq!(rgba(16 + 3), rgba(3));
    }
}
