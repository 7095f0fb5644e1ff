use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 0x5f, g: 0xd7, b: 0xff };
pub const ACCENT: Color = Color::TrueColor { r: 0xff, g: 0xaf, b: 0x5f };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::TrueColor { r: 0x87, g: 0xd7, b: 0x87 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 0xd7, g: 0xaf, b: 0xff };

pub const LINK_UP: Color = Color::Green;
pub const LINK_DOWN: Color = Color::Red;
pub const UNRESOLVED: Color = Color::Yellow;
