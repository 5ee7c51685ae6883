/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        let num = u32::from_str_radix(digits, 16).ok()?;
        Some(Rgb((num >> 16) as u8, (num >> 8) as u8, num as u8))
    }

    /// Lift every channel by `amt * 255`, clamped to the valid range.
    pub fn brighten(self, amt: f64) -> Self {
        let lift = (255.0 * amt).round() as i32;
        let channel = |c: u8| (c as i32 + lift).clamp(0, 255) as u8;
        Rgb(channel(self.0), channel(self.1), channel(self.2))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

const LIGHT_PALETTE: [&str; 8] = [
    "#4CAF50", "#2196F3", "#FFC107", "#E91E63", "#9C27B0", "#FF7043", "#26A69A", "#7E57C2",
];

const DARK_PALETTE: [&str; 5] = ["#4cd08a", "#3bb0ff", "#ffd54f", "#ff8a80", "#b39ddb"];

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub palette: Vec<Rgb>,
    pub text: Rgb,
    pub surface: Rgb,
    pub faint: Rgb,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            palette: parse_palette(&LIGHT_PALETTE),
            text: Rgb(0x10, 0x20, 0x27),
            surface: Rgb(0xff, 0xff, 0xff),
            faint: Rgb(0xf0, 0xf0, 0xf0),
        }
    }

    pub fn dark() -> Self {
        Self {
            palette: parse_palette(&DARK_PALETTE),
            text: Rgb(0xe6, 0xee, 0xf6),
            surface: Rgb(0x1b, 0x24, 0x29),
            faint: Rgb(0x2c, 0x36, 0x3c),
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Colour of the `index`-th sector, cycling through the palette.
    pub fn segment(&self, index: usize) -> Rgb {
        if self.palette.is_empty() {
            return self.text;
        }
        self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

fn parse_palette(hexes: &[&str]) -> Vec<Rgb> {
    hexes.iter().filter_map(|h| Rgb::from_hex(h)).collect()
}
