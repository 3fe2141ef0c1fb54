pub const SPAN_FLAG_ITALIC: u32 = 1 << 1;
pub const SPAN_FLAG_BOLD: u32 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn from_array(raw: [f64; 4]) -> Self {
        Self {
            x0: raw[0],
            y0: raw[1],
            x1: raw[2],
            y1: raw[3],
        }
    }

    pub fn union(self, other: BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpan {
    pub text: String,
    pub font: String,
    pub size: f64,
    pub flags: u32,
    pub bbox: BBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub page: usize,
    pub bbox: BBox,
    pub spans: Vec<FontSpan>,
    pub is_centered: bool,
    pub spacing_above: f64,
    pub block_density: usize,
}

impl Line {
    pub fn avg_size(&self) -> f64 {
        if self.spans.is_empty() {
            return 0.0;
        }
        self.spans.iter().map(|span| span.size).sum::<f64>() / self.spans.len() as f64
    }

    pub fn top(&self) -> f64 {
        self.bbox.y0
    }

    pub fn has_flag(&self, mask: u32) -> bool {
        self.spans.iter().any(|span| span.flags & mask != 0)
    }
}

pub fn alnum_count(text: &str) -> usize {
    text.chars().filter(|character| character.is_alphanumeric()).count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}
