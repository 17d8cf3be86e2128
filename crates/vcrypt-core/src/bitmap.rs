use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VcError;

/// State of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pixel {
    /// Transparent, shows the background.
    Clear,
    /// Opaque black.
    Ink,
}

impl Pixel {
    pub fn is_ink(self) -> bool {
        self == Pixel::Ink
    }

    /// Result of stacking two transparencies.
    pub fn union(self, other: Pixel) -> Pixel {
        if self.is_ink() || other.is_ink() {
            Pixel::Ink
        } else {
            Pixel::Clear
        }
    }

    pub fn inverted(self) -> Pixel {
        match self {
            Pixel::Clear => Pixel::Ink,
            Pixel::Ink => Pixel::Clear,
        }
    }
}

/// Width and height of an image, in cells.
/// Largest logical width or height whose key still has representable
/// dimensions.
pub const MAX_LOGICAL_SIDE: u32 = u32::MAX / 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cells.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_even(&self) -> bool {
        self.width % 2 == 0 && self.height % 2 == 0
    }

    /// Size of the key or share belonging to an image of these dimensions.
    /// Fails with [`VcError::TooLarge`] past [`MAX_LOGICAL_SIDE`].
    pub fn doubled(&self) -> Result<Self, VcError> {
        match (self.width.checked_mul(2), self.height.checked_mul(2)) {
            (Some(width), Some(height)) => Ok(Self::new(width, height)),
            _ => Err(VcError::TooLarge(*self)),
        }
    }

    /// Logical size behind a double-resolution image (integer division).
    pub fn halved(&self) -> Self {
        Self::new(self.width / 2, self.height / 2)
    }

    pub fn fits_within(&self, limit: Dimensions) -> bool {
        self.width <= limit.width && self.height <= limit.height
    }

    /// Component-wise maximum.
    pub fn max(self, other: Dimensions) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The four cells of a 2×2 block, indexed `row * 2 + col`:
///
/// ```text
/// 0 | 1
/// -----
/// 2 | 3
/// ```
pub type Block = [Pixel; 4];

/// Column and row of a block cell index.
pub(crate) fn block_cell(index: usize) -> (u32, u32) {
    ((index % 2) as u32, (index / 2) as u32)
}

pub(crate) fn block_ink_count(block: &Block) -> usize {
    block.iter().filter(|p| p.is_ink()).count()
}

/// Rectangular grid of two-state cells, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawImage")]
pub struct BinaryImage {
    dims: Dimensions,
    cells: Vec<Pixel>,
}

#[derive(Deserialize)]
struct RawImage {
    dims: Dimensions,
    cells: Vec<Pixel>,
}

impl TryFrom<RawImage> for BinaryImage {
    type Error = VcError;

    fn try_from(raw: RawImage) -> Result<Self, Self::Error> {
        BinaryImage::from_cells(raw.dims, raw.cells)
    }
}

impl BinaryImage {
    /// An image where every cell is clear.
    pub fn blank(width: u32, height: u32) -> Self {
        let dims = Dimensions::new(width, height);
        Self {
            cells: vec![Pixel::Clear; dims.area()],
            dims,
        }
    }

    /// Build an image by evaluating `f(x, y)` for every cell.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        let dims = Dimensions::new(width, height);
        let mut cells = Vec::with_capacity(dims.area());
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { dims, cells }
    }

    /// Wrap a row-major cell buffer.
    pub fn from_cells(dims: Dimensions, cells: Vec<Pixel>) -> Result<Self, VcError> {
        if cells.len() != dims.area() {
            return Err(VcError::CellCount {
                expected: dims.area(),
                found: cells.len(),
            });
        }
        Ok(Self { dims, cells })
    }

    /// Lay out one block per logical pixel (row-major) into an image of
    /// twice the logical size.
    pub(crate) fn from_blocks(logical: Dimensions, blocks: &[Block]) -> Result<Self, VcError> {
        debug_assert_eq!(blocks.len(), logical.area());
        let full = logical.doubled()?;
        let mut image = Self::blank(full.width, full.height);
        for (i, block) in blocks.iter().enumerate() {
            let bx = (i % logical.width as usize) as u32;
            let by = (i / logical.width as usize) as u32;
            image.put_block(bx, by, block);
        }
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.dims.width
    }

    pub fn height(&self) -> u32 {
        self.dims.height
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when the coordinates are outside the image.
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        assert!(
            x < self.dims.width && y < self.dims.height,
            "cell ({x}, {y}) outside {}",
            self.dims
        );
        self.cells[self.index(x, y)]
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[Pixel] {
        &self.cells
    }

    pub fn ink_count(&self) -> usize {
        self.cells.iter().filter(|p| p.is_ink()).count()
    }

    pub fn clear_count(&self) -> usize {
        self.cells.len() - self.ink_count()
    }

    /// The 2×2 block whose top-left cell is `(2 * bx, 2 * by)`.
    pub fn block(&self, bx: u32, by: u32) -> Block {
        let mut block = [Pixel::Clear; 4];
        for (i, cell) in block.iter_mut().enumerate() {
            let (col, row) = block_cell(i);
            *cell = self.get(bx * 2 + col, by * 2 + row);
        }
        block
    }

    fn put_block(&mut self, bx: u32, by: u32, block: &Block) {
        for (i, &cell) in block.iter().enumerate() {
            let (col, row) = block_cell(i);
            let idx = self.index(bx * 2 + col, by * 2 + row);
            self.cells[idx] = cell;
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.dims.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_is_all_clear() {
        let img = BinaryImage::blank(3, 2);
        assert_eq!(img.dimensions(), Dimensions::new(3, 2));
        assert_eq!(img.clear_count(), 6);
        assert_eq!(img.ink_count(), 0);
    }

    #[test]
    fn from_fn_is_row_major() {
        let img = BinaryImage::from_fn(3, 2, |x, y| {
            if x == 2 && y == 0 {
                Pixel::Ink
            } else {
                Pixel::Clear
            }
        });
        assert_eq!(img.cells()[2], Pixel::Ink);
        assert_eq!(img.get(2, 0), Pixel::Ink);
        assert_eq!(img.ink_count(), 1);
    }

    #[test]
    fn from_cells_rejects_wrong_length() {
        let err = BinaryImage::from_cells(Dimensions::new(2, 2), vec![Pixel::Ink; 3])
            .expect_err("short buffer");
        assert!(matches!(err, VcError::CellCount { expected: 4, found: 3 }));
    }

    #[test]
    fn blocks_follow_the_cell_numbering() {
        let blocks = [
            [Pixel::Ink, Pixel::Clear, Pixel::Clear, Pixel::Clear],
            [Pixel::Clear, Pixel::Clear, Pixel::Clear, Pixel::Ink],
        ];
        let img = BinaryImage::from_blocks(Dimensions::new(2, 1), &blocks).expect("layout");
        assert_eq!(img.dimensions(), Dimensions::new(4, 2));
        assert_eq!(img.get(0, 0), Pixel::Ink);
        assert_eq!(img.get(3, 1), Pixel::Ink);
        assert_eq!(img.ink_count(), 2);
        assert_eq!(img.block(0, 0), blocks[0]);
        assert_eq!(img.block(1, 0), blocks[1]);
        assert_eq!(block_ink_count(&img.block(1, 0)), 1);
    }

    #[test]
    fn doubling_stops_at_the_largest_side() {
        let edge = Dimensions::new(MAX_LOGICAL_SIDE, 3);
        assert_eq!(
            edge.doubled().expect("edge"),
            Dimensions::new(u32::MAX - 1, 6)
        );
        let past = Dimensions::new(3, MAX_LOGICAL_SIDE + 1);
        assert!(matches!(past.doubled(), Err(VcError::TooLarge(d)) if d == past));
        assert!(matches!(
            BinaryImage::from_blocks(Dimensions::new(1 << 31, 0), &[]),
            Err(VcError::TooLarge(_))
        ));
    }

    #[test]
    fn union_only_clear_on_clear() {
        assert_eq!(Pixel::Clear.union(Pixel::Clear), Pixel::Clear);
        assert_eq!(Pixel::Clear.union(Pixel::Ink), Pixel::Ink);
        assert_eq!(Pixel::Ink.union(Pixel::Clear), Pixel::Ink);
        assert_eq!(Pixel::Ink.inverted(), Pixel::Clear);
    }

    #[test]
    fn serde_keeps_dimensions_and_cells() {
        let img = BinaryImage::from_fn(2, 1, |x, _| if x == 0 { Pixel::Ink } else { Pixel::Clear });
        let json = serde_json::to_string(&img).expect("serialize");
        assert!(json.contains("\"ink\""));
        let back: BinaryImage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, img);

        let truncated = r#"{"dims":{"width":2,"height":2},"cells":["ink"]}"#;
        assert!(serde_json::from_str::<BinaryImage>(truncated).is_err());
    }
}
