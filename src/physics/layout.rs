//! ASCII tile layouts
//!
//! Levels are written top row first:
//!
//! ```text
//! #########
//! #...T...#
//! #S..#..G#
//! #########
//! ```
//!
//! `#` is solid, `.` or space is empty, `T` is a trigger volume, `S` and `G`
//! mark the start and goal tiles (both empty). Tile (0, 0) is bottom-left.

use glam::Vec2;

use super::{LayerMask, StaticGeometry};

/// One tile of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    /// Nothing
    Empty,
    /// Solid geometry
    Solid,
    /// Non-solid trigger volume
    Trigger,
}

/// Parsed tile grid
#[derive(Debug, Clone)]
pub struct TileLayout {
    width: usize,
    height: usize,
    /// Row-major, row 0 at the bottom
    tiles: Vec<Tile>,
    start: Option<(usize, usize)>,
    goal: Option<(usize, usize)>,
}

impl TileLayout {
    /// Parse a layout from text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty, rows differ in length, or a
    /// glyph is not recognised
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };

        let width = first.chars().count();
        let height = rows.len();
        let mut tiles = vec![Tile::Empty; width * height];
        let mut start = None;
        let mut goal = None;

        for (row_index, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(LayoutError::RaggedRow {
                    row: row_index,
                    expected: width,
                    found: len,
                });
            }

            let y = height - 1 - row_index;
            for (x, glyph) in row.chars().enumerate() {
                let tile = match glyph {
                    '#' => Tile::Solid,
                    '.' | ' ' => Tile::Empty,
                    'T' => Tile::Trigger,
                    'S' => {
                        start = Some((x, y));
                        Tile::Empty
                    }
                    'G' => {
                        goal = Some((x, y));
                        Tile::Empty
                    }
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            x,
                            y,
                        });
                    }
                };
                tiles[y * width + x] = tile;
            }
        }

        Ok(Self {
            width,
            height,
            tiles,
            start,
            goal,
        })
    }

    /// Width in tiles
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at (x, y), `None` outside the layout
    #[must_use]
    pub fn tile(&self, x: usize, y: usize) -> Option<Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.tiles[y * self.width + x])
    }

    /// Tile marked `S`
    #[must_use]
    pub fn start(&self) -> Option<(usize, usize)> {
        self.start
    }

    /// Tile marked `G`
    #[must_use]
    pub fn goal(&self) -> Option<(usize, usize)> {
        self.goal
    }

    /// Size in world units for a given tile size
    #[must_use]
    pub fn world_size(&self, tile_size: f32) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * tile_size
    }

    /// World-space center of a tile, with the layout's bottom-left corner at `origin`
    #[must_use]
    pub fn tile_center(&self, x: usize, y: usize, origin: Vec2, tile_size: f32) -> Vec2 {
        origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * tile_size
    }

    /// Add one box per solid or trigger tile to `world`
    ///
    /// Returns the number of boxes added.
    pub fn populate<W: StaticGeometry + ?Sized>(
        &self,
        world: &mut W,
        origin: Vec2,
        tile_size: f32,
        layer: LayerMask,
    ) -> usize {
        let half = Vec2::splat(tile_size * 0.5);
        let mut added = 0;

        for y in 0..self.height {
            for x in 0..self.width {
                let center = self.tile_center(x, y, origin, tile_size);
                match self.tiles[y * self.width + x] {
                    Tile::Solid => world.add_solid(center, half, layer),
                    Tile::Trigger => world.add_trigger(center, half, layer),
                    Tile::Empty => continue,
                }
                added += 1;
            }
        }

        log::debug!(
            "Populated {} colliders from {}x{} layout",
            added,
            self.width,
            self.height
        );
        added
    }
}

/// Errors that can occur while parsing a layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// No rows
    Empty,
    /// A row has a different length from the first one
    RaggedRow {
        /// Row index counted from the top
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        found: usize,
    },
    /// Unrecognised character
    UnknownGlyph {
        /// The character
        glyph: char,
        /// Tile column
        x: usize,
        /// Tile row counted from the bottom
        y: usize,
    },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "layout has no rows"),
            Self::RaggedRow {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} tiles, expected {expected}"),
            Self::UnknownGlyph { glyph, x, y } => {
                write!(f, "unknown tile '{glyph}' at ({x}, {y})")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BoxWorld, CollisionQuery};

    const LEVEL: &str = "
#####
#S.G#
#.T.#
#####
";

    #[test]
    fn test_parse_layout() {
        let layout = TileLayout::parse(LEVEL).unwrap();

        assert_eq!(layout.width(), 5);
        assert_eq!(layout.height(), 4);
        assert_eq!(layout.start(), Some((1, 2)));
        assert_eq!(layout.goal(), Some((3, 2)));
        assert_eq!(layout.tile(0, 0), Some(Tile::Solid));
        assert_eq!(layout.tile(2, 1), Some(Tile::Trigger));
        assert_eq!(layout.tile(5, 0), None);
    }

    #[test]
    fn test_populate_world() {
        let layout = TileLayout::parse(LEVEL).unwrap();
        let mut world = BoxWorld::new();

        let added = layout.populate(&mut world, Vec2::ZERO, 1.0, LayerMask::GROUND);

        // 14 border tiles and one trigger
        assert_eq!(added, 15);
        assert!(world.overlap_box(Vec2::new(0.5, 0.5), Vec2::splat(0.2), LayerMask::GROUND));
        assert!(!world.overlap_box(Vec2::new(1.5, 2.5), Vec2::splat(0.2), LayerMask::GROUND));
    }

    #[test]
    fn test_layout_errors() {
        assert_eq!(TileLayout::parse("\n\n").unwrap_err(), LayoutError::Empty);
        assert!(matches!(
            TileLayout::parse("###\n##\n"),
            Err(LayoutError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(
            TileLayout::parse("#x#"),
            Err(LayoutError::UnknownGlyph { glyph: 'x', .. })
        ));
    }
}
