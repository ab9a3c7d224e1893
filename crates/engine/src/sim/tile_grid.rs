use crate::config::ConfigError;

pub const EMPTY_SYMBOL: char = '.';
/// Returned for any lookup outside the grid. Classified as non-blocking.
pub const OUT_OF_BOUNDS_SYMBOL: char = '?';
/// Platform top, platform body, platform bottom, ground and the four numbered special tiles.
pub const SOLID_SYMBOLS: [char; 8] = ['t', 'p', 'b', 'g', '1', '2', '3', '4'];

pub fn is_solid_symbol(symbol: char) -> bool {
    SOLID_SYMBOLS.contains(&symbol)
}

/// Grid convention:
/// - cell (0,0) is the top-left tile; rows grow downward like screen space.
/// - the pixel rectangle of cell (c,r) starts at `(c * tile_width, r * tile_height)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
    cells: Vec<char>,
}

impl TileGrid {
    pub fn from_rows<S: AsRef<str>>(
        rows: &[S],
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self, ConfigError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(ConfigError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        let Some(first) = rows.first() else {
            return Err(ConfigError::EmptyMap);
        };
        let expected = first.as_ref().chars().count();
        if expected == 0 {
            return Err(ConfigError::EmptyMap);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let before = cells.len();
            cells.extend(line.as_ref().chars());
            let actual = cells.len() - before;
            if actual != expected {
                return Err(ConfigError::RaggedRow {
                    row,
                    expected,
                    actual,
                });
            }
        }

        Ok(Self {
            columns: expected as u32,
            rows: rows.len() as u32,
            tile_width,
            tile_height,
            cells,
        })
    }

    /// Parses a map text resource: one row per line, trailing blank lines ignored.
    pub fn from_source(text: &str, tile_width: u32, tile_height: u32) -> Result<Self, ConfigError> {
        let mut rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        while rows.last().is_some_and(|line| line.is_empty()) {
            rows.pop();
        }
        Self::from_rows(&rows, tile_width, tile_height)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn pixel_width(&self) -> u32 {
        self.columns * self.tile_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.rows * self.tile_height
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        self.index_of(column, row).is_some()
    }

    fn index_of(&self, column: i32, row: i32) -> Option<usize> {
        if column < 0 || row < 0 || column as u32 >= self.columns || row as u32 >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    pub fn symbol_at(&self, column: i32, row: i32) -> char {
        self.index_of(column, row)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(OUT_OF_BOUNDS_SYMBOL)
    }

    /// Overwrites one cell. Writes outside the grid are dropped and reported as `false`.
    pub fn set_symbol(&mut self, symbol: char, column: i32, row: i32) -> bool {
        match self.index_of(column, row) {
            Some(index) => {
                self.cells[index] = symbol;
                true
            }
            None => false,
        }
    }
}
