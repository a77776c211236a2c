//! Maze text format and the live cell grid.
//!
//! A maze is a rectangle of single-character cells:
//!
//! ```text
//! #   wall          .   pill           %   fruit location
//! (space) empty     o   power pill     \   lambda-man start
//!                                      =   ghost start
//! ```
//!
//! Rows must all be the same width and the maze must contain exactly one
//! lambda-man start. The numeric cell codes are part of the agent protocol:
//! agents receive the map as lists of these codes every move.

use std::fmt;

/// One maze square. The discriminants are the codes agents see.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    Wall = 0,
    Empty = 1,
    Pill = 2,
    PowerPill = 3,
    Fruit = 4,
    LambdaStart = 5,
    GhostStart = 6,
}

impl Cell {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Cell::Wall),
            ' ' => Some(Cell::Empty),
            '.' => Some(Cell::Pill),
            'o' => Some(Cell::PowerPill),
            '%' => Some(Cell::Fruit),
            '\\' => Some(Cell::LambdaStart),
            '=' => Some(Cell::GhostStart),
            _ => None,
        }
    }

    /// Protocol code for this cell.
    #[inline]
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether agents may stand on this cell.
    #[inline]
    #[must_use]
    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall)
    }
}

/// A compass heading. The discriminants are the codes agents exchange;
/// the variant order is also the tie-break order when a ghost's requested
/// move is illegal.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// All headings in tie-break order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Protocol code for this heading.
    #[inline]
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decodes an agent verdict. Out-of-range codes yield `None`.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            _ => None,
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }
}

/// A grid coordinate. `x` grows rightward, `y` grows downward, both
/// zero-based from the top-left corner.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    /// The adjacent coordinate in `dir`, or `None` at the grid edge.
    #[must_use]
    pub fn step(self, dir: Direction) -> Option<Self> {
        let Pos { x, y } = self;
        match dir {
            Direction::Up => y.checked_sub(1).map(|y| Pos { x, y }),
            Direction::Right => Some(Pos { x: x + 1, y }),
            Direction::Down => Some(Pos { x, y: y + 1 }),
            Direction::Left => x.checked_sub(1).map(|x| Pos { x, y }),
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A maze text that could not be parsed. Lines and columns are 1-based.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum MapError {
    UnknownCell { ch: char, line: usize, column: usize },
    RaggedRow { line: usize, width: usize, expected: usize },
    NoLambdaStart,
    DuplicateLambdaStart { line: usize, column: usize },
    EmptyMap,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::UnknownCell { ch, line, column } => {
                write!(f, "unknown map character {ch:?} at line {line}, column {column}")
            }
            MapError::RaggedRow { line, width, expected } => {
                write!(f, "row at line {line} is {width} cells wide, expected {expected}")
            }
            MapError::NoLambdaStart => write!(f, "map has no lambda-man start (`\\`)"),
            MapError::DuplicateLambdaStart { line, column } => {
                write!(f, "second lambda-man start at line {line}, column {column}")
            }
            MapError::EmptyMap => write!(f, "map has no rows"),
        }
    }
}

impl std::error::Error for MapError {}

/// The parsed maze. Also serves as the live grid during a game: eaten
/// pills are overwritten with [`Cell::Empty`] in place.
#[derive(Clone, Debug)]
pub struct Maze {
    cells: Vec<Vec<Cell>>,
    width: usize,
    lambda_start: Pos,
    ghost_starts: Vec<Pos>,
    fruit_cell: Option<Pos>,
    pill_count: usize,
}

impl Maze {
    /// Parses a maze from its text form. Trailing blank lines are
    /// ignored; everything else must be a rectangle of known cells.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(MapError::EmptyMap);
        }

        let width = lines[0].chars().count();
        let mut cells = Vec::with_capacity(lines.len());
        let mut lambda_start = None;
        let mut ghost_starts = Vec::new();
        let mut fruit_cell = None;
        let mut pill_count = 0;

        for (y, line) in lines.iter().enumerate() {
            let mut row = Vec::with_capacity(width);
            for (x, ch) in line.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or(MapError::UnknownCell {
                    ch,
                    line: y + 1,
                    column: x + 1,
                })?;
                match cell {
                    Cell::Pill => pill_count += 1,
                    Cell::Fruit => fruit_cell = Some(Pos { x, y }),
                    Cell::LambdaStart => {
                        if lambda_start.is_some() {
                            return Err(MapError::DuplicateLambdaStart {
                                line: y + 1,
                                column: x + 1,
                            });
                        }
                        lambda_start = Some(Pos { x, y });
                    }
                    Cell::GhostStart => ghost_starts.push(Pos { x, y }),
                    Cell::Wall | Cell::Empty | Cell::PowerPill => {}
                }
                row.push(cell);
            }
            if row.len() != width {
                return Err(MapError::RaggedRow {
                    line: y + 1,
                    width: row.len(),
                    expected: width,
                });
            }
            cells.push(row);
        }

        let lambda_start = lambda_start.ok_or(MapError::NoLambdaStart)?;
        Ok(Maze {
            cells,
            width,
            lambda_start,
            ghost_starts,
            fruit_cell,
            pill_count,
        })
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.cells.len()
    }

    /// Total squares, walls included.
    #[inline]
    #[must_use]
    pub fn area(&self) -> usize {
        self.width * self.height()
    }

    /// The cell at `pos`. Coordinates outside the grid read as walls, so
    /// movement code can look up neighbours without bounds bookkeeping.
    #[must_use]
    pub fn at(&self, pos: Pos) -> Cell {
        self.cells
            .get(pos.y)
            .and_then(|row| row.get(pos.x))
            .copied()
            .unwrap_or(Cell::Wall)
    }

    /// Overwrites the cell at `pos`. Out-of-range positions are ignored.
    pub fn set(&mut self, pos: Pos, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(pos.y).and_then(|row| row.get_mut(pos.x)) {
            *slot = cell;
        }
    }

    #[inline]
    #[must_use]
    pub fn lambda_start(&self) -> Pos {
        self.lambda_start
    }

    #[inline]
    #[must_use]
    pub fn ghost_starts(&self) -> &[Pos] {
        &self.ghost_starts
    }

    #[inline]
    #[must_use]
    pub fn fruit_cell(&self) -> Option<Pos> {
        self.fruit_cell
    }

    /// Ordinary pills present at parse time.
    #[inline]
    #[must_use]
    pub fn pill_count(&self) -> usize {
        self.pill_count
    }
}
