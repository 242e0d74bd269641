//! Array extents and axis naming.
//!
//! A [`Shape`] is the four extents `(width, height, depth, channels)` of a
//! [`DenseArray`](crate::DenseArray). Storage is planar: every value of
//! channel 0 comes first, then channel 1, and so on. Inside a channel plane
//! values are stored in x-fastest raster order:
//!
//! ```text
//! offset(x, y, z, c) = x + W * (y + H * (z + D * c))
//! ```
//!
//! A shape with any zero extent is normalised to the all-zero *empty* shape.
//!
//! # Example
//!
//! ```rust
//! use lattice_core::Shape;
//!
//! let s = Shape::new(4, 3, 2, 3);
//! assert_eq!(s.len(), 72);
//! assert_eq!(s.plane_len(), 24);
//! assert_eq!(s.offset(1, 2, 1, 2), 1 + 4 * (2 + 3 * (1 + 2 * 2)));
//! assert!(Shape::new(4, 0, 1, 1).is_empty());
//! ```

use std::fmt;

/// One of the four array axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Columns.
    X,
    /// Rows.
    Y,
    /// Slices.
    Z,
    /// Channels.
    C,
}

impl Axis {
    /// The three spatial axes.
    pub const SPATIAL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Parses an axis from its letter (`x`, `y`, `z` or `c`, any case).
    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            'c' => Some(Self::C),
            _ => None,
        }
    }

    /// Index of the axis in `[x, y, z, c]` order.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::C => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::C => "c",
        };
        f.write_str(s)
    }
}

/// Extents of a four-dimensional array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    /// Extent along x.
    pub width: usize,
    /// Extent along y.
    pub height: usize,
    /// Extent along z.
    pub depth: usize,
    /// Number of channels.
    pub channels: usize,
}

impl Shape {
    /// The empty shape.
    pub const EMPTY: Self = Self {
        width: 0,
        height: 0,
        depth: 0,
        channels: 0,
    };

    /// Creates a shape; any zero extent yields [`Shape::EMPTY`].
    #[inline]
    pub const fn new(width: usize, height: usize, depth: usize, channels: usize) -> Self {
        if width == 0 || height == 0 || depth == 0 || channels == 0 {
            Self::EMPTY
        } else {
            Self {
                width,
                height,
                depth,
                channels,
            }
        }
    }

    /// Creates a 2D single-channel shape, the usual shape of a matrix
    /// (`width` columns, `height` rows).
    #[inline]
    pub const fn matrix(cols: usize, rows: usize) -> Self {
        Self::new(cols, rows, 1, 1)
    }

    /// Returns `true` if the shape holds no value.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of values.
    #[inline]
    pub const fn len(&self) -> usize {
        self.width * self.height * self.depth * self.channels
    }

    /// Number of values in one channel plane.
    #[inline]
    pub const fn plane_len(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Extents as `[width, height, depth, channels]`.
    #[inline]
    pub const fn dims(&self) -> [usize; 4] {
        [self.width, self.height, self.depth, self.channels]
    }

    /// Extent along `axis`.
    #[inline]
    pub const fn extent(&self, axis: Axis) -> usize {
        self.dims()[axis.index()]
    }

    /// Distance in the buffer between two neighbours along `axis`.
    #[inline]
    pub const fn stride(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => 1,
            Axis::Y => self.width,
            Axis::Z => self.width * self.height,
            Axis::C => self.width * self.height * self.depth,
        }
    }

    /// Returns `true` if the spatial extents equal those of `other`.
    #[inline]
    pub const fn same_xyz(&self, other: &Shape) -> bool {
        self.width == other.width && self.height == other.height && self.depth == other.depth
    }

    /// Returns `true` for a volume (depth greater than one).
    #[inline]
    pub const fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Same spatial extents with a different channel count.
    #[inline]
    pub const fn with_channels(&self, channels: usize) -> Self {
        Self::new(self.width, self.height, self.depth, channels)
    }

    /// Buffer offset of `(x, y, z, c)`. Not bounds-checked.
    #[inline]
    pub const fn offset(&self, x: usize, y: usize, z: usize, c: usize) -> usize {
        x + self.width * (y + self.height * (z + self.depth * c))
    }

    /// Returns `true` if `(x, y, z, c)` lies inside the shape.
    #[inline]
    pub const fn contains(&self, x: usize, y: usize, z: usize, c: usize) -> bool {
        x < self.width && y < self.height && z < self.depth && c < self.channels
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}x{}",
            self.width, self.height, self.depth, self.channels
        )
    }
}
