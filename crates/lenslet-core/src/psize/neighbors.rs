use crate::geometry::{Arrange, Point};

const X_STEP: f32 = 0.5;
const Y_STEP: f32 = 0.866_025_4; // sqrt(3)/2

/// The six hex-adjacent neighbor directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NearDir {
    Left,
    UpLeft,
    UpRight,
    Right,
    DownRight,
    DownLeft,
}

impl NearDir {
    pub const ALL: [NearDir; 6] = [
        NearDir::Left,
        NearDir::UpLeft,
        NearDir::UpRight,
        NearDir::Right,
        NearDir::DownRight,
        NearDir::DownLeft,
    ];

    /// Unit vector pointing from an MI to its neighbor in this direction.
    pub fn unit_shift(self) -> Point {
        match self {
            NearDir::Left => Point::new(-1.0, 0.0),
            NearDir::UpLeft => Point::new(-X_STEP, -Y_STEP),
            NearDir::UpRight => Point::new(X_STEP, -Y_STEP),
            NearDir::Right => Point::new(1.0, 0.0),
            NearDir::DownRight => Point::new(X_STEP, Y_STEP),
            NearDir::DownLeft => Point::new(-X_STEP, Y_STEP),
        }
    }
}

/// The six second-ring directions (one lattice step further out, rotated
/// 30 degrees from the near set).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FarDir {
    Up,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Down,
}

impl FarDir {
    pub const ALL: [FarDir; 6] = [
        FarDir::Up,
        FarDir::UpLeft,
        FarDir::UpRight,
        FarDir::DownLeft,
        FarDir::DownRight,
        FarDir::Down,
    ];

    pub fn unit_shift(self) -> Point {
        match self {
            FarDir::Up => Point::new(0.0, -1.0),
            FarDir::UpLeft => Point::new(-Y_STEP, -X_STEP),
            FarDir::UpRight => Point::new(Y_STEP, -X_STEP),
            FarDir::DownLeft => Point::new(-Y_STEP, X_STEP),
            FarDir::DownRight => Point::new(Y_STEP, X_STEP),
            FarDir::Down => Point::new(0.0, 1.0),
        }
    }
}

/// Lattice indices of the up-to-six near neighbors of one MI. Missing
/// entries are boundary MIs.
#[derive(Clone, Copy, Debug)]
pub struct NearNeighbors {
    indices: [Option<(usize, usize)>; 6],
}

impl NearNeighbors {
    pub fn new(arrange: &Arrange, row: usize, col: usize) -> Self {
        let mut indices = [None; 6];
        let cols = arrange.mi_cols(row);

        if col > 0 {
            indices[NearDir::Left as usize] = Some((row, col - 1));
        }
        if col + 1 < cols {
            indices[NearDir::Right as usize] = Some((row, col + 1));
        }

        // Whether this row sits on the left side of its up/down rows.
        let is_left_row = (arrange.is_out_shift() as usize) ^ ((row % 2 == 0) as usize);
        let ud_left_x = col as isize - is_left_row as isize;
        let ud_right_x = ud_left_x + 1;

        if row > 0 {
            let up = row - 1;
            if ud_left_x >= 0 {
                indices[NearDir::UpLeft as usize] = Some((up, ud_left_x as usize));
            }
            if ud_right_x >= 0 && (ud_right_x as usize) < arrange.mi_cols(up) {
                indices[NearDir::UpRight as usize] = Some((up, ud_right_x as usize));
            }
        }

        if row + 1 < arrange.mi_rows() {
            let down = row + 1;
            if ud_left_x >= 0 {
                indices[NearDir::DownLeft as usize] = Some((down, ud_left_x as usize));
            }
            if ud_right_x >= 0 && (ud_right_x as usize) < arrange.mi_cols(down) {
                indices[NearDir::DownRight as usize] = Some((down, ud_right_x as usize));
            }
        }

        Self { indices }
    }

    pub fn get(&self, dir: NearDir) -> Option<(usize, usize)> {
        self.indices[dir as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NearDir, (usize, usize))> + '_ {
        NearDir::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|idx| (d, idx)))
    }
}

/// Lattice indices of the up-to-six far neighbors of one MI: the MIs two
/// rows straight up/down plus the four offset diagonals one row away.
#[derive(Clone, Copy, Debug)]
pub struct FarNeighbors {
    indices: [Option<(usize, usize)>; 6],
}

impl FarNeighbors {
    pub fn new(arrange: &Arrange, row: usize, col: usize) -> Self {
        let mut indices = [None; 6];

        let is_left_row = (arrange.is_out_shift() as usize) ^ ((row % 2 == 0) as usize);
        let ud_left_x = col as isize - is_left_row as isize - 1;
        let ud_right_x = ud_left_x + 3;

        if row > 0 {
            let up = row - 1;
            if ud_left_x >= 0 {
                indices[FarDir::UpLeft as usize] = Some((up, ud_left_x as usize));
            }
            if ud_right_x >= 0 && (ud_right_x as usize) < arrange.mi_cols(up) {
                indices[FarDir::UpRight as usize] = Some((up, ud_right_x as usize));
            }
            if row > 1 && col < arrange.mi_cols(row - 2) {
                indices[FarDir::Up as usize] = Some((row - 2, col));
            }
        }

        if row + 1 < arrange.mi_rows() {
            let down = row + 1;
            if ud_left_x >= 0 {
                indices[FarDir::DownLeft as usize] = Some((down, ud_left_x as usize));
            }
            if ud_right_x >= 0 && (ud_right_x as usize) < arrange.mi_cols(down) {
                indices[FarDir::DownRight as usize] = Some((down, ud_right_x as usize));
            }
            if row + 2 < arrange.mi_rows() && col < arrange.mi_cols(row + 2) {
                indices[FarDir::Down as usize] = Some((row + 2, col));
            }
        }

        Self { indices }
    }

    pub fn get(&self, dir: FarDir) -> Option<(usize, usize)> {
        self.indices[dir as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FarDir, (usize, usize))> + '_ {
        FarDir::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|idx| (d, idx)))
    }
}
