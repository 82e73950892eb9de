//! Board geometry for the 10×10 zig-zag board.
//!
//! Row 0 is the bottom row. Even rows (0, 2, ...) run left-to-right and odd
//! rows run right-to-left, so cell 1 is bottom-left, cell 10 bottom-right,
//! cell 11 sits directly above 10 and cell 100 is top-left.

pub const BOARD_SIZE: u8 = 10;
pub const FIRST_CELL: u8 = 1;
pub const FINAL_CELL: u8 = BOARD_SIZE * BOARD_SIZE;

fn left_to_right(row: u8) -> bool {
    row % 2 == 0
}

/// Cell number at `(row, col)`; `None` outside the grid.
pub fn cell_at(row: u8, col: u8) -> Option<u8> {
    if row >= BOARD_SIZE || col >= BOARD_SIZE {
        return None;
    }
    let base = row * BOARD_SIZE;
    Some(if left_to_right(row) {
        base + col + 1
    } else {
        base + (BOARD_SIZE - col)
    })
}

/// Inverse of [`cell_at`]: `(row, col)` for a cell in `1..=100`.
pub fn position_of(cell: u8) -> Option<(u8, u8)> {
    if !(FIRST_CELL..=FINAL_CELL).contains(&cell) {
        return None;
    }
    let idx = cell - 1;
    let row = idx / BOARD_SIZE;
    let offset = idx % BOARD_SIZE;
    let col = if left_to_right(row) {
        offset
    } else {
        BOARD_SIZE - 1 - offset
    };
    Some((row, col))
}

/// Text rendering of the board, top row first.
///
/// The token's cell is bracketed (`[ 42]`) and annotated cells carry a
/// trailing `*`.
pub fn render_board<F>(token: u8, annotated: F) -> String
where
    F: Fn(u8) -> bool,
{
    let mut out = String::with_capacity(BOARD_SIZE as usize * (BOARD_SIZE as usize * 6 + 1));
    for row in (0..BOARD_SIZE).rev() {
        for col in 0..BOARD_SIZE {
            // cell_at is total on the grid
            let Some(cell) = cell_at(row, col) else { continue };
            let (l, r) = if cell == token { ('[', ']') } else { (' ', ' ') };
            let mark = if annotated(cell) { '*' } else { ' ' };
            out.push(l);
            out.push_str(&format!("{:>3}", cell));
            out.push(r);
            out.push(mark);
        }
        // Drop trailing padding
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn corners() {
        assert_eq!(position_of(1), Some((0, 0)));
        assert_eq!(position_of(10), Some((0, 9)));
        assert_eq!(position_of(11), Some((1, 9)));
        assert_eq!(position_of(20), Some((1, 0)));
        assert_eq!(position_of(100), Some((9, 0)));
        assert_eq!(position_of(91), Some((9, 9)));
    }

    #[test]
    fn out_of_range() {
        assert_eq!(position_of(0), None);
        assert_eq!(position_of(101), None);
        assert_eq!(cell_at(10, 0), None);
        assert_eq!(cell_at(0, 10), None);
    }

    #[test]
    fn geometry_is_a_bijection() {
        let mut seen = HashSet::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let cell = cell_at(row, col).unwrap();
                assert!((1..=100).contains(&cell));
                assert!(seen.insert(cell), "cell {} produced twice", cell);
                assert_eq!(position_of(cell), Some((row, col)));
            }
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn render_marks_token_and_comments() {
        let text = render_board(11, |c| c == 42);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        // Top row starts with 100 (right-to-left row 9)
        assert!(lines[0].trim_start().starts_with("100"));
        // Bottom row starts with 1
        assert!(lines[9].trim_start().starts_with('1'));
        assert!(lines[8].contains("[ 11]"));
        assert!(lines[5].contains(" 42 *"));
        // Row 1 runs right-to-left, so 11 is the last cell of the line
        assert!(lines[8].trim_end().ends_with("[ 11]"));
    }
}
