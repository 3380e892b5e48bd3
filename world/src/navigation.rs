//! Breadth-first searches over the tile grid.

use std::collections::VecDeque;

use crate::TileCell;

/// Finds the walkable cell closest to `origin` in breadth-first order.
///
/// The search expands through every cell regardless of walkability so that
/// islands separated by walls or water are still reachable, and visits
/// neighbours in a fixed order so ties resolve deterministically.
pub(crate) fn nearest_matching<F>(
    columns: u32,
    rows: u32,
    origin: TileCell,
    mut is_walkable: F,
) -> Option<TileCell>
where
    F: FnMut(TileCell) -> bool,
{
    let width = usize::try_from(columns).ok()?;
    let height = usize::try_from(rows).ok()?;
    let cell_count = width.checked_mul(height)?;
    if cell_count == 0 {
        return None;
    }

    let origin = TileCell::new(
        origin.column().min(columns - 1),
        origin.row().min(rows - 1),
    );

    let mut visited = vec![false; cell_count];
    let mut queue = VecDeque::new();
    visited[index(width, origin)?] = true;
    queue.push_back(origin);

    while let Some(cell) = queue.pop_front() {
        if is_walkable(cell) {
            return Some(cell);
        }

        for neighbor in neighbors(cell, columns, rows) {
            let Some(offset) = index(width, neighbor) else {
                continue;
            };
            if visited[offset] {
                continue;
            }
            visited[offset] = true;
            queue.push_back(neighbor);
        }
    }

    None
}

fn neighbors(cell: TileCell, columns: u32, rows: u32) -> impl Iterator<Item = TileCell> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(TileCell::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < columns {
            candidates[count] = Some(TileCell::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < rows {
            candidates[count] = Some(TileCell::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(TileCell::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: TileCell) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_returned_when_walkable() {
        let found = nearest_matching(4, 4, TileCell::new(2, 1), |_| true);
        assert_eq!(found, Some(TileCell::new(2, 1)));
    }

    #[test]
    fn search_crosses_blocked_cells() {
        let target = TileCell::new(3, 3);
        let found = nearest_matching(4, 4, TileCell::new(0, 0), |cell| cell == target);
        assert_eq!(found, Some(target));
    }

    #[test]
    fn out_of_range_origin_is_clamped() {
        let found = nearest_matching(3, 2, TileCell::new(99, 99), |_| true);
        assert_eq!(found, Some(TileCell::new(2, 1)));
    }

    #[test]
    fn fully_blocked_grid_has_no_result() {
        assert_eq!(nearest_matching(3, 3, TileCell::new(1, 1), |_| false), None);
        assert_eq!(nearest_matching(0, 3, TileCell::new(0, 0), |_| true), None);
    }
}
