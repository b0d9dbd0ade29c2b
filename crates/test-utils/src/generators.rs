//! Synthetic archive data with predictable values.

/// Half-hour value of cell (column, row) in [`create_test_archive`].
pub fn test_cell_value(column: usize, row: usize) -> f32 {
    (column * 10 + row) as f32 * 0.25
}

/// Creates `[time, row, column]` data where every half hour of a cell holds
/// [`test_cell_value`], so each hourly sum is twice that.
///
/// # Example
///
/// ```
/// use test_utils::create_test_archive;
///
/// let data = create_test_archive(2, 2, 3);
/// assert_eq!(data.len(), 12);
/// assert_eq!(data[1], 2.5);  // t=0, row=0, col=1
/// assert_eq!(data[3], 0.25); // t=0, row=1, col=0
/// assert_eq!(data[7], 2.5);  // t=1, row=0, col=1
/// ```
pub fn create_test_archive(time: usize, rows: usize, columns: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(time * rows * columns);
    for _ in 0..time {
        for row in 0..rows {
            for col in 0..columns {
                data.push(test_cell_value(col, row));
            }
        }
    }
    data
}

/// Index into data produced by [`create_test_archive`].
pub fn archive_offset(t: usize, row: usize, column: usize, rows: usize, columns: usize) -> usize {
    (t * rows + row) * columns + column
}
