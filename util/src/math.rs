/// Adds `n2` to a cell value with 8-bit wrap-around, for counts that may be
/// larger than a `u8`.
pub fn unbalanced_wrapping_add(n1: u8, n2: usize) -> u8 {
    // Whole multiples of 256 leave the cell unchanged.
    n1.wrapping_add((n2 % 256) as u8)
}

/// Subtracts `n2` from a cell value with 8-bit wrap-around.
pub fn unbalanced_wrapping_sub(n1: u8, n2: usize) -> u8 {
    n1.wrapping_sub((n2 % 256) as u8)
}
