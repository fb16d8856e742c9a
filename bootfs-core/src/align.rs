use crate::Error;

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. Zero stays zero.
pub fn align_up(value: u64, alignment: u64) -> Result<u64, Error> {
    if !alignment.is_power_of_two() {
        return Err(Error::InvalidAlignment(alignment));
    }
    let mask = alignment - 1;
    value
        .checked_add(mask)
        .map(|v| v & !mask)
        .ok_or(Error::Overflow)
}
