/// Linearly remap `value` from `[in_min, in_max]` into `[out_min, out_max]`.
///
/// Integer arithmetic, truncating toward zero, no clamping: values outside the
/// input range extrapolate. A zero-width input range yields `out_min`.
pub fn scale(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let in_span = i64::from(in_max) - i64::from(in_min);
    if in_span == 0 {
        return out_min;
    }
    let out_span = i64::from(out_max) - i64::from(out_min);
    let offset = i64::from(value) - i64::from(in_min);
    let scaled = offset * out_span / in_span + i64::from(out_min);
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
