use std::ops::Range;

use mip_core::{Bitmap, BitmapView, Error};

use crate::config::OddEdge;

/// Dimensions of the level below `(width, height)`: each axis halves with
/// floor division and never drops below 1.
#[inline]
pub fn next_level_dims(width: usize, height: usize) -> (usize, usize) {
    ((width / 2).max(1), (height / 2).max(1))
}

/// Buffer size in bytes of the level below a `width x height` level.
pub fn next_level_size(width: usize, height: usize, bytes_per_pixel: usize) -> usize {
    let (w, h) = next_level_dims(width, height);
    w * h * bytes_per_pixel
}

/// Produces the next mip level of `src` with a 2x2 box filter.
///
/// Every channel is averaged independently and rounded to nearest with ties
/// going up.
pub fn downsample2x2_box(src: &BitmapView<'_>, odd_edge: OddEdge) -> Result<Bitmap, Error> {
    let (dst_w, dst_h) = next_level_dims(src.width(), src.height());
    let mut dst = Bitmap::try_zeroed(dst_w, dst_h, src.bytes_per_pixel())?;
    downsample2x2_box_into(src, &mut dst, odd_edge);
    Ok(dst)
}

pub(crate) fn downsample2x2_box_into(src: &BitmapView<'_>, dst: &mut Bitmap, odd_edge: OddEdge) {
    let (dst_w, dst_h) = next_level_dims(src.width(), src.height());
    debug_assert_eq!(dst.width(), dst_w);
    debug_assert_eq!(dst.height(), dst_h);
    debug_assert_eq!(dst.bytes_per_pixel(), src.bytes_per_pixel());

    let even = src.width().is_multiple_of(2) && src.height().is_multiple_of(2);
    if src.width() >= 2 && src.height() >= 2 && (even || odd_edge == OddEdge::Drop) {
        downsample_blocks(
            src.pixels(),
            src.row_bytes(),
            dst.pixels_mut(),
            dst_w,
            src.bytes_per_pixel(),
        );
        return;
    }

    downsample_spans(src, dst.pixels_mut(), dst_w, dst_h, odd_edge);
}

/// Full 2x2 blocks only. Any odd trailing column/row is never touched.
fn downsample_blocks(src: &[u8], src_row_bytes: usize, dst: &mut [u8], dst_w: usize, bpp: usize) {
    let dst_row_bytes = dst_w * bpp;
    for (y, dst_row) in dst.chunks_exact_mut(dst_row_bytes).enumerate() {
        let row0 = &src[(2 * y) * src_row_bytes..][..src_row_bytes];
        let row1 = &src[(2 * y + 1) * src_row_bytes..][..src_row_bytes];
        for (x, out_px) in dst_row.chunks_exact_mut(bpp).enumerate() {
            let s0 = 2 * x * bpp;
            let s1 = s0 + bpp;
            for (c, out) in out_px.iter_mut().enumerate() {
                let sum = (row0[s0 + c] as u32)
                    + (row0[s1 + c] as u32)
                    + (row1[s0 + c] as u32)
                    + (row1[s1 + c] as u32);
                *out = ((sum + 2) / 4) as u8;
            }
        }
    }
}

/// Source pixels along one axis that feed output index `i`.
#[inline]
fn span(i: usize, src_len: usize, dst_len: usize, odd_edge: OddEdge) -> Range<usize> {
    if src_len == 1 {
        return 0..1;
    }
    let start = 2 * i;
    if odd_edge == OddEdge::Fold && i + 1 == dst_len {
        start..src_len
    } else {
        start..start + 2
    }
}

/// General path: degenerate axes of length 1 and folded odd edges.
fn downsample_spans(
    src: &BitmapView<'_>,
    dst: &mut [u8],
    dst_w: usize,
    dst_h: usize,
    odd_edge: OddEdge,
) {
    let bpp = src.bytes_per_pixel();
    let dst_row_bytes = dst_w * bpp;
    for (y, dst_row) in dst.chunks_exact_mut(dst_row_bytes).enumerate() {
        let rows = span(y, src.height(), dst_h, odd_edge);
        for (x, out_px) in dst_row.chunks_exact_mut(bpp).enumerate() {
            let cols = span(x, src.width(), dst_w, odd_edge);
            let count = (rows.len() * cols.len()) as u32;
            for (c, out) in out_px.iter_mut().enumerate() {
                let mut sum = 0u32;
                for sy in rows.clone() {
                    let row = src.row(sy);
                    for sx in cols.clone() {
                        sum += row[sx * bpp + c] as u32;
                    }
                }
                *out = ((sum + count / 2) / count) as u8;
            }
        }
    }
}
