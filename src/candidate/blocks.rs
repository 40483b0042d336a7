//! Template partitioning into weak-classifier blocks.

use crate::image::ImageView;
use crate::patch::Rect;

/// Splits a `width x height` template into a `partition` grid of blocks.
///
/// The last block of each row and column absorbs the remainder. A template
/// narrower or shorter than the grid is treated as a single block.
pub(crate) fn block_rects(width: usize, height: usize, partition: (usize, usize)) -> Vec<Rect> {
    let (px, py) = partition;
    let bw = width / px;
    let bh = height / py;
    if bw == 0 || bh == 0 {
        return vec![Rect::new(0, 0, width as i32, height as i32)];
    }

    let last_w = width - bw * (px - 1);
    let last_h = height - bh * (py - 1);
    let mut rects = Vec::with_capacity(px * py);
    for by in 0..py {
        let h = if by + 1 == py { last_h } else { bh };
        for bx in 0..px {
            let w = if bx + 1 == px { last_w } else { bw };
            rects.push(Rect::new(
                (bx * bw) as i32,
                (by * bh) as i32,
                w as i32,
                h as i32,
            ));
        }
    }
    rects
}

/// Drops blocks that are not fully covered by `mask`.
pub(crate) fn retain_covered_blocks(blocks: &mut Vec<Rect>, mask: ImageView<'_, u8>) {
    blocks.retain(|b| {
        (b.y as usize..b.bottom() as usize).all(|y| {
            mask.row(y)[b.x as usize..b.right() as usize]
                .iter()
                .all(|&m| m != 0)
        })
    });
}
