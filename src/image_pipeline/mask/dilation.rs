use rayon::prelude::*;

/// Binary dilation of `mask` with a disk of `radius` pixels.
///
/// Each row is built from the horizontal half-widths of the disk, so the cost
/// is O(radius) row scans per output row.
///
/// Radii beyond `width + height` cover the same pixels and are clamped to it.
pub fn dilate_disk(mask: &[bool], width: usize, height: usize, radius: usize) -> Vec<bool> {
    let radius = radius.min(width + height);
    if radius == 0 {
        return mask.to_vec();
    }

    // Horizontal extent of the disk at each vertical offset.
    let r2 = (radius * radius) as isize;
    let half_widths: Vec<usize> = (0..=radius as isize)
        .map(|dy| {
            let mut dx = 0isize;
            while (dx + 1) * (dx + 1) + dy * dy <= r2 {
                dx += 1;
            }
            dx as usize
        })
        .collect();

    // Distance from each pixel to the nearest set pixel in its row, capped.
    let row_reach: Vec<Vec<usize>> = (0..height)
        .into_par_iter()
        .map(|y| nearest_in_row(&mask[y * width..(y + 1) * width], radius))
        .collect();

    let mut out = vec![false; width * height];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let y_min = y.saturating_sub(radius);
            let y_max = (y + radius).min(height - 1);
            for (sy, reach) in row_reach.iter().enumerate().take(y_max + 1).skip(y_min) {
                let half = half_widths[sy.abs_diff(y)];
                for (x, out) in out_row.iter_mut().enumerate() {
                    if !*out && reach[x] <= half {
                        *out = true;
                    }
                }
            }
        });
    out
}

/// For each x, |x - nearest set pixel| in `row`, or `cap + 1` if none within `cap`.
fn nearest_in_row(row: &[bool], cap: usize) -> Vec<usize> {
    let none = cap + 1;
    let mut reach = vec![none; row.len()];

    let mut last: Option<usize> = None;
    for (x, &set) in row.iter().enumerate() {
        if set {
            last = Some(x);
        }
        if let Some(l) = last {
            reach[x] = (x - l).min(none);
        }
    }

    let mut next: Option<usize> = None;
    for x in (0..row.len()).rev() {
        if row[x] {
            next = Some(x);
        }
        if let Some(n) = next {
            reach[x] = reach[x].min(n - x);
        }
    }
    reach
}
