use fisheye_image::Image;

#[inline]
fn put_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x >= 0 && y >= 0 {
        // out of bounds writes are dropped
        let _ = img.set_pixel(x as usize, y as usize, color);
    }
}

/// Draws a line on an image inplace using Bresenham's line algorithm.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p0` - The start point of the line as a tuple of (x, y).
/// * `p1` - The end point of the line as a tuple of (x, y).
/// * `color` - The color of the line as an array of `C` elements.
/// * `thickness` - The thickness of the line, approximated with square stamps.
pub fn draw_line<const C: usize>(
    img: &mut Image<u8, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [u8; C],
    thickness: usize,
) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();

    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut err = dx - dy;
    let half = thickness as i64 / 2;

    loop {
        for i in -half..=half {
            for j in -half..=half {
                put_pixel(img, x0 + i, y0 + j, color);
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws a filled circle on an image inplace.
///
/// Pixels outside the image are skipped.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `center` - The center of the circle as (x, y).
/// * `radius` - The radius in pixels.
/// * `color` - The fill color.
pub fn draw_filled_circle<const C: usize>(
    img: &mut Image<u8, C>,
    center: (i64, i64),
    radius: i64,
    color: [u8; C],
) {
    let (cx, cy) = center;
    let r2 = radius * radius;
    for y in -radius..=radius {
        for x in -radius..=radius {
            if x * x + y * y <= r2 {
                put_pixel(img, cx + x, cy + y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisheye_image::{ImageError, ImageSize};

    #[test]
    fn test_draw_line() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::new(
            ImageSize {
                width: 5,
                height: 5,
            },
            vec![0; 25],
        )?;
        draw_line(&mut img, (0, 0), (4, 4), [255], 1);
        #[rustfmt::skip]
        assert_eq!(
            img.as_slice(),
            &[
                255, 0, 0, 0, 0,
                0, 255, 0, 0, 0,
                0, 0, 255, 0, 0,
                0, 0, 0, 255, 0,
                0, 0, 0, 0, 255,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_draw_circle_clipped() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        draw_filled_circle(&mut img, (0, 0), 1, [7]);
        #[rustfmt::skip]
        assert_eq!(
            img.as_slice(),
            &[
                7, 7, 0,
                7, 0, 0,
                0, 0, 0,
            ]
        );
        Ok(())
    }
}
