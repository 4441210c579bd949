use kiln::data_structures::texture::checkerboard_pixels;

const ODD: [u8; 3] = [255, 128, 0];
const EVEN: [u8; 3] = [0, 64, 255];

fn pixel(pixels: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
    let offset = ((y * size + x) * 4) as usize;
    [
        pixels[offset],
        pixels[offset + 1],
        pixels[offset + 2],
        pixels[offset + 3],
    ]
}

#[test]
fn checkerboard_is_rgba_and_opaque() {
    let pixels = checkerboard_pixels(4, 2, ODD, EVEN);
    assert_eq!(pixels.len(), 4 * 4 * 4);
    for alpha in pixels.iter().skip(3).step_by(4) {
        assert_eq!(*alpha, 255);
    }
}

#[test]
fn checkers_alternate_every_checker_size() {
    let pixels = checkerboard_pixels(4, 2, ODD, EVEN);

    // The top-left checker is even, neighbours along either axis are odd and
    // the diagonal checker is even again.
    assert_eq!(pixel(&pixels, 4, 0, 0)[..3], EVEN);
    assert_eq!(pixel(&pixels, 4, 2, 0)[..3], ODD);
    assert_eq!(pixel(&pixels, 4, 0, 2)[..3], ODD);
    assert_eq!(pixel(&pixels, 4, 2, 2)[..3], EVEN);

    // Pixels within one checker share the colour.
    assert_eq!(pixel(&pixels, 4, 0, 0), pixel(&pixels, 4, 1, 1));
    assert_eq!(pixel(&pixels, 4, 2, 0), pixel(&pixels, 4, 3, 1));
}

#[test]
fn single_pixel_checkers_alternate_per_pixel() {
    let pixels = checkerboard_pixels(2, 1, ODD, EVEN);
    assert_eq!(pixel(&pixels, 2, 0, 0)[..3], EVEN);
    assert_eq!(pixel(&pixels, 2, 1, 0)[..3], ODD);
    assert_eq!(pixel(&pixels, 2, 0, 1)[..3], ODD);
    assert_eq!(pixel(&pixels, 2, 1, 1)[..3], EVEN);
}
