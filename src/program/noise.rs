//! Deterministic gradient noise for the `noise` module.
//!
//! Pure functions over a fixed permutation table, so every slice of every renderer produces
//! identical values for identical coordinates.

const PERM: [u8; 512] = {
    const P: [u8; 256] = [
        151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30,
        69, 142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94,
        252, 219, 203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136,
        171, 168, 68, 175, 74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229,
        122, 60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63,
        161, 1, 216, 80, 73, 209, 76, 132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188,
        159, 86, 164, 100, 109, 198, 173, 186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38,
        147, 118, 126, 255, 82, 85, 212, 207, 206, 59, 227, 47, 16, 58, 17, 182, 189, 28, 42,
        223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163, 70, 221, 153, 101, 155, 167, 43,
        172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232, 178, 185, 112, 104, 218,
        246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241, 81, 51, 145, 235,
        249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204, 176, 115, 121, 50,
        45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141, 128, 195,
        78, 66, 215, 61, 156, 180,
    ];
    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 512 {
        table[i] = P[i & 255];
        i += 1;
    }
    table
};

/// Octave count accepted by [`fbm`].
pub(crate) const MAX_OCTAVES: u32 = 10;

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad3(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

#[inline]
fn perm(v: i64) -> i64 {
    i64::from(PERM[(v & 255) as usize])
}

/// 3D Perlin noise in roughly `[-1, 1]`. The third axis is used as the seed dimension.
pub(crate) fn perlin3(x: f64, y: f64, z: f64) -> f64 {
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return 0.0;
    }
    let (xf, yf, zf) = (x - x.floor(), y - y.floor(), z - z.floor());
    let (xi, yi, zi) = (x.floor() as i64, y.floor() as i64, z.floor() as i64);
    let (u, v, w) = (fade(xf), fade(yf), fade(zf));

    let a = perm(xi) + yi;
    let aa = perm(a) + zi;
    let ab = perm(a + 1) + zi;
    let b = perm(xi + 1) + yi;
    let ba = perm(b) + zi;
    let bb = perm(b + 1) + zi;

    let h = |v: i64| PERM[(v & 255) as usize];
    lerp(
        w,
        lerp(
            v,
            lerp(u, grad3(h(aa), xf, yf, zf), grad3(h(ba), xf - 1.0, yf, zf)),
            lerp(
                u,
                grad3(h(ab), xf, yf - 1.0, zf),
                grad3(h(bb), xf - 1.0, yf - 1.0, zf),
            ),
        ),
        lerp(
            v,
            lerp(
                u,
                grad3(h(aa + 1), xf, yf, zf - 1.0),
                grad3(h(ba + 1), xf - 1.0, yf, zf - 1.0),
            ),
            lerp(
                u,
                grad3(h(ab + 1), xf, yf - 1.0, zf - 1.0),
                grad3(h(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
            ),
        ),
    )
}

/// Seeded 2D noise: a slice of [`perlin3`] offset so integer seeds do not land on lattice
/// planes, where Perlin noise is identically zero.
pub(crate) fn noise2(x: f64, y: f64, seed: f64) -> f64 {
    perlin3(x, y, seed * 1.618_033_988_75 + 0.5)
}

/// Fractal Brownian motion over [`noise2`] with lacunarity 2 and gain 0.5, normalized to
/// the noise range.
pub(crate) fn fbm(x: f64, y: f64, octaves: f64, seed: f64) -> f64 {
    let octaves = if octaves.is_finite() {
        (octaves.round().max(1.0) as u32).min(MAX_OCTAVES)
    } else {
        1
    };
    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amp = 0.0;
    for _ in 0..octaves {
        sum += amplitude * noise2(x * frequency, y * frequency, seed);
        max_amp += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    sum / max_amp
}

#[cfg(test)]
#[path = "../../tests/unit/program/noise.rs"]
mod tests;
