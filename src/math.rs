/// Builds the 2D rotation matrix for an angle in radians
pub fn rotation_matrix(angle: f64) -> [[f64; 2]; 2] {
    let (sin_a, cos_a) = angle.sin_cos();
    [[cos_a, -sin_a], [sin_a, cos_a]]
}

/// Multiplies a 2x2 matrix by a 2-dimensional vector
pub fn multiply_matrix_vector(matrix: &[[f64; 2]; 2], vector: &[f64; 2]) -> [f64; 2] {
    let mut result = [0.0; 2];
    for i in 0..2 {
        for j in 0..2 {
            result[i] += matrix[i][j] * vector[j];
        }
    }
    result
}

/// Perspective scale factor mapping depth to screen magnitude
pub fn perspective_scale(focal_length: f64, z: f64) -> f64 {
    focal_length / z
}

/// Rotates a planar point and applies the perspective scale
pub fn project(matrix: &[[f64; 2]; 2], x: f64, y: f64, scale: f64) -> [f64; 2] {
    let [rx, ry] = multiply_matrix_vector(matrix, &[x, y]);
    [rx * scale, ry * scale]
}

/// Opacity for a particle at depth `z`: linear in closeness, saturating at 1
pub fn depth_opacity(z: f64, depth: f64, gain: f64) -> f64 {
    ((1.0 - z / depth) * gain).clamp(0.0, 1.0)
}

/// Hue that drifts around the colour wheel with depth
pub fn depth_hue(base: f64, z: f64, depth: f64, span: f64) -> f64 {
    wrap_degrees(base + (z / depth) * span)
}

/// Wraps an angle in degrees into `[0, 360)`
pub fn wrap_degrees(value: f64) -> f64 {
    let wrapped = value.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// One step of exponential smoothing toward a target
pub fn approach(current: f64, target: f64, factor: f64) -> f64 {
    current + (target - current) * factor
}

/// Converts HSL (hue in degrees, saturation and lightness in percent) to RGB in `[0, 1]`
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [f64; 3] {
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let l = (lightness / 100.0).clamp(0.0, 1.0);
    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = wrap_degrees(hue) / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    [r + m, g + m, b + m]
}
