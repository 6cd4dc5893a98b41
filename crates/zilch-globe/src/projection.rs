//! Geographic to Cartesian projection onto the globe.
//!
//! The globe is Y-up: latitude rotates toward +Y, and longitude is shifted by
//! 180° so the texture seam of the paired equirectangular surface image lines
//! up with the sphere's UV origin. The shift must not be changed without
//! changing the texture.

use glam::{DVec3, Vec3};

/// Longitude shift applied before conversion, in degrees.
pub const SEAM_LONGITUDE_OFFSET_DEG: f64 = 180.0;

/// Project a latitude/longitude (degrees) onto a sphere of `radius`, raised by
/// `height` along the surface normal.
pub fn project(latitude_deg: f64, longitude_deg: f64, radius: f64, height: f64) -> Vec3 {
    project_f64(latitude_deg, longitude_deg, radius, height).as_vec3()
}

/// Double-precision variant of [`project`].
pub fn project_f64(latitude_deg: f64, longitude_deg: f64, radius: f64, height: f64) -> DVec3 {
    let phi = latitude_deg.to_radians();
    let theta = (longitude_deg - SEAM_LONGITUDE_OFFSET_DEG).to_radians();
    let r = radius + height;

    DVec3::new(
        -r * phi.cos() * theta.cos(),
        r * phi.sin(),
        r * phi.cos() * theta.sin(),
    )
}
