// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Order-2 (nine coefficient) real spherical harmonics.

use super::Vec3;
use std::f32::consts::PI;
use std::ops::{Add, Mul};

/// Number of coefficients in an order-2 expansion.
pub const SH_COEFFICIENTS: usize = 9;

/// Evaluates the nine real SH basis functions for a unit direction.
pub fn sh_basis(n: Vec3) -> [f32; SH_COEFFICIENTS] {
    [
        0.282095,
        0.488603 * n.y,
        0.488603 * n.z,
        0.488603 * n.x,
        1.092548 * n.x * n.y,
        1.092548 * n.y * n.z,
        0.315392 * (3.0 * n.z * n.z - 1.0),
        1.092548 * n.x * n.z,
        0.546274 * (n.x * n.x - n.y * n.y),
    ]
}

/// Cosine-lobe convolution factors per band, divided by `PI` so that a
/// constant radiance `L` evaluates back to `L`.
const BAND_FACTORS: [f32; SH_COEFFICIENTS] = [
    1.0,
    2.0 / 3.0,
    2.0 / 3.0,
    2.0 / 3.0,
    0.25,
    0.25,
    0.25,
    0.25,
    0.25,
];

/// Nine RGB coefficients describing low-frequency radiance around a point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SphericalHarmonics9 {
    /// Coefficients in basis order.
    pub coefficients: [Vec3; SH_COEFFICIENTS],
}

impl SphericalHarmonics9 {
    /// All coefficients zero.
    pub const ZERO: Self = Self {
        coefficients: [Vec3::ZERO; SH_COEFFICIENTS],
    };

    /// Adds a radiance sample arriving from `direction`, weighted by the solid
    /// angle it covers.
    pub fn add_sample(&mut self, direction: Vec3, radiance: Vec3, solid_angle: f32) {
        let basis = sh_basis(direction.normalize_or_zero());
        for (coefficient, y) in self.coefficients.iter_mut().zip(basis) {
            *coefficient += radiance * (y * solid_angle);
        }
    }

    /// Reconstructs the radiance arriving from `direction`.
    pub fn evaluate(&self, direction: Vec3) -> Vec3 {
        let basis = sh_basis(direction.normalize_or_zero());
        self.coefficients
            .iter()
            .zip(basis)
            .fold(Vec3::ZERO, |acc, (c, y)| acc + *c * y)
    }

    /// Diffuse irradiance around `normal`, divided by `PI`.
    ///
    /// Multiplying by an albedo gives the outgoing radiance of a Lambertian
    /// surface lit by the encoded environment.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let basis = sh_basis(normal.normalize_or_zero());
        self.coefficients
            .iter()
            .zip(basis)
            .zip(BAND_FACTORS)
            .fold(Vec3::ZERO, |acc, ((c, y), a)| acc + *c * (y * a))
            .max(Vec3::ZERO)
    }

    /// Total solid angle of the full sphere, for normalizing Monte Carlo sums.
    pub const SPHERE_SOLID_ANGLE: f32 = 4.0 * PI;
}

impl Add for SphericalHarmonics9 {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        for (a, b) in self.coefficients.iter_mut().zip(rhs.coefficients) {
            *a += b;
        }
        self
    }
}

impl Mul<f32> for SphericalHarmonics9 {
    type Output = Self;

    fn mul(mut self, rhs: f32) -> Self {
        for c in self.coefficients.iter_mut() {
            *c *= rhs;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Integrates a radiance function over a fine latitude/longitude grid.
    fn project(f: impl Fn(Vec3) -> Vec3) -> SphericalHarmonics9 {
        let mut sh = SphericalHarmonics9::ZERO;
        let (rows, cols) = (128, 256);
        for i in 0..rows {
            let theta = (i as f32 + 0.5) / rows as f32 * PI;
            for j in 0..cols {
                let phi = (j as f32 + 0.5) / cols as f32 * 2.0 * PI;
                let dir = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                let d_omega = theta.sin() * (PI / rows as f32) * (2.0 * PI / cols as f32);
                sh.add_sample(dir, f(dir), d_omega);
            }
        }
        sh
    }

    #[test]
    fn test_constant_radiance_evaluates_to_itself() {
        let sh = project(|_| Vec3::new(0.5, 1.0, 2.0));
        let e = sh.irradiance(Vec3::Y);
        assert_relative_eq!(e.x, 0.5, epsilon = 1e-2);
        assert_relative_eq!(e.y, 1.0, epsilon = 1e-2);
        assert_relative_eq!(e.z, 2.0, epsilon = 1e-2);
    }

    #[test]
    fn test_sky_light_is_brighter_facing_up() {
        let sh = project(|d| if d.y > 0.0 { Vec3::ONE } else { Vec3::ZERO });
        let up = sh.irradiance(Vec3::Y).x;
        let down = sh.irradiance(Vec3::NEG_Y).x;
        let side = sh.irradiance(Vec3::X).x;
        assert!(up > side && side > down);
        assert_relative_eq!(side, 0.5, epsilon = 2e-2);
    }

    #[test]
    fn test_dc_coefficient_of_unit_sphere() {
        let sh = project(|_| Vec3::ONE);
        // integral of Y00 over the sphere = 0.282095 * 4pi
        assert_relative_eq!(sh.coefficients[0].x, 0.282095 * 4.0 * PI, epsilon = 1e-2);
        assert!(sh.coefficients[1].x.abs() < 1e-3);
    }
}
