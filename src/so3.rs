//! Quaternion manifold and SO(3) utilities
//!
//! Exponential/logarithm maps between rotation vectors and unit quaternions,
//! the skew-symmetric cross-product matrix, Rodrigues' rotation formula, and
//! the singularity wrap for exponential-map states. All small-angle paths use
//! truncated Taylor series so every function stays finite and accurate at
//! exactly zero.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// Below this angle the Taylor expansion replaces `sin(theta) / theta`,
/// keeping the quotient finite and accurate at exactly zero.
const SINC_TAYLOR_CUTOFF: f64 = 1e-13;

/// Below this vector norm the cosecant and versine Taylor expansions are used.
const SMALL_ANGLE: f64 = 1e-4;

/// `sin(theta) / theta`, defined as 1 at 0.
pub fn sinc(theta: f64) -> f64 {
    if theta.abs() < SINC_TAYLOR_CUTOFF {
        // sin(t)/t = 1 - t^2/6 + O(t^4)
        1.0 - theta * theta / 6.0
    } else {
        theta.sin() / theta
    }
}

/// Quaternion exponential of a rotation vector in half-angle space.
///
/// For `v` with `theta = |v|` this is `(cos theta, sinc(theta) * v)`, a true
/// exponential: `quat_ln(quat_exp(v)) == v` for `|v| < pi`.
pub fn quat_exp(v: &Vector3<f64>) -> UnitQuaternion<f64> {
    let theta = v.norm();
    let vec = v * sinc(theta);
    UnitQuaternion::new_normalize(Quaternion::from_parts(theta.cos(), vec))
}

/// First-order small-angle approximation of [`quat_exp`].
///
/// Agrees with the exact exponential within 1e-6 for `|v| < 1e-4`.
pub fn small_angle_quat_exp(v: &Vector3<f64>) -> UnitQuaternion<f64> {
    // cos(theta) = 1 - theta^2/2 + O(theta^4), sinc(theta) = 1 + O(theta^2)
    let w = 1.0 - v.norm_squared() / 2.0;
    UnitQuaternion::new_normalize(Quaternion::from_parts(w, *v))
}

fn quat_ln_parts(w: f64, vec: Vector3<f64>) -> Vector3<f64> {
    let vecnorm = vec.norm();
    let phi = vecnorm.atan2(w);
    let phi_over_sin = if vecnorm < SMALL_ANGLE {
        // Taylor expansion of phi / sin(phi)
        let phi2 = phi * phi;
        1.0 + phi2 / 6.0 + 7.0 * phi2 * phi2 / 360.0 + 31.0 * phi2 * phi2 * phi2 / 15120.0
    } else {
        phi / phi.sin()
    };
    vec * phi_over_sin
}

/// Quaternion logarithm, the inverse of [`quat_exp`].
pub fn quat_ln(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    quat_ln_parts(q.scalar(), q.imag())
}

/// Quaternion logarithm of whichever of `q`, `-q` has the shorter log.
///
/// `q` and `-q` denote the same rotation but their logs differ in length;
/// taking the long way around produces residuals near 2*pi that destabilize
/// a filter. The result always has norm at most pi.
pub fn smallest_quat_ln(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let pos = quat_ln_parts(q.scalar(), q.imag());
    let neg = quat_ln_parts(-q.scalar(), -q.imag());
    if pos.norm_squared() <= neg.norm_squared() {
        pos
    } else {
        neg
    }
}

/// Skew-symmetric cross-product matrix: `skew(v) * u == v.cross(u)`.
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y, //
        v.z, 0.0, -v.x, //
        -v.y, v.x, 0.0,
    )
}

/// Rodrigues' formula: rotation matrix for the rotation vector `v`.
///
/// `R = I + c1 * skew(v) + c2 * skew(v)^2` with `c1 = sinc(theta)` and
/// `c2 = (1 - cos theta) / theta^2`, Taylor-expanded near zero. Produces a
/// proper rotation for any magnitude of `v`.
pub fn rodrigues(v: &Vector3<f64>) -> Matrix3<f64> {
    let theta2 = v.norm_squared();
    let theta = theta2.sqrt();
    let c1 = sinc(theta);
    let c2 = if theta < SMALL_ANGLE {
        // (1 - cos t)/t^2 = 1/2 - t^2/24 + O(t^4)
        0.5 - theta2 / 24.0
    } else {
        (1.0 - theta.cos()) / theta2
    };
    let omega = skew(v);
    Matrix3::identity() + c1 * omega + c2 * (omega * omega)
}

/// Unit quaternion for the rotation vector `v` (full-angle convention).
pub fn rotation_vector_to_quat(v: &Vector3<f64>) -> UnitQuaternion<f64> {
    quat_exp(&(v / 2.0))
}

/// Re-parameterize a rotation vector that left the ball of radius pi.
///
/// Whenever `|omega|^2 > pi^2` the equivalent rotation `(1 - 2*pi/|omega|) *
/// omega` of smaller magnitude is returned; otherwise `omega` is unchanged.
pub fn avoid_singularities(omega: Vector3<f64>) -> Vector3<f64> {
    let norm2 = omega.norm_squared();
    if norm2 > std::f64::consts::PI * std::f64::consts::PI {
        let norm = norm2.sqrt();
        (1.0 - 2.0 * std::f64::consts::PI / norm) * omega
    } else {
        omega
    }
}
