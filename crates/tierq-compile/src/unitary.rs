//! 2x2 unitary matrices for single-qubit gate composition.
//!
//! Used by the fusion pass to collapse runs of single-qubit gates into a
//! single `U(theta, phi, lambda)` gate via ZYZ decomposition.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4, PI};

use num_complex::Complex64;
use tierq_ir::StandardGate;

/// Numerical tolerance for matrix comparisons.
pub const EPSILON: f64 = 1e-10;

/// A 2x2 complex unitary matrix in row-major order: `[a, b, c, d]`
/// represents `[[a, b], [c, d]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2x2 {
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// The identity matrix.
    pub fn identity() -> Self {
        Self {
            data: [
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(1.0, 0.0),
            ],
        }
    }

    /// Pauli-X.
    pub fn x() -> Self {
        Self {
            data: [
                Complex64::new(0.0, 0.0),
                Complex64::new(1.0, 0.0),
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
            ],
        }
    }

    /// Pauli-Y.
    pub fn y() -> Self {
        Self {
            data: [
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, -1.0),
                Complex64::new(0.0, 1.0),
                Complex64::new(0.0, 0.0),
            ],
        }
    }

    /// Pauli-Z.
    pub fn z() -> Self {
        Self {
            data: [
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(-1.0, 0.0),
            ],
        }
    }

    /// Hadamard.
    pub fn h() -> Self {
        let s = FRAC_1_SQRT_2;
        Self {
            data: [
                Complex64::new(s, 0.0),
                Complex64::new(s, 0.0),
                Complex64::new(s, 0.0),
                Complex64::new(-s, 0.0),
            ],
        }
    }

    /// Phase gate S = diag(1, i).
    pub fn s() -> Self {
        Self {
            data: [
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 1.0),
            ],
        }
    }

    /// S-dagger = diag(1, -i).
    pub fn sdg() -> Self {
        Self {
            data: [
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, -1.0),
            ],
        }
    }

    /// T gate = diag(1, e^(i*pi/4)).
    pub fn t() -> Self {
        Self {
            data: [
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::from_polar(1.0, FRAC_PI_4),
            ],
        }
    }

    /// T-dagger = diag(1, e^(-i*pi/4)).
    pub fn tdg() -> Self {
        Self {
            data: [
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::from_polar(1.0, -FRAC_PI_4),
            ],
        }
    }

    /// Rotation around the X axis.
    pub fn rx(theta: f64) -> Self {
        let cos = (theta / 2.0).cos();
        let sin = (theta / 2.0).sin();
        Self {
            data: [
                Complex64::new(cos, 0.0),
                Complex64::new(0.0, -sin),
                Complex64::new(0.0, -sin),
                Complex64::new(cos, 0.0),
            ],
        }
    }

    /// Rotation around the Y axis.
    pub fn ry(theta: f64) -> Self {
        let cos = (theta / 2.0).cos();
        let sin = (theta / 2.0).sin();
        Self {
            data: [
                Complex64::new(cos, 0.0),
                Complex64::new(-sin, 0.0),
                Complex64::new(sin, 0.0),
                Complex64::new(cos, 0.0),
            ],
        }
    }

    /// Rotation around the Z axis.
    pub fn rz(theta: f64) -> Self {
        Self {
            data: [
                Complex64::from_polar(1.0, -theta / 2.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::from_polar(1.0, theta / 2.0),
            ],
        }
    }

    /// General single-qubit gate U(theta, phi, lambda).
    pub fn u(theta: f64, phi: f64, lambda: f64) -> Self {
        let cos = (theta / 2.0).cos();
        let sin = (theta / 2.0).sin();
        Self {
            data: [
                Complex64::new(cos, 0.0),
                -Complex64::from_polar(sin, lambda),
                Complex64::from_polar(sin, phi),
                Complex64::from_polar(cos, phi + lambda),
            ],
        }
    }

    /// Build the matrix for a single-qubit standard gate.
    ///
    /// Returns `None` for multi-qubit gates.
    pub fn from_gate(gate: &StandardGate) -> Option<Self> {
        match gate {
            StandardGate::I => Some(Self::identity()),
            StandardGate::X => Some(Self::x()),
            StandardGate::Y => Some(Self::y()),
            StandardGate::Z => Some(Self::z()),
            StandardGate::H => Some(Self::h()),
            StandardGate::S => Some(Self::s()),
            StandardGate::Sdg => Some(Self::sdg()),
            StandardGate::T => Some(Self::t()),
            StandardGate::Tdg => Some(Self::tdg()),
            StandardGate::Rx(theta) => Some(Self::rx(*theta)),
            StandardGate::Ry(theta) => Some(Self::ry(*theta)),
            StandardGate::Rz(theta) => Some(Self::rz(*theta)),
            StandardGate::U(theta, phi, lambda) => Some(Self::u(*theta, *phi, *lambda)),
            StandardGate::CX | StandardGate::CZ | StandardGate::Swap => None,
        }
    }

    /// Matrix product `self * rhs`. As a circuit, `rhs` is applied first.
    pub fn mul(&self, rhs: &Self) -> Self {
        let a = &self.data;
        let b = &rhs.data;
        Self {
            data: [
                a[0] * b[0] + a[1] * b[2],
                a[0] * b[1] + a[1] * b[3],
                a[2] * b[0] + a[3] * b[2],
                a[2] * b[1] + a[3] * b[3],
            ],
        }
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        Self {
            data: [
                self.data[0].conj(),
                self.data[2].conj(),
                self.data[1].conj(),
                self.data[3].conj(),
            ],
        }
    }

    /// Check whether the matrix is the identity up to global phase.
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;
        if b.norm() > EPSILON || c.norm() > EPSILON {
            return false;
        }
        // Diagonal entries must be equal unit-modulus numbers.
        (a.norm() - 1.0).abs() < EPSILON && (a - d).norm() < EPSILON
    }

    /// Global phase of the matrix, `det(U).arg() / 2`.
    pub fn global_phase(&self) -> f64 {
        let det = self.data[0] * self.data[3] - self.data[1] * self.data[2];
        det.arg() / 2.0
    }

    /// Decompose into `e^(i*phase) * Rz(alpha) * Ry(beta) * Rz(gamma)`.
    ///
    /// Returns `(alpha, beta, gamma, phase)`.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let [a, b, c, d] = self.data;

        let det = a * d - b * c;
        let global_phase = det.arg() / 2.0;

        // Strip the global phase to work in SU(2).
        let phase_factor = Complex64::from_polar(1.0, -global_phase);
        let a = a * phase_factor;
        let b = b * phase_factor;
        let c = c * phase_factor;

        // For SU(2): U = [[cos(b/2)*e^(-i(a+g)/2), -sin(b/2)*e^(-i(a-g)/2)],
        //                 [sin(b/2)*e^(i(a-g)/2),   cos(b/2)*e^(i(a+g)/2)]]
        let beta = 2.0 * a.norm().acos().clamp(0.0, PI);

        if beta.abs() < EPSILON {
            // Pure Z rotation.
            let alpha_plus_gamma = -2.0 * a.arg();
            return (
                alpha_plus_gamma / 2.0,
                0.0,
                alpha_plus_gamma / 2.0,
                global_phase,
            );
        }

        if (beta - PI).abs() < EPSILON {
            // Anti-diagonal matrix.
            let alpha_minus_gamma = -2.0 * (-b).arg();
            return (
                alpha_minus_gamma / 2.0,
                PI,
                -alpha_minus_gamma / 2.0,
                global_phase,
            );
        }

        let alpha_plus_gamma = -2.0 * a.arg();
        let alpha_minus_gamma = 2.0 * c.arg();

        let alpha = f64::midpoint(alpha_plus_gamma, alpha_minus_gamma);
        let gamma = (alpha_plus_gamma - alpha_minus_gamma) / 2.0;

        (alpha, beta, gamma, global_phase)
    }

    /// Normalize an angle to [-pi, pi].
    pub fn normalize_angle(angle: f64) -> f64 {
        if angle.is_nan() || angle.is_infinite() {
            return 0.0;
        }
        let mut a = angle.rem_euclid(2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        }
        a
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}
