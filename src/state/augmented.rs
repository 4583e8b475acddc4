//! Two states filtered jointly as one block vector
//!
//! Borrows both halves mutably and presents them as a single state whose
//! vector is the concatenation and whose covariance is block diagonal.
//! Cross-covariance between the halves is not stored: writes keep only the
//! diagonal blocks, so the halves stay a-priori independent across steps.
//!
//! Stable Rust cannot add const generics in a trait impl, so the combined
//! [`State`] implementation is stamped out per dimension pair by a macro.
//! Capability lookups forward to the first half, which keeps existing
//! measurement types usable on the augmented composite unchanged.

use nalgebra::{UnitQuaternion, Vector3};

use crate::state::{
    HasAngularVelocity, HasCombinedQuaternion, HasIncrementalOrientation, HasPosition, State,
};
use crate::types::{StateMat, StateVec};

/// Mutable view over two states treated as one.
pub struct AugmentedState<'a, A, B> {
    a: &'a mut A,
    b: &'a mut B,
}

impl<'a, A, B> AugmentedState<'a, A, B> {
    pub fn new(a: &'a mut A, b: &'a mut B) -> Self {
        Self { a, b }
    }

    pub fn a(&self) -> &A {
        self.a
    }

    pub fn a_mut(&mut self) -> &mut A {
        self.a
    }

    pub fn b(&self) -> &B {
        self.b
    }

    pub fn b_mut(&mut self) -> &mut B {
        self.b
    }
}

macro_rules! impl_augmented_state {
    ($dim_a:literal + $dim_b:literal = $dim:literal) => {
        impl<'a, A, B> State<$dim> for AugmentedState<'a, A, B>
        where
            A: State<$dim_a>,
            B: State<$dim_b>,
        {
            fn state_vector(&self) -> StateVec<$dim> {
                let mut combined = StateVec::<$dim>::zeros();
                combined
                    .fixed_rows_mut::<$dim_a>(0)
                    .copy_from(&self.a.state_vector());
                combined
                    .fixed_rows_mut::<$dim_b>($dim_a)
                    .copy_from(&self.b.state_vector());
                combined
            }

            fn set_state_vector(&mut self, state: StateVec<$dim>) {
                self.a
                    .set_state_vector(state.fixed_rows::<$dim_a>(0).clone_owned());
                self.b
                    .set_state_vector(state.fixed_rows::<$dim_b>($dim_a).clone_owned());
            }

            fn error_covariance(&self) -> StateMat<$dim> {
                let mut combined = StateMat::<$dim>::zeros();
                combined
                    .fixed_view_mut::<$dim_a, $dim_a>(0, 0)
                    .copy_from(&self.a.error_covariance());
                combined
                    .fixed_view_mut::<$dim_b, $dim_b>($dim_a, $dim_a)
                    .copy_from(&self.b.error_covariance());
                combined
            }

            fn set_error_covariance(&mut self, covariance: StateMat<$dim>) {
                // Off-diagonal blocks are dropped here; the halves remain
                // independent by construction.
                self.a.set_error_covariance(
                    covariance.fixed_view::<$dim_a, $dim_a>(0, 0).clone_owned(),
                );
                self.b.set_error_covariance(
                    covariance
                        .fixed_view::<$dim_b, $dim_b>($dim_a, $dim_a)
                        .clone_owned(),
                );
            }

            fn post_correct(&mut self) {
                self.a.post_correct();
                self.b.post_correct();
            }
        }
    };
}

impl_augmented_state!(12 + 3 = 15);
impl_augmented_state!(6 + 3 = 9);

impl<'a, A: HasPosition, B> HasPosition for AugmentedState<'a, A, B> {
    fn position(&self) -> Vector3<f64> {
        self.a.position()
    }
}

impl<'a, A: HasAngularVelocity, B> HasAngularVelocity for AugmentedState<'a, A, B> {
    fn angular_velocity(&self) -> Vector3<f64> {
        self.a.angular_velocity()
    }
}

impl<'a, A: HasCombinedQuaternion, B> HasCombinedQuaternion for AugmentedState<'a, A, B> {
    fn combined_quaternion(&self) -> UnitQuaternion<f64> {
        self.a.combined_quaternion()
    }
}

impl<'a, A: HasIncrementalOrientation, B> HasIncrementalOrientation for AugmentedState<'a, A, B> {
    fn incremental_orientation(&self) -> Vector3<f64> {
        self.a.incremental_orientation()
    }

    fn external_quaternion(&self) -> UnitQuaternion<f64> {
        self.a.external_quaternion()
    }
}
