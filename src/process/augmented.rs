//! Process model for augmented states
//!
//! Pairs one model per half and lets each drive its own half. The combined
//! transition and noise matrices are block diagonal, mirroring the
//! covariance layout of [`AugmentedState`]. As in the state impls, the
//! dimension pairs are stamped out by a macro because trait impls cannot
//! add const generic dimensions on stable.
//!
//! [`AugmentedState`]: crate::state::AugmentedState

use crate::process::ProcessModel;
use crate::state::{AugmentedState, State};
use crate::types::StateMat;

/// Borrowed pair of process models driving an [`AugmentedState`].
pub struct AugmentedProcessModel<'m, MA, MB> {
    a: &'m MA,
    b: &'m MB,
}

impl<'m, MA, MB> AugmentedProcessModel<'m, MA, MB> {
    pub fn new(a: &'m MA, b: &'m MB) -> Self {
        Self { a, b }
    }

    pub fn a(&self) -> &MA {
        self.a
    }

    pub fn b(&self) -> &MB {
        self.b
    }
}

macro_rules! impl_augmented_process_model {
    ($dim_a:literal + $dim_b:literal = $dim:literal) => {
        impl<'m, 's, A, B, MA, MB> ProcessModel<AugmentedState<'s, A, B>, $dim>
            for AugmentedProcessModel<'m, MA, MB>
        where
            A: State<$dim_a>,
            B: State<$dim_b>,
            MA: ProcessModel<A, $dim_a>,
            MB: ProcessModel<B, $dim_b>,
        {
            fn transition_matrix(
                &self,
                state: &AugmentedState<'s, A, B>,
                dt: f64,
            ) -> StateMat<$dim> {
                let mut combined = StateMat::<$dim>::zeros();
                combined
                    .fixed_view_mut::<$dim_a, $dim_a>(0, 0)
                    .copy_from(&self.a.transition_matrix(state.a(), dt));
                combined
                    .fixed_view_mut::<$dim_b, $dim_b>($dim_a, $dim_a)
                    .copy_from(&self.b.transition_matrix(state.b(), dt));
                combined
            }

            fn process_noise_covariance(&self, dt: f64) -> StateMat<$dim> {
                let mut combined = StateMat::<$dim>::zeros();
                combined
                    .fixed_view_mut::<$dim_a, $dim_a>(0, 0)
                    .copy_from(&self.a.process_noise_covariance(dt));
                combined
                    .fixed_view_mut::<$dim_b, $dim_b>($dim_a, $dim_a)
                    .copy_from(&self.b.process_noise_covariance(dt));
                combined
            }

            fn predict_state_only(&self, state: &mut AugmentedState<'s, A, B>, dt: f64) {
                self.a.predict_state_only(state.a_mut(), dt);
                self.b.predict_state_only(state.b_mut(), dt);
            }

            fn predict_state(&self, state: &mut AugmentedState<'s, A, B>, dt: f64) {
                // Delegating per half keeps the halves' covariances exact
                // instead of round-tripping through the combined matrix.
                self.a.predict_state(state.a_mut(), dt);
                self.b.predict_state(state.b_mut(), dt);
            }
        }
    };
}

impl_augmented_process_model!(12 + 3 = 15);
impl_augmented_process_model!(6 + 3 = 9);
