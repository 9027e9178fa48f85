//! Account flows as framework-agnostic state machines.
//!
//! Each flow owns its state behind a mutex that is never held across an
//! `.await`, talks to an [`AuthBackend`](crate::auth::AuthBackend) and
//! expresses navigation through a [`Navigator`](crate::session::Navigator).

pub mod confirm;
pub mod dashboard;
pub mod gate;
pub mod login;
pub mod onboarding;
pub mod signup;
pub mod wizard;

pub use confirm::{ConfirmLink, ConfirmState, confirm_email};
pub use dashboard::{UserMenu, logout};
pub use gate::{GateDecision, dashboard_gate};
pub use login::{Credentials, LoginForm, LoginGate, LoginOutcome, LoginPresentation, login_gate};
pub use onboarding::OnboardingTour;
pub use signup::{AdvanceOutcome, SignupFlow, SignupWizard};
