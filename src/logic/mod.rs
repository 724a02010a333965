pub mod cleanup;
pub mod guard;
pub mod registry;
pub mod reservation;
pub mod session;

pub use cleanup::{CleanupCoordinator, CleanupPlan, CleanupReport, CleanupTrigger};
pub use guard::{
    has_changes, EditingSurface, FormSaver, FormState, NavigationGuard, SavingForm, TabHost,
};
pub use registry::AssetRegistry;
pub use reservation::ReservationService;
pub use session::{AbandonOutcome, EditingSession, SessionManager};
