pub mod orchestrator;
pub mod postgres;

pub use orchestrator::{AuthServiceImpl, InvitationServiceImpl, TenantServiceImpl};
pub use postgres::{PgInvitationRepository, PgRefreshFamilyRepository, PgTenantRepository, PgUserRepository};
