pub mod invitation_repository;
pub mod refresh_repository;
pub mod tenant_repository;
pub mod user_repository;

pub use invitation_repository::PgInvitationRepository;
pub use refresh_repository::PgRefreshFamilyRepository;
pub use tenant_repository::PgTenantRepository;
pub use user_repository::PgUserRepository;

/// `true` if a Postgres error is a unique-constraint violation (`23505`).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
