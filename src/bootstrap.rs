use crate::{
    config::BootstrapConfig,
    domain::{CreateUserRequest, UserRole},
    error::Result,
    repository::UserRepository,
};

/// Make sure an admin account exists. Runs once at startup and is
/// idempotent: an existing account (whatever its role) is left alone.
pub async fn ensure_admin(user_repo: &dyn UserRepository, config: &BootstrapConfig) -> Result<()> {
    if user_repo.find_by_email(&config.admin_email).await?.is_some() {
        tracing::debug!("Admin account {} already present", config.admin_email);
        return Ok(());
    }

    let admin = user_repo
        .create(CreateUserRequest {
            email: config.admin_email.clone(),
            username: config.admin_username.clone(),
            full_name: "System Admin".to_string(),
            phone: "0123456789".to_string(),
            password: config.admin_password.clone(),
            role: UserRole::Admin,
        })
        .await?;

    tracing::info!("Created admin account {} ({})", admin.email, admin.id);
    Ok(())
}
