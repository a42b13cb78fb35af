use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
};

pub fn require_admin(claims: &Claims) -> AppResult<()> {
    if !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can perform this action".to_string(),
        ));
    }
    Ok(())
}

pub fn require_owner_or_admin(claims: &Claims, resource_owner_id: &str) -> AppResult<()> {
    if !claims.is_admin() && claims.sub != resource_owner_id {
        return Err(AppError::Forbidden(
            "You can only access your own resources".to_string(),
        ));
    }
    Ok(())
}
