// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{User, UserRole},
};

/// Conjunto de papéis que pode passar pelo guardião.
pub trait RoleRequirement: Send + Sync + 'static {
    fn name() -> &'static str;
    fn allows(role: UserRole) -> bool;
}

/// Extrator que rejeita com 403 quem não tem um dos papéis de `T`.
/// Depende do `auth_guard` ter rodado antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::TokenMissing)?;

        if !T::allows(user.0.role) {
            tracing::warn!(
                "Usuário {} ({:?}) barrado: exige papel '{}'",
                user.0.id,
                user.0.role,
                T::name()
            );
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// Papéis
// ---

pub struct Admin;
impl RoleRequirement for Admin {
    fn name() -> &'static str { "admin" }
    fn allows(role: UserRole) -> bool {
        role == UserRole::Direccion
    }
}

pub struct Leadership;
impl RoleRequirement for Leadership {
    fn name() -> &'static str { "leadership" }
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::Direccion | UserRole::Coordinadora)
    }
}

// Almacén não cria pedidos
pub struct OrderCreators;
impl RoleRequirement for OrderCreators {
    fn name() -> &'static str { "order-creators" }
    fn allows(role: UserRole) -> bool {
        role != UserRole::Almacen
    }
}

pub struct Finance;
impl RoleRequirement for Finance {
    fn name() -> &'static str { "finance" }
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::Direccion | UserRole::Coordinadora | UserRole::Contabilidad)
    }
}

pub fn ensure_self_or_admin(user: &User, id: i32) -> Result<(), AppError> {
    if user.id == id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UserRole::Direccion, true, true, true, true)]
    #[case(UserRole::Coordinadora, false, true, true, true)]
    #[case(UserRole::Contabilidad, false, false, true, true)]
    #[case(UserRole::Ts, false, false, true, false)]
    #[case(UserRole::Consejo, false, false, true, false)]
    #[case(UserRole::Almacen, false, false, false, false)]
    fn role_sets(
        #[case] role: UserRole,
        #[case] admin: bool,
        #[case] leadership: bool,
        #[case] creators: bool,
        #[case] finance: bool,
    ) {
        assert_eq!(Admin::allows(role), admin);
        assert_eq!(Leadership::allows(role), leadership);
        assert_eq!(OrderCreators::allows(role), creators);
        assert_eq!(Finance::allows(role), finance);
    }

    #[test]
    fn self_or_admin() {
        let now = chrono::Utc::now();
        let mut user = User {
            id: 5,
            username: "luis".into(),
            email: "luis@bamx.org".into(),
            password_hash: String::new(),
            role: UserRole::Ts,
            verified: true,
            active: true,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        assert!(ensure_self_or_admin(&user, 5).is_ok());
        assert!(matches!(ensure_self_or_admin(&user, 6), Err(AppError::Forbidden)));

        user.role = UserRole::Direccion;
        assert!(ensure_self_or_admin(&user, 6).is_ok());
    }
}
