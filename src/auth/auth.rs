use crate::{
    auth::jwt::verify_token,
    config::Config,
    model::role::Role,
    models::{Claims, TokenType},
};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = actix_web::Error;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;
        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, actix_web::Error> {
    // set by auth_middleware on protected scopes
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ErrorUnauthorized("Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ErrorInternalServerError("Config missing"))?;

    let claims =
        verify_token(token, &config.jwt_secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;
    if claims.token_type != TokenType::Access {
        return Err(ErrorUnauthorized("Access token required"));
    }
    AuthUser::try_from(claims)
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    /// Schedule decisions and reference-book writes.
    pub fn require_manager_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(ErrorForbidden("Manager/Admin only"))
        }
    }

    /// Returns true if the user is an employee
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{Subject, generate_access_token, generate_refresh_token};
    use actix_web::test::TestRequest;

    const SECRET: &str = "extractor-secret";

    fn admin() -> Subject {
        Subject {
            user_id: 1,
            username: "root".into(),
            role: Role::Admin.id(),
            employee_id: None,
        }
    }

    fn request(token: &str) -> HttpRequest {
        TestRequest::post()
            .uri("/auth/register")
            .app_data(Data::new(Config::for_tests(SECRET)))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request()
    }

    #[actix_web::test]
    async fn access_token_identifies_the_caller() {
        let token = generate_access_token(&admin(), SECRET, 60).unwrap();
        let user = AuthUser::extract(&request(&token)).await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[actix_web::test]
    async fn refresh_token_is_not_a_caller_identity() {
        let (token, _) = generate_refresh_token(&admin(), SECRET, 60).unwrap();
        let req = request(&token);
        assert!(AuthUser::extract(&req).await.is_err());
        assert!(Option::<AuthUser>::extract(&req).await.unwrap().is_none());
    }
}
