//! Sign-in commands.

use pharmadesk_client::{AppContext, Transport};

use crate::error::ApiError;
use crate::render;

pub async fn login<T: Transport>(
    ctx: &AppContext<T>,
    email: &str,
    password: &str,
) -> Result<String, ApiError> {
    let user = ctx.auth.login(email, password).await?;
    Ok(format!("Welcome, {}", render::user(&user)))
}

/// Asks first; answering "n" keeps the session.
pub async fn logout<T: Transport>(ctx: &AppContext<T>) -> Result<String, ApiError> {
    if ctx.auth.logout().await {
        Ok("Logged out".to_string())
    } else {
        Ok("Still logged in".to_string())
    }
}

pub fn whoami<T: Transport>(ctx: &AppContext<T>) -> Result<String, ApiError> {
    ctx.auth
        .current_user()
        .map(|user| render::user(&user))
        .ok_or_else(ApiError::auth_required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{dispatch, Command};
    use crate::error::ErrorCode;
    use crate::testing::context;
    use pharmadesk_client::Method;
    use pharmadesk_core::Role;

    #[tokio::test]
    async fn test_login_then_whoami() {
        let (ctx, backend) = context(None);
        assert_eq!(whoami(&ctx).unwrap_err().code, ErrorCode::AuthRequired);

        let text = login(&ctx, " farah@pharmadesk.in ", "secret").await.unwrap();
        assert_eq!(text, "Welcome, Farah Khan (Admin) <farah@pharmadesk.in>");
        assert_eq!(backend.count(Method::Post, "/auth/login"), 1);
        assert!(whoami(&ctx).unwrap().starts_with("Farah Khan"));
    }

    #[tokio::test]
    async fn test_wrong_password_keeps_server_message() {
        let (ctx, _backend) = context(None);

        let err = login(&ctx, "farah@pharmadesk.in", "guess").await.unwrap_err();
        assert_eq!(err, ApiError::validation("Invalid email or password"));
        assert!(ctx.auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_commands_need_a_session() {
        let (ctx, backend) = context(None);

        let err = dispatch(&ctx, Command::ShowCart).await.unwrap_err();
        assert_eq!(err, ApiError::auth_required());
        assert!(backend.calls().is_empty());

        let (ctx, _backend) = context(Some(Role::Staff));
        assert_eq!(dispatch(&ctx, Command::ShowCart).await.unwrap(), "Cart is empty");
    }

    #[tokio::test]
    async fn test_logout_declined() {
        let (ctx, _backend) = context(Some(Role::Staff));
        let mut prompts = ctx.confirmations.watch();

        let pending = tokio::spawn({
            let ctx = ctx.clone();
            async move { logout(&ctx).await }
        });
        prompts.wait_for(|p| p.is_some()).await.unwrap();
        ctx.confirmations.respond(false).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), "Still logged in");
        assert!(ctx.auth.current_user().is_some());
    }
}
