use color_eyre::Result;

use crate::db::{AuthUser, Db, Role};
use crate::utils;

// ---------------------------------------------------------------------------
// AuthRepository trait (the service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
        avatar: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn create_user_session(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn get_user_by_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn delete_sessions_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl AuthRepository for Db {
    fn email_exists(&self, email: &str) -> impl std::future::Future<Output = Result<bool>> + Send {
        Db::email_exists(self, email)
    }

    fn create_user(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
        avatar: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        Db::create_user(self, email, password, username, role, avatar)
    }

    fn create_user_session(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        Db::create_user_session(self, user_id)
    }

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send {
        Db::verify_user_password(self, email, password)
    }

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send {
        Db::find_user_by_email(self, email)
    }

    fn get_user_by_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send {
        Db::get_user_by_session(self, session_id)
    }

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        Db::delete_user_session(self, session_id)
    }

    fn delete_sessions_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<u64>> + Send {
        Db::delete_sessions_for_user(self, user_id)
    }

    fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send {
        Db::change_password(self, user_id, current_password, new_password)
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RegisterOutcome {
    /// User created and signed in.
    LoggedIn { token: String, user: AuthUser },
    /// Required fields were empty.
    EmptyFields,
    /// Email already in use.
    EmailTaken,
    /// Password does not meet minimum requirements.
    WeakPassword,
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Login succeeded. Every earlier session of the account is gone.
    Success { token: String, user: AuthUser },
    /// Password was incorrect (or email not found).
    InvalidCredentials,
}

#[derive(Debug)]
pub enum ChangePasswordOutcome {
    Success,
    EmptyFields,
    Mismatch,
    WeakPassword,
    IncorrectPassword,
}

const MIN_PASSWORD_LENGTH: usize = 8;

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Checks the credentials, then replaces every session of the account
    /// with a fresh one.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = email.trim();
        let verified = self.repo.verify_user_password(email, password).await?;

        if !verified {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user =
            self.repo.find_user_by_email(email).await?.ok_or_else(|| {
                color_eyre::eyre::eyre!("user not found after password verification")
            })?;

        self.repo.delete_sessions_for_user(&user.id).await?;
        let token = self.repo.create_user_session(&user.id).await?;

        Ok(LoginOutcome::Success { token, user })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> Result<RegisterOutcome> {
        let email = email.trim();
        let username = username.trim();

        if email.is_empty() || password.is_empty() || username.is_empty() {
            return Ok(RegisterOutcome::EmptyFields);
        }

        if password.len() < MIN_PASSWORD_LENGTH {
            return Ok(RegisterOutcome::WeakPassword);
        }

        let exists = self.repo.email_exists(email).await?;
        if exists {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let avatar = utils::avatar_url(username);
        let user_id = self
            .repo
            .create_user(email, password, username, role, &avatar)
            .await?;
        let token = self.repo.create_user_session(&user_id).await?;

        Ok(RegisterOutcome::LoggedIn {
            token,
            user: AuthUser {
                id: user_id,
                email: email.to_string(),
                username: username.to_string(),
                role,
                avatar,
            },
        })
    }

    /// Resolves a session token to its user.
    pub async fn restore(&self, session_id: &str) -> Result<Option<AuthUser>> {
        self.repo.get_user_by_session(session_id).await
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<ChangePasswordOutcome> {
        if current_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
            return Ok(ChangePasswordOutcome::EmptyFields);
        }

        if new_password != confirm_password {
            return Ok(ChangePasswordOutcome::Mismatch);
        }

        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Ok(ChangePasswordOutcome::WeakPassword);
        }

        let changed = self
            .repo
            .change_password(user_id, current_password, new_password)
            .await?;

        if changed {
            Ok(ChangePasswordOutcome::Success)
        } else {
            Ok(ChangePasswordOutcome::IncorrectPassword)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(mock_repo: MockAuthRepository) -> AuthService<MockAuthRepository> {
        AuthService::new(mock_repo)
    }

    fn student(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: "test@example.com".to_string(),
            username: "Test".to_string(),
            role: Role::Student,
            avatar: utils::avatar_url("Test"),
        }
    }

    // ----- login tests -----

    #[tokio::test]
    async fn login_success_returns_session_token() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mock.expect_find_user_by_email()
            .returning(|_| Box::pin(async { Ok(Some(student("user-1"))) }));
        mock.expect_delete_sessions_for_user()
            .returning(|_| Box::pin(async { Ok(0) }));
        mock.expect_create_user_session()
            .returning(|_| Box::pin(async { Ok("session-token-123".to_string()) }));

        let svc = service(mock);
        let outcome = svc.login("test@example.com", "password").await.unwrap();

        assert!(
            matches!(outcome, LoginOutcome::Success { ref token, ref user } if token == "session-token-123" && user.id == "user-1")
        );
    }

    #[tokio::test]
    async fn login_invalidates_prior_sessions_before_issuing_a_new_one() {
        let mut seq = mockall::Sequence::new();
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mock.expect_find_user_by_email()
            .returning(|_| Box::pin(async { Ok(Some(student("user-1"))) }));
        mock.expect_delete_sessions_for_user()
            .withf(|id| id == "user-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(2) }));
        mock.expect_create_user_session()
            .withf(|id| id == "user-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok("fresh".to_string()) }));

        let svc = service(mock);
        let outcome = svc.login("test@example.com", "password").await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn login_wrong_password_returns_invalid_credentials() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .returning(|_, _| Box::pin(async { Ok(false) }));
        mock.expect_delete_sessions_for_user().never();

        let svc = service(mock);
        let outcome = svc.login("test@example.com", "wrong").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    // ----- register tests -----

    #[tokio::test]
    async fn register_empty_fields_returns_empty_fields() {
        let svc = service(MockAuthRepository::new());
        let outcome = svc.register("", "password123", "name", Role::Student).await.unwrap();
        assert!(matches!(outcome, RegisterOutcome::EmptyFields));

        let svc = service(MockAuthRepository::new());
        let outcome = svc.register("a@b.com", "", "name", Role::Student).await.unwrap();
        assert!(matches!(outcome, RegisterOutcome::EmptyFields));

        let svc = service(MockAuthRepository::new());
        let outcome = svc.register("a@b.com", "password123", "  ", Role::Student).await.unwrap();
        assert!(matches!(outcome, RegisterOutcome::EmptyFields));
    }

    #[tokio::test]
    async fn register_short_password_returns_weak_password() {
        let svc = service(MockAuthRepository::new());
        let outcome = svc.register("a@b.com", "short", "name", Role::Educator).await.unwrap();
        assert!(matches!(outcome, RegisterOutcome::WeakPassword));
    }

    #[tokio::test]
    async fn register_email_taken_returns_email_taken() {
        let mut mock = MockAuthRepository::new();
        mock.expect_email_exists()
            .returning(|_| Box::pin(async { Ok(true) }));

        let svc = service(mock);
        let outcome = svc
            .register("taken@example.com", "password123", "name", Role::Student)
            .await
            .unwrap();

        assert!(matches!(outcome, RegisterOutcome::EmailTaken));
    }

    #[tokio::test]
    async fn register_stores_role_and_avatar_then_logs_in() {
        let mut mock = MockAuthRepository::new();
        mock.expect_email_exists()
            .returning(|_| Box::pin(async { Ok(false) }));
        mock.expect_create_user()
            .withf(|_, _, username, role, avatar| {
                username == "Ada Lovelace" && *role == Role::Educator && avatar.contains("Ada")
            })
            .returning(|_, _, _, _, _| Box::pin(async { Ok("user-9".to_string()) }));
        mock.expect_create_user_session()
            .returning(|_| Box::pin(async { Ok("session-abc".to_string()) }));

        let svc = service(mock);
        let outcome = svc
            .register("ada@example.com", "password123", "Ada Lovelace", Role::Educator)
            .await
            .unwrap();

        match outcome {
            RegisterOutcome::LoggedIn { token, user } => {
                assert_eq!(token, "session-abc");
                assert_eq!(user.id, "user-9");
                assert!(user.is_educator());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    // ----- restore / logout tests -----

    #[tokio::test]
    async fn restore_resolves_session_to_user() {
        let mut mock = MockAuthRepository::new();
        mock.expect_get_user_by_session()
            .withf(|id| id == "session-123")
            .returning(|_| Box::pin(async { Ok(Some(student("user-1"))) }));

        let svc = service(mock);
        let user = svc.restore("session-123").await.unwrap().unwrap();
        assert_eq!(user.id, "user-1");
    }

    #[tokio::test]
    async fn logout_deletes_session() {
        let mut mock = MockAuthRepository::new();
        mock.expect_delete_user_session()
            .withf(|id| id == "session-123")
            .returning(|_| Box::pin(async { Ok(()) }));

        let svc = service(mock);
        svc.logout("session-123").await.unwrap();
    }

    // ----- change_password tests -----

    #[tokio::test]
    async fn change_password_empty_fields_returns_empty_fields() {
        let svc = service(MockAuthRepository::new());
        let outcome = svc.change_password("u", "", "newpassword", "newpassword").await.unwrap();
        assert!(matches!(outcome, ChangePasswordOutcome::EmptyFields));

        let svc = service(MockAuthRepository::new());
        let outcome = svc.change_password("u", "old", "", "").await.unwrap();
        assert!(matches!(outcome, ChangePasswordOutcome::EmptyFields));
    }

    #[tokio::test]
    async fn change_password_mismatch_is_rejected_before_the_store() {
        let mut mock = MockAuthRepository::new();
        mock.expect_change_password().never();

        let svc = service(mock);
        let outcome = svc
            .change_password("u", "oldpassword", "newpassword", "newpassw0rd")
            .await
            .unwrap();
        assert!(matches!(outcome, ChangePasswordOutcome::Mismatch));
    }

    #[tokio::test]
    async fn change_password_short_returns_weak_password() {
        let svc = service(MockAuthRepository::new());
        let outcome = svc.change_password("u", "oldpassword", "short", "short").await.unwrap();
        assert!(matches!(outcome, ChangePasswordOutcome::WeakPassword));
    }

    #[tokio::test]
    async fn change_password_success() {
        let mut mock = MockAuthRepository::new();
        mock.expect_change_password()
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        let svc = service(mock);
        let outcome = svc
            .change_password("u", "oldpassword", "newpassword", "newpassword")
            .await
            .unwrap();
        assert!(matches!(outcome, ChangePasswordOutcome::Success));
    }

    #[tokio::test]
    async fn change_password_incorrect_returns_incorrect() {
        let mut mock = MockAuthRepository::new();
        mock.expect_change_password()
            .returning(|_, _, _| Box::pin(async { Ok(false) }));

        let svc = service(mock);
        let outcome = svc
            .change_password("u", "wrongpassword", "newpassword", "newpassword")
            .await
            .unwrap();
        assert!(matches!(outcome, ChangePasswordOutcome::IncorrectPassword));
    }
}
