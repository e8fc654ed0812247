use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::Result;
use libsql::params;
use ulid::Ulid;

use super::helpers::query_optional;
use super::models::{AuthUser, Role};
use super::{now, Db};

const USER_COLUMNS: &str = "u.id, u.email, u.username, u.role, u.avatar";

impl Db {
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
        avatar: &str,
    ) -> Result<String> {
        let password_hash = hash_password(password)?;
        let user_id = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            r#"INSERT INTO users (id, email, password_hash, username, role, avatar, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                user_id.as_str(),
                email,
                password_hash,
                username,
                role.as_str(),
                avatar,
                now()
            ],
        )
        .await?;

        tracing::info!("new user created: id={user_id}, email={email}, role={role}");
        Ok(user_id)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = ?"),
            params![email],
            AuthUser::from_row,
        )
        .await
    }

    pub async fn find_user_by_id(&self, user_id: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?"),
            params![user_id],
            AuthUser::from_row,
        )
        .await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        let conn = self.connect()?;
        let stored_hash = query_optional(
            &conn,
            "SELECT password_hash FROM users WHERE email = ?",
            params![email],
            |row| Ok(row.get::<String>(0)?),
        )
        .await?;

        match stored_hash {
            Some(hash) => Ok(verify_password(password, &hash)),
            None => Ok(false),
        }
    }

    pub async fn create_user_session(&self, user_id: &str) -> Result<String> {
        let session = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO user_sessions (id, user_id, created_at) VALUES (?, ?, ?)",
            params![session.as_str(), user_id, now()],
        )
        .await?;

        tracing::info!("new user session created for user_id={user_id}");
        Ok(session)
    }

    pub async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            &format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM user_sessions s
                JOIN users u ON u.id = s.user_id
                WHERE s.id = ?
                "#
            ),
            params![session_id],
            AuthUser::from_row,
        )
        .await
    }

    /// Session tokens currently issued for `user_id`.
    pub async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        super::helpers::query_all(
            &conn,
            "SELECT id FROM user_sessions WHERE user_id = ?",
            params![user_id],
            |row| Ok(row.get::<String>(0)?),
        )
        .await
    }

    pub async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM user_sessions WHERE id = ?",
            params![session_id],
        )
        .await?;
        Ok(())
    }

    /// Removes every session of `user_id`. Returns how many were removed.
    pub async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64> {
        let conn = self.connect()?;
        let removed = conn
            .execute(
                "DELETE FROM user_sessions WHERE user_id = ?",
                params![user_id],
            )
            .await?;

        if removed > 0 {
            tracing::info!("invalidated {removed} prior session(s) for user_id={user_id}");
        }
        Ok(removed)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.connect()?;
        let row = conn
            .query("SELECT 1 FROM users WHERE email = ?", params![email])
            .await?
            .next()
            .await?;
        Ok(row.is_some())
    }

    /// Change password for an authenticated user. Verifies current password first.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<bool> {
        let conn = self.connect()?;
        let stored_hash = query_optional(
            &conn,
            "SELECT password_hash FROM users WHERE id = ?",
            params![user_id],
            |row| Ok(row.get::<String>(0)?),
        )
        .await?;

        let Some(stored_hash) = stored_hash else {
            return Ok(false);
        };

        if !verify_password(current_password, &stored_hash) {
            return Ok(false);
        }

        let new_hash = hash_password(new_password)?;
        conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![new_hash, user_id],
        )
        .await?;

        tracing::info!("password changed for user_id={user_id}");
        Ok(true)
    }
}

/// Run argon2 hashing on a dedicated thread with a large stack to avoid
/// stack overflow in debug builds.
fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| color_eyre::eyre::eyre!("failed to hash password: {e}"))
        })?
        .join()
        .map_err(|_| color_eyre::eyre::eyre!("hash thread panicked"))?
}

fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let Ok(parsed_hash) = PasswordHash::new(&hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .map(|h| h.join().unwrap_or(false))
        .unwrap_or(false)
}
