use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Narrow contracts this crate consumes from systems it does not own
/// (spec.md §6.2). Each trait has one Postgres-backed implementation
/// against a minimal peripheral table, grounded on the teacher's
/// `auth::JwtService` / `auth::OAuthService` pattern of small
/// single-responsibility services hung off `AppState`, plus an
/// in-memory fake for unit-level engine tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: Uuid) -> sqlx::Result<Option<DirectoryUser>>;
    async fn list_users_by_ids(&self, ids: &[Uuid]) -> sqlx::Result<Vec<DirectoryUser>>;
}

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Atomic with the caller's transaction, the way `player_deals::create(&mut *tx, ...)`
    /// writes inside the finalizer's transaction in the teacher's results service.
    async fn credit(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
        amount: Decimal,
        kind: &str,
        description: &str,
        linked_entity: Uuid,
    ) -> sqlx::Result<Uuid>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Fire-and-forget within the transaction: failures are logged, never
    /// allowed to roll back the finalization they describe.
    async fn log(
        &self,
        conn: &mut sqlx::PgConnection,
        action: &str,
        user_id: Option<Uuid>,
        resource_type: &str,
        resource_id: Uuid,
        details: JsonValue,
    );
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_user(&self, id: Uuid) -> sqlx::Result<Option<DirectoryUser>> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, email, name, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, name, role)| DirectoryUser { id, email, name, role }))
    }

    async fn list_users_by_ids(&self, ids: &[Uuid]) -> sqlx::Result<Vec<DirectoryUser>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, email, name, role FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, email, name, role)| DirectoryUser { id, email, name, role })
            .collect())
    }
}

pub struct PgCreditLedger;

#[async_trait]
impl CreditLedger for PgCreditLedger {
    async fn credit(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
        amount: Decimal,
        kind: &str,
        description: &str,
        linked_entity: Uuid,
    ) -> sqlx::Result<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO credit_ledger_entries (id, user_id, amount, kind, description, linked_entity_id, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(kind)
        .bind(description)
        .bind(linked_entity)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }
}

pub struct PgAuditLog;

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn log(
        &self,
        conn: &mut sqlx::PgConnection,
        action: &str,
        user_id: Option<Uuid>,
        resource_type: &str,
        resource_id: Uuid,
        details: JsonValue,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (id, action, user_id, resource_type, resource_id, details, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(action)
        .bind(user_id)
        .bind(resource_type)
        .bind(resource_id)
        .bind(details)
        .execute(conn)
        .await;

        if let Err(err) = result {
            tracing::warn!(%err, action, %resource_id, "audit log write failed");
        }
    }
}

/// Used by unit-level engine tests and the in-process finalizer tests that
/// don't need a real Postgres peripheral schema.
pub struct FakeCollaborators {
    pub users: std::sync::Mutex<Vec<DirectoryUser>>,
    pub credits: std::sync::Mutex<Vec<(Uuid, Decimal, String)>>,
    pub audit_entries: std::sync::Mutex<Vec<String>>,
}

impl FakeCollaborators {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self {
            users: std::sync::Mutex::new(users),
            credits: std::sync::Mutex::new(Vec::new()),
            audit_entries: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UserDirectory for FakeCollaborators {
    async fn get_user(&self, id: Uuid) -> sqlx::Result<Option<DirectoryUser>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn list_users_by_ids(&self, ids: &[Uuid]) -> sqlx::Result<Vec<DirectoryUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CreditLedger for FakeCollaborators {
    async fn credit(
        &self,
        _conn: &mut sqlx::PgConnection,
        user_id: Uuid,
        amount: Decimal,
        kind: &str,
        _description: &str,
        _linked_entity: Uuid,
    ) -> sqlx::Result<Uuid> {
        self.credits
            .lock()
            .unwrap()
            .push((user_id, amount, kind.to_string()));
        Ok(Uuid::new_v4())
    }
}

#[async_trait]
impl AuditLog for FakeCollaborators {
    async fn log(
        &self,
        _conn: &mut sqlx::PgConnection,
        action: &str,
        _user_id: Option<Uuid>,
        _resource_type: &str,
        _resource_id: Uuid,
        _details: JsonValue,
    ) {
        self.audit_entries.lock().unwrap().push(action.to_string());
    }
}
