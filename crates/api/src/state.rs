use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthConfig, JwtService};
use crate::collaborators::{
    AuditLog, CreditLedger, PgAuditLog, PgCreditLedger, PgUserDirectory, UserDirectory,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    auth_config: AuthConfig,
    jwt_service: JwtService,
    pub user_directory: Arc<dyn UserDirectory>,
    pub credit_ledger: Arc<dyn CreditLedger>,
    pub audit_log: Arc<dyn AuditLog>,
}

impl AppState {
    pub fn new(db: PgPool) -> anyhow::Result<Self> {
        let auth_config = AuthConfig::from_env()?;
        let jwt_service = JwtService::new(&auth_config);

        Ok(Self {
            user_directory: Arc::new(PgUserDirectory::new(db.clone())),
            credit_ledger: Arc::new(PgCreditLedger),
            audit_log: Arc::new(PgAuditLog),
            db,
            auth_config,
            jwt_service,
        })
    }

    /// Used by tests that need Postgres-backed collaborators swapped for
    /// in-memory fakes (spec.md §6.2 collaborators are genuinely external).
    pub fn with_collaborators(
        mut self,
        user_directory: Arc<dyn UserDirectory>,
        credit_ledger: Arc<dyn CreditLedger>,
        audit_log: Arc<dyn AuditLog>,
    ) -> Self {
        self.user_directory = user_directory;
        self.credit_ledger = credit_ledger;
        self.audit_log = audit_log;
        self
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    #[allow(dead_code)]
    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth_config
    }
}
