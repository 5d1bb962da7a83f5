//! SQL persistence backend (SQLite by default, via SeaORM)
//!
//! Implements the persistence traits with direct SeaORM queries. The schema is
//! derived from the entity definitions and created on connect if missing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use pithos_common::{DelegationType, PithosError};
use sea_orm::{
    prelude::Expr,
    sea_query::OnConflict,
    *,
};

use crate::entity::{member, motion, motion_option, vote};
use crate::model::*;
use crate::traits::*;

/// SQL database persistence service
pub struct SqlPersistService {
    db: DatabaseConnection,
}

impl SqlPersistService {
    /// Wrap an existing connection. The schema is not touched.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect to `url` and make sure all tables exist
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let mut options = ConnectOptions::new(url.to_owned());
        options.sqlx_logging(false);
        // Each connection to an in-memory SQLite database sees its own database
        if url.contains(":memory:") {
            options.max_connections(1).min_connections(1);
        } else {
            options.max_connections(max_connections);
        }

        let db = Database::connect(options)
            .await
            .map_err(|e| PithosError::DatabaseError(format!("cannot open {}: {}", url, e)))?;
        let service = Self::new(db);
        service.create_schema().await?;
        tracing::info!(backend = service.backend_name(), "Database connected");
        Ok(service)
    }

    /// Get a reference to the underlying database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create every table that does not exist yet
    pub async fn create_schema(&self) -> anyhow::Result<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let statements = [
            schema.create_table_from_entity(member::Entity),
            schema.create_table_from_entity(motion::Entity),
            schema.create_table_from_entity(motion_option::Entity),
            schema.create_table_from_entity(vote::Entity),
        ];
        for mut statement in statements {
            statement.if_not_exists();
            self.db.execute(backend.build(&statement)).await?;
        }
        Ok(())
    }

    /// Attach options to a batch of motions with a single query
    async fn with_options(&self, motions: Vec<motion::Model>) -> anyhow::Result<Vec<MotionInfo>> {
        if motions.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = motions.iter().map(|m| m.id).collect();
        let mut grouped: HashMap<i32, Vec<motion_option::Model>> = HashMap::new();
        for option in motion_option::Entity::find()
            .filter(motion_option::Column::MotionId.is_in(ids))
            .all(&self.db)
            .await?
        {
            grouped.entry(option.motion_id).or_default().push(option);
        }

        Ok(motions
            .into_iter()
            .map(|m| {
                let options = grouped.remove(&m.id).unwrap_or_default();
                MotionInfo::from_models(m, options)
            })
            .collect())
    }
}

fn now_utc() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

// ============================================================================
// PersistenceService implementation
// ============================================================================

#[async_trait]
impl PersistenceService for SqlPersistService {
    fn backend_name(&self) -> &'static str {
        match self.db.get_database_backend() {
            DbBackend::Sqlite => "sqlite",
            DbBackend::MySql => "mysql",
            DbBackend::Postgres => "postgres",
        }
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        // Execute a simple query to verify connectivity
        member::Entity::find()
            .select_only()
            .column_as(Expr::cust("1"), "health")
            .into_tuple::<i32>()
            .one(&self.db)
            .await
            .map_err(|e| PithosError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// MemberPersistence implementation
// ============================================================================

#[async_trait]
impl MemberPersistence for SqlPersistService {
    async fn member_get(&self, member_id: i64) -> anyhow::Result<Option<MemberInfo>> {
        Ok(member::Entity::find_by_id(member_id)
            .one(&self.db)
            .await?
            .map(MemberInfo::from))
    }

    async fn member_ensure(&self, member_id: i64) -> anyhow::Result<MemberInfo> {
        let now = now_utc();
        let entity = member::ActiveModel {
            id: Set(member_id),
            accepts_delegates: Set(true),
            delegate_id: Set(None),
            delegation_type: Set(None),
            gmt_create: Set(now),
            gmt_modified: Set(now),
        };
        let inserted = member::Entity::insert(entity)
            .on_conflict(
                OnConflict::column(member::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        if inserted > 0 {
            tracing::debug!(member_id, "Registered new member");
        }

        self.member_get(member_id)
            .await?
            .ok_or_else(|| PithosError::MemberNotFound(member_id).into())
    }

    async fn member_find_all(&self) -> anyhow::Result<Vec<MemberInfo>> {
        Ok(member::Entity::find()
            .order_by_asc(member::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(MemberInfo::from)
            .collect())
    }

    async fn member_set_accepts_delegates(
        &self,
        member_id: i64,
        accepts: bool,
    ) -> anyhow::Result<bool> {
        let result = member::Entity::update_many()
            .col_expr(member::Column::AcceptsDelegates, Expr::value(accepts))
            .col_expr(member::Column::GmtModified, Expr::value(now_utc()))
            .filter(member::Column::Id.eq(member_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn member_set_delegate(
        &self,
        member_id: i64,
        delegate: Option<(i64, DelegationType)>,
    ) -> anyhow::Result<bool> {
        // Delegate and type are always written together
        let (delegate_id, delegation_type) = match delegate {
            Some((id, kind)) => (Some(id), Some(kind.code())),
            None => (None, None),
        };
        let result = member::Entity::update_many()
            .col_expr(member::Column::DelegateId, Expr::value(delegate_id))
            .col_expr(member::Column::DelegationType, Expr::value(delegation_type))
            .col_expr(member::Column::GmtModified, Expr::value(now_utc()))
            .filter(member::Column::Id.eq(member_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn member_find_constituents(&self, member_id: i64) -> anyhow::Result<Vec<MemberInfo>> {
        Ok(member::Entity::find()
            .filter(member::Column::DelegateId.eq(member_id))
            .order_by_asc(member::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(MemberInfo::from)
            .collect())
    }
}

// ============================================================================
// MotionPersistence implementation
// ============================================================================

#[async_trait]
impl MotionPersistence for SqlPersistService {
    async fn motion_create(&self, motion: NewMotion, now: NaiveDateTime) -> anyhow::Result<MotionInfo> {
        if motion.options.len() < 2 {
            return Err(PithosError::IllegalArgument(
                "a motion needs at least two options".to_string(),
            )
            .into());
        }

        let tx = self.db.begin().await?;

        let inserted = motion::ActiveModel {
            description: Set(motion.description),
            author_id: Set(motion.author_id),
            expires: Set(motion.expires),
            closed: Set(false),
            gmt_create: Set(now),
            ..Default::default()
        }
        .insert(&tx)
        .await?;

        let options: Vec<motion_option::ActiveModel> = motion
            .options
            .iter()
            .zip(1..)
            .map(|(description, option_no)| motion_option::ActiveModel {
                motion_id: Set(inserted.id),
                option_no: Set(option_no),
                description: Set(description.clone()),
            })
            .collect();
        motion_option::Entity::insert_many(options)
            .exec_without_returning(&tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            motion_id = inserted.id,
            author_id = inserted.author_id,
            options = motion.options.len(),
            "Motion created"
        );

        self.motion_get(inserted.id)
            .await?
            .ok_or_else(|| PithosError::MotionNotFound(inserted.id).into())
    }

    async fn motion_get(&self, motion_id: i32) -> anyhow::Result<Option<MotionInfo>> {
        let Some(model) = motion::Entity::find_by_id(motion_id).one(&self.db).await? else {
            return Ok(None);
        };
        let options = model
            .find_related(motion_option::Entity)
            .all(&self.db)
            .await?;
        Ok(Some(MotionInfo::from_models(model, options)))
    }

    async fn motion_find_running(&self, now: NaiveDateTime) -> anyhow::Result<Vec<MotionInfo>> {
        let motions = motion::Entity::find()
            .filter(motion::Column::Expires.gt(now))
            .filter(motion::Column::Closed.eq(false))
            .order_by_asc(motion::Column::Expires)
            .order_by_asc(motion::Column::Id)
            .all(&self.db)
            .await?;
        self.with_options(motions).await
    }

    async fn motion_find_expired_open(&self, now: NaiveDateTime) -> anyhow::Result<Vec<MotionInfo>> {
        let motions = motion::Entity::find()
            .filter(motion::Column::Expires.lte(now))
            .filter(motion::Column::Closed.eq(false))
            .order_by_asc(motion::Column::Expires)
            .order_by_asc(motion::Column::Id)
            .all(&self.db)
            .await?;
        self.with_options(motions).await
    }

    async fn motion_mark_closed(&self, motion_id: i32) -> anyhow::Result<bool> {
        let result = motion::Entity::update_many()
            .col_expr(motion::Column::Closed, Expr::value(true))
            .filter(motion::Column::Id.eq(motion_id))
            .filter(motion::Column::Closed.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// VotePersistence implementation
// ============================================================================

#[async_trait]
impl VotePersistence for SqlPersistService {
    async fn vote_cast(
        &self,
        member_id: i64,
        motion_id: i32,
        selection: i32,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        let entity = vote::ActiveModel {
            member_id: Set(member_id),
            motion_id: Set(motion_id),
            selection: Set(selection),
            gmt_modified: Set(now),
        };
        vote::Entity::insert(entity)
            .on_conflict(
                OnConflict::columns([vote::Column::MemberId, vote::Column::MotionId])
                    .update_columns([vote::Column::Selection, vote::Column::GmtModified])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn vote_withdraw(&self, member_id: i64, motion_id: i32) -> anyhow::Result<bool> {
        let result = vote::Entity::delete_many()
            .filter(vote::Column::MemberId.eq(member_id))
            .filter(vote::Column::MotionId.eq(motion_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn vote_get(&self, member_id: i64, motion_id: i32) -> anyhow::Result<Option<VoteInfo>> {
        Ok(vote::Entity::find_by_id((member_id, motion_id))
            .one(&self.db)
            .await?
            .map(VoteInfo::from))
    }

    async fn vote_find_by_motion(&self, motion_id: i32) -> anyhow::Result<Vec<VoteInfo>> {
        Ok(vote::Entity::find()
            .filter(vote::Column::MotionId.eq(motion_id))
            .order_by_asc(vote::Column::MemberId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(VoteInfo::from)
            .collect())
    }
}
