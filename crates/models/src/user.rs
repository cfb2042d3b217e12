use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user_credentials;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Credentials,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Credentials => Entity::has_one(user_credentials::Entity).into() }
    }
}

impl Related<user_credentials::Entity> for Entity {
    fn to() -> RelationDef { Relation::Credentials.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    common::validation::check_email(email).map_err(|msg| ModelError::Validation(msg.into()))
}

pub fn validate_full_name(name: &str) -> Result<(), ModelError> {
    common::validation::check_full_name(name).map_err(|msg| ModelError::Validation(msg.into()))
}

pub async fn create<C: ConnectionTrait>(db: &C, email: &str, full_name: &str, role: &str) -> Result<Model, ModelError> {
    validate_email(email)?;
    validate_full_name(full_name)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(full_name.trim().to_string()),
        role: Set(role.to_string()),
        status: Set("active".into()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

/// Insert the user row and its password credentials in one transaction.
///
/// Either both rows are committed or neither is; an error from the second
/// insert rolls back the first when the transaction is dropped.
pub async fn create_with_password(
    db: &DatabaseConnection,
    email: &str,
    full_name: &str,
    role: &str,
    password_hash: String,
    algorithm: &str,
) -> Result<(Model, user_credentials::Model), ModelError> {
    let txn = db.begin().await?;
    let user = create(&txn, email, full_name, role).await?;
    let credentials = user_credentials::upsert_password(&txn, user.id, password_hash, algorithm).await?;
    txn.commit().await?;
    Ok((user, credentials))
}

/// Active (not soft-deleted) user by email.
pub async fn find_active_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .filter(Column::DeletedAt.is_null())
        .one(db)
        .await?)
}

/// Active (not soft-deleted) user by id.
pub async fn find_active_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id)
        .filter(Column::DeletedAt.is_null())
        .one(db)
        .await?)
}

pub async fn soft_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id).one(db).await?.ok_or_else(|| ModelError::Validation("user not found".into()))?.into();
    found.deleted_at = Set(Some(Utc::now().into()));
    found.update(db).await?;
    Ok(())
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}
