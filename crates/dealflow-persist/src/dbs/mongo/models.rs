use mongodb::bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::{NewThread, Thread, User, UserRole};

/// MongoDB-specific Thread model (uses ObjectId and BSON dates)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarized_message_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_role: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_activity_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// MongoDB-specific User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: UserRole,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<NewThread> for MongoThread {
    fn from(thread: NewThread) -> Self {
        Self {
            id: ObjectId::new(),
            user_id: thread.user_id,
            session_id: thread.session_id,
            agent_thread_id: None,
            summary: thread.summary,
            summarized_message_count: None,
            last_role: None,
            last_activity_at: thread.created_at,
            created_at: thread.created_at,
            updated_at: thread.created_at,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id.to_hex(),
            user_id: thread.user_id,
            session_id: thread.session_id,
            agent_thread_id: thread.agent_thread_id,
            summary: thread.summary,
            // Negative counts never come from this crate; treat them as absent
            summarized_message_count: thread
                .summarized_message_count
                .and_then(|c| u64::try_from(c).ok()),
            last_role: thread.last_role,
            last_activity_at: thread.last_activity_at,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

impl From<MongoUser> for User {
    fn from(user: MongoUser) -> Self {
        Self {
            id: user.id.to_hex(),
            subject: user.subject,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}
