//! Domain records as stored in Postgres.
//!
//! Enumerations are stored as lowercase text columns; each enum carries the
//! `Display`/`TryFrom<String>` pair that `#[sqlx(try_from = "String")]`
//! relies on, plus snake_case serde for the JSON API.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -------------------------------------------------------------------------
// Users
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Staff,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "user" => Ok(Self::User),
            "staff" => Ok(Self::Staff),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub comment: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// -------------------------------------------------------------------------
// Clients and messages
// -------------------------------------------------------------------------

/// A mailing recipient. Identified by email for recipient-list purposes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Reusable email content. Read-only input to the mailer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub subject: String,
    pub content: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// -------------------------------------------------------------------------
// Newsletters
// -------------------------------------------------------------------------

/// How far `start_date` advances after each send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// Where a newsletter sits in its send cycle.
///
/// The job runner moves `Created -> Started -> Created` around each send;
/// deactivation via the toggle endpoint parks a newsletter at `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsletterStatus {
    Created,
    Started,
    Completed,
}

impl std::fmt::Display for NewsletterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Started => write!(f, "started"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl TryFrom<String> for NewsletterStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "created" => Ok(Self::Created),
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown newsletter status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Newsletter {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub send_time: NaiveTime,
    #[sqlx(try_from = "String")]
    pub frequency: Frequency,
    #[sqlx(try_from = "String")]
    pub status: NewsletterStatus,
    pub is_active: bool,
    pub owner_id: Option<Uuid>,
    pub message_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// -------------------------------------------------------------------------
// Delivery logs
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    Failure,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl TryFrom<String> for DeliveryStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(format!("unknown delivery status: {other}")),
        }
    }
}

/// One send attempt. Append-only; written exclusively by the job runner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeliveryLog {
    pub id: Uuid,
    pub sent_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: DeliveryStatus,
    pub server_response: Option<String>,
    pub newsletter_id: Uuid,
    pub message_id: Uuid,
}

// -------------------------------------------------------------------------
// Blog
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub preview: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_published: bool,
    pub views_count: i64,
}
