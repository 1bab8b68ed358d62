use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's own profile — includes the email, which is never exposed to
/// other users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub initials: String,
    pub avatar_color: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// What other users see: the chat sidebar, post authors, comment authors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub initials: String,
    pub avatar_color: String,
    pub avatar_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub instructions: String,
    pub time_minutes: u32,
    pub difficulty: String,
    pub servings: u32,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub created_at: DateTime<Utc>,
}

/// Chat messages are immutable once stored; only `is_read` changes.
/// The integer id doubles as the polling cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub peer: UserSummary,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: UserSummary,
    pub content: String,
    pub image_url: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// One meal-planner slot: at most one recipe per (day, meal type) within a
/// user's week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSlot {
    pub id: Uuid,
    pub day_of_week: String,
    pub meal_type: String,
    pub week_start_date: String,
    pub recipe: Recipe,
}
