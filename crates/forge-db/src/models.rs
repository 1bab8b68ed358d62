/// Database row types — these map directly to SQLite rows.
/// Distinct from the forge-types API models to keep the DB layer
/// independent.

#[derive(Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub initials: String,
    pub avatar_color: String,
    pub profile_picture: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: String,
}

pub struct SessionRow {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}

pub struct RecipeRow {
    pub id: String,
    pub title: String,
    pub instructions: String,
    pub time_minutes: i64,
    pub difficulty: String,
    pub servings: i64,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: String,
}

pub struct IngredientRow {
    pub id: i64,
    pub recipe_id: String,
    pub ingredient_name: String,
    pub quantity: String,
}

pub struct MealPlanRow {
    pub id: String,
    pub user_id: String,
    pub recipe_id: String,
    pub day_of_week: String,
    pub meal_type: String,
    pub week_start_date: String,
}

pub struct ChatMessageRow {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub message_text: String,
    pub is_read: bool,
    pub created_at: String,
}

/// One sidebar entry: the peer's id plus the newest message and how many
/// of their messages are still unread.
pub struct ConversationRow {
    pub peer_id: String,
    pub last_message: String,
    pub last_created_at: String,
    pub unread: i64,
}

pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub liked_by_me: bool,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: i64,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

/// Result of a like toggle; `owner_id` lets the caller notify the post
/// author.
pub struct PostLikeOutcome {
    pub liked: bool,
    pub likes_count: i64,
    pub owner_id: String,
}
