use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ChatMessage, Comment, Conversation, MealSlot, Notification, Post, Recipe, UserProfile,
    UserSummary,
};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Accepts the username or the account email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserProfile,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
}

/// Public profile plus the counters shown on the profile page.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserSummary,
    pub followers: i64,
    pub following: i64,
    pub posts: i64,
}

// -- Recipe search --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
    pub ingredients: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeMatch {
    pub recipe: Recipe,
    /// Recipe ingredients covered by the user's list.
    pub matched: Vec<String>,
    /// Recipe ingredients the user still needs.
    pub needed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub recipes: Vec<RecipeMatch>,
}

// -- Recipes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub instructions: String,
    pub time_minutes: u32,
    pub difficulty: String,
    pub servings: u32,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub ingredients: Vec<NewIngredient>,
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub success: bool,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub success: bool,
    pub recipe: Recipe,
}

/// Save toggle outcome: `action` is `"saved"` or `"unsaved"`.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub action: String,
}

// -- Meal planner --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMealRequest {
    pub recipe_id: Uuid,
    pub day_of_week: String,
    pub meal_type: String,
    pub week_start_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveMealRequest {
    pub day_of_week: String,
    pub meal_type: String,
    pub week_start_date: String,
}

#[derive(Debug, Serialize)]
pub struct MealPlanResponse {
    pub success: bool,
    pub week_start_date: String,
    pub slots: Vec<MealSlot>,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatRequest {
    pub receiver_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkChatReadRequest {
    pub peer_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SendChatResponse {
    pub success: bool,
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub success: bool,
    pub conversations: Vec<Conversation>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub success: bool,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<Comment>,
}

/// Like toggle outcome: `action` is `"liked"` or `"unliked"`.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    pub action: String,
    pub likes_count: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub success: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub success: bool,
    pub count: i64,
}
