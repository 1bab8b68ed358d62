pub(crate) mod chat;
pub(crate) mod meal_plans;
pub(crate) mod notifications;
pub(crate) mod posts;
pub(crate) mod recipes;
pub(crate) mod sessions;
pub(crate) mod users;

pub(crate) use users::user_from_row;
