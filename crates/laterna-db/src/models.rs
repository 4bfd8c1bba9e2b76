//! Database row types. These map directly to SQLite rows and are kept
//! separate from the laterna-types wire models.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: String,
}
