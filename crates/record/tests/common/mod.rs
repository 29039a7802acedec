#![allow(dead_code)]

use std::sync::Arc;

use elif_record::{attrs, Database, MemoryConnection, Model, Row};

pub struct User;

impl Model for User {
    const NAME: &'static str = "User";
}

pub struct Post;

impl Model for Post {
    const NAME: &'static str = "Post";
}

pub struct Profile;

impl Model for Profile {
    const NAME: &'static str = "Profile";
}

/// A fresh in-memory connection registered as the default connection
pub fn setup() -> (Arc<MemoryConnection>, Database) {
    let connection = Arc::new(MemoryConnection::new());
    let db = Database::with_connection("default", connection.clone());
    (connection, db)
}

pub fn user_row(id: i64, username: &str, country: &str) -> Row {
    attrs! {
        "id" => id,
        "username" => username,
        "country" => country,
        "created_at" => "2024-01-01 10:00:00",
        "updated_at" => "2024-01-01 10:00:00",
    }
}

pub fn seed_users(connection: &MemoryConnection) {
    connection.seed(
        "users",
        vec![
            user_row(1, "virk", "ind"),
            user_row(2, "romain", "uk"),
            user_row(3, "nikk", "ind"),
        ],
    );
}
