//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Registered users. `email` is unique.
    users (id) {
        id -> Int8,
        email -> Text,
        name -> Text,
        avatar_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    projects (id) {
        id -> Int8,
        name -> Text,
        description -> Nullable<Text>,
        created_by -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (project, user) pair.
    project_members (project_id, user_id) {
        project_id -> Int8,
        user_id -> Int8,
        /// `viewer`, `member`, `admin` or `owner`.
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    apps (id) {
        id -> Int8,
        project_id -> Int8,
        name -> Text,
        /// Next version number to publish. Only moved by publishing.
        current_version -> Int8,
        /// JSON array of column headers.
        column_names -> Nullable<Jsonb>,
        key_column -> Nullable<Text>,
        value_column -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    string_items (id) {
        id -> Int8,
        app_id -> Int8,
        key -> Text,
        value -> Text,
        /// JSON object of extra column values.
        additional_columns -> Jsonb,
        /// `new`, `modified`, or NULL when published.
        status -> Nullable<Text>,
        modified_at -> Nullable<Timestamptz>,
        modified_by -> Nullable<Int8>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Published versions, unique per (app_id, version_number).
    versions (id) {
        id -> Int8,
        app_id -> Int8,
        version_number -> Int8,
        publisher_id -> Nullable<Int8>,
        publisher_name -> Nullable<Text>,
        notes -> Nullable<Text>,
        snapshot -> Jsonb,
        notifications -> Jsonb,
        published_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    project_members,
    apps,
    string_items,
    versions,
);
