// Diesel table definitions for the local SQLite mirror.
// Kept in sync by hand with migrations/sqlite/001_initial_schema.sql.

diesel::table! {
    users (id) {
        id -> Text,
        email -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    videos (id) {
        id -> Text,
        user_id -> Nullable<Text>,
        youtube_id -> Text,
        title -> Nullable<Text>,
        duration -> Nullable<Integer>,
        thumbnail -> Nullable<Text>,
        status -> Text,
        job_id -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    transcripts (id) {
        id -> Text,
        video_id -> Text,
        text -> Text,
        language -> Text,
        token_count -> Nullable<Integer>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    summaries (id) {
        id -> Text,
        video_id -> Text,
        short_summary -> Nullable<Text>,
        long_summary -> Nullable<Text>,
        keywords -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    jobs (id) {
        id -> Text,
        video_id -> Nullable<Text>,
        status -> Text,
        progress -> Integer,
        result -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::joinable!(videos -> users (user_id));
diesel::joinable!(transcripts -> videos (video_id));
diesel::joinable!(summaries -> videos (video_id));
diesel::joinable!(jobs -> videos (video_id));

diesel::allow_tables_to_appear_in_same_query!(users, videos, transcripts, summaries, jobs,);
