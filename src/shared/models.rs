pub mod schema {
    diesel::table! {
        courses (id) {
            id -> Uuid,
            title -> Text,
            description -> Text,
            video_url -> Nullable<Text>,
            quiz_data -> Nullable<Jsonb>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        enrollments (id) {
            id -> Uuid,
            user_id -> Uuid,
            course_id -> Uuid,
            progress -> Float8,
            completed -> Bool,
            quiz_score -> Nullable<Int4>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::joinable!(enrollments -> courses (course_id));
    diesel::allow_tables_to_appear_in_same_query!(courses, enrollments);
}

pub use schema::*;
