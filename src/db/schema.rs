table! {
    reports (id) {
        id -> Integer,
        user_id -> Text,
        category -> Text,
        description -> Nullable<Text>,
        lat -> Double,
        lng -> Double,
        photo_url -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    votes (id) {
        id -> Integer,
        report_id -> Integer,
        user_id -> Text,
        created_at -> Timestamp,
    }
}

joinable!(votes -> reports (report_id));

allow_tables_to_appear_in_same_query!(
    reports,
    votes,
);
