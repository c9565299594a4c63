diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        password_hash -> Text,
        created_at -> BigInt,
    }
}

diesel::table! {
    messages (id) {
        id -> Integer,
        sender_id -> Integer,
        content -> Text,
        timestamp -> BigInt,
    }
}

diesel::joinable!(messages -> users (sender_id));

diesel::allow_tables_to_appear_in_same_query!(users, messages);
