// Table definitions matching db/schema.rs. Keep the two in sync.

diesel::table! {
    follows (follower_id, followed_id) {
        follower_id -> BigInt,
        followed_id -> BigInt,
        created_at -> Text,
    }
}

diesel::table! {
    hikes (id) {
        id -> BigInt,
        name -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    review_upvotes (review_id, user_id) {
        review_id -> BigInt,
        user_id -> BigInt,
        created_at -> Text,
    }
}

diesel::table! {
    reviews (id) {
        id -> BigInt,
        hike_id -> BigInt,
        author_id -> BigInt,
        rating_halves -> Integer,
        body -> Nullable<Text>,
        upvote_count -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    users (id) {
        id -> BigInt,
        username -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(review_upvotes -> reviews (review_id));
diesel::joinable!(reviews -> hikes (hike_id));
diesel::joinable!(reviews -> users (author_id));

diesel::allow_tables_to_appear_in_same_query!(
    follows,
    hikes,
    review_upvotes,
    reviews,
    users,
);
