diesel::table! {
    t_clipboard_history (id) {
        id -> BigInt,
        content -> Text,
        device_id -> Nullable<Text>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    t_sync_configuration (id) {
        id -> BigInt,
        sync_type -> Text,
        is_enabled -> Bool,
        config_data -> Text,
        last_sync_time -> Nullable<BigInt>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(t_clipboard_history, t_sync_configuration,);
