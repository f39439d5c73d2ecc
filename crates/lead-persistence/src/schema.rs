//! Esquema Diesel declarado a mano. Reemplazable con `diesel print-schema`.

diesel::table! {
    leads (id) {
        id -> Uuid,
        name -> Varchar,
        owner_type -> Text,
        owner_id -> Nullable<Uuid>,
        is_buyer -> Bool,
        is_seller -> Bool,
    }
}

diesel::table! {
    pipeline_statuses (id) {
        id -> Uuid,
        model_id -> Uuid,
        name -> Varchar,
        color -> Text,
        position -> Int4,
    }
}

diesel::table! {
    boards (id) {
        id -> Uuid,
        flow_type -> Text,
        status_id -> Uuid,
        position -> Int4,
        color -> Text,
        scope_type -> Text,
        scope_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    pipeline_positions (lead_id, flow_type) {
        lead_id -> Uuid,
        flow_type -> Text,
        current_board_id -> Uuid,
        current_status_id -> Uuid,
        entered_at -> Timestamptz,
    }
}

diesel::table! {
    appointments (id) {
        id -> Uuid,
        lead_id -> Uuid,
        scheduled_for -> Timestamptz,
        status -> Text,
        notes -> Nullable<Varchar>,
        created_at -> Timestamptz,
        created_by -> Uuid,
    }
}

diesel::table! {
    audit_log (seq) {
        seq -> BigInt,
        ts -> Timestamptz,
        event_type -> Text,
        payload -> Jsonb,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    leads,
    pipeline_statuses,
    boards,
    pipeline_positions,
    appointments,
    audit_log,
);
