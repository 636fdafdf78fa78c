//! Esquema Diesel (escrito a mano; equivalente a `diesel print-schema`).

diesel::table! {
    documents (collection, id) {
        collection -> Text,
        id -> Text,
        body -> Jsonb,
        updated_at -> Timestamptz,
    }
}
