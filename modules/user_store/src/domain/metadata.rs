use crate::contract::model::FieldMetadata;

fn field(
    name: &'static str,
    type_name: &'static str,
    unique: bool,
    generated: bool,
    constraints: &[&'static str],
) -> FieldMetadata {
    FieldMetadata {
        name,
        type_name,
        nullable: false,
        unique,
        generated,
        constraints: constraints.to_vec(),
    }
}

/// Persisted attributes of a user, in column order.
pub fn user_fields() -> Vec<FieldMetadata> {
    vec![
        field("id", "i64", true, true, &["primary key", "assigned sequentially"]),
        field("name", "string", false, false, &["not blank", "2..=50 characters"]),
        field("email", "string", true, false, &["not blank", "email address"]),
        field("department", "string", false, false, &["not blank"]),
        field("role", "string", false, false, &["not blank"]),
        field("active", "bool", false, false, &["defaults to true"]),
        field("created_at", "timestamp (UTC)", false, true, &["immutable"]),
        field("updated_at", "timestamp (UTC)", false, true, &["refreshed on update"]),
    ]
}
