use serde::Serialize;

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}
