#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AuthorRow {
    pub(crate) id: i64,
    pub(crate) name_folded: String,
}
