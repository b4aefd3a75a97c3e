use exegete_ingest::Input;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InputRow {
    pub(crate) filename: String,
    pub(crate) hash: String,
}
impl From<InputRow> for Input {
    fn from(row: InputRow) -> Self {
        Self {
            filename: row.filename,
            hash: row.hash,
        }
    }
}
