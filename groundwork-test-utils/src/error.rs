use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    #[error("Fixture refers to unknown {kind} '{name}', add it to the builder first")]
    UnknownFixture { kind: &'static str, name: String },
}
