//! Test configuration constants shared by the test database setup and fixtures.

/// Connection string for the private in-memory SQLite database each test runs against.
pub static TEST_DATABASE_URL: &str = "sqlite::memory:";

/// Username the example controller looks up when no username is supplied.
pub static TEST_DEFAULT_USERNAME: &str = "admin";

/// Password hash stored for fixture users. Never verified by anything under test.
pub static TEST_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGVzdA$dGVzdA";
