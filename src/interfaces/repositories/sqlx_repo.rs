use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxUserRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxSessionRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxImageRepo {
    pub pool: PgPool,
}
