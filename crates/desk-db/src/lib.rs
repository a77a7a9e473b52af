use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use desk_core::{
    Holding, HoldingChange, HoldingStore, Order, OrderKey, OrderStore, OrderTicket, Position,
    PositionStore, QuantityOverflow, SettlementStore, Side,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;

pub const ENV_DB_URL: &str = "DESK_DATABASE_URL";

/// Connect to Postgres using DESK_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='holdings'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_holdings_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_holdings_table: bool,
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn holding_from_row(row: &PgRow) -> Result<Holding> {
    Ok(Holding {
        name: row.try_get("name")?,
        qty: row.try_get("qty")?,
        avg: row.try_get("avg")?,
        price: row.try_get("price")?,
        net: row.try_get("net")?,
        day: row.try_get("day")?,
        is_loss: row.try_get("is_loss")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    Ok(Order {
        name: row.try_get("name")?,
        mode: Side::parse(&row.try_get::<String, _>("mode")?)?,
        qty: row.try_get("qty")?,
        price: row.try_get("price")?,
    })
}

fn position_from_row(row: &PgRow) -> Result<Position> {
    Ok(Position {
        product: row.try_get("product")?,
        name: row.try_get("name")?,
        qty: row.try_get("qty")?,
        avg: row.try_get("avg")?,
        price: row.try_get("price")?,
        net: row.try_get("net")?,
        day: row.try_get("day")?,
        is_loss: row.try_get("is_loss")?,
    })
}

// ---------------------------------------------------------------------------
// Statements (shared by pool and transaction paths)
// ---------------------------------------------------------------------------

async fn upsert_order(
    conn: &mut PgConnection,
    key: &OrderKey,
    delta_qty: i64,
    new_price: f64,
) -> Result<Order> {
    let row = sqlx::query(
        r#"
        insert into orders (name, mode, qty, price)
        values ($1, $2, $3, $4)
        on conflict (name, mode) do update
          set qty = orders.qty + excluded.qty,
              price = excluded.price
        returning name, mode, qty, price
        "#,
    )
    .bind(&key.name)
    .bind(key.mode.as_str())
    .bind(delta_qty)
    .bind(new_price)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_numeric_out_of_range(&e) {
            anyhow::Error::new(QuantityOverflow(format!(
                "order quantity overflow for {} {}",
                key.name, key.mode
            )))
        } else {
            anyhow::Error::new(e).context("upsert_order failed")
        }
    })?;

    order_from_row(&row)
}

/// SQLSTATE 22003: `bigint out of range` on the ledger increment.
fn is_numeric_out_of_range(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .map_or(false, |code| code == "22003")
}

async fn insert_holding(conn: &mut PgConnection, h: &Holding) -> Result<Holding> {
    let row = sqlx::query(
        r#"
        insert into holdings (name, qty, avg, price, net, day, is_loss)
        values ($1, $2, $3, $4, $5, $6, $7)
        returning name, qty, avg, price, net, day, is_loss
        "#,
    )
    .bind(&h.name)
    .bind(h.qty)
    .bind(h.avg)
    .bind(h.price)
    .bind(&h.net)
    .bind(&h.day)
    .bind(h.is_loss)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("insert_holding failed: {}", h.name))?;

    holding_from_row(&row)
}

async fn update_holding(conn: &mut PgConnection, h: &Holding) -> Result<Holding> {
    let row = sqlx::query(
        r#"
        update holdings
        set qty = $2,
            avg = $3,
            price = $4,
            net = $5,
            day = $6,
            is_loss = $7
        where name = $1
        returning name, qty, avg, price, net, day, is_loss
        "#,
    )
    .bind(&h.name)
    .bind(h.qty)
    .bind(h.avg)
    .bind(h.price)
    .bind(&h.net)
    .bind(&h.day)
    .bind(h.is_loss)
    .fetch_optional(&mut *conn)
    .await
    .context("update_holding failed")?;

    match row {
        Some(row) => holding_from_row(&row),
        None => Err(anyhow!("holding not found: {}", h.name)),
    }
}

async fn remove_holding(conn: &mut PgConnection, name: &str) -> Result<()> {
    sqlx::query("delete from holdings where name = $1")
        .bind(name)
        .execute(&mut *conn)
        .await
        .context("delete_holding failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// Postgres implementation of every desk store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn upsert_increment(
        &self,
        key: &OrderKey,
        delta_qty: i64,
        new_price: f64,
    ) -> Result<Order> {
        let mut conn = self.pool.acquire().await.context("acquire failed")?;
        upsert_order(&mut conn, key, delta_qty, new_price).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("select name, mode, qty, price from orders order by name, mode")
            .fetch_all(&self.pool)
            .await
            .context("list_orders failed")?;
        rows.iter().map(order_from_row).collect()
    }
}

#[async_trait]
impl HoldingStore for PgStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Holding>> {
        let row = sqlx::query(
            r#"
            select name, qty, avg, price, net, day, is_loss
            from holdings
            where name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("find_holding failed")?;

        row.as_ref().map(holding_from_row).transpose()
    }

    async fn create(&self, holding: &Holding) -> Result<Holding> {
        let mut conn = self.pool.acquire().await.context("acquire failed")?;
        insert_holding(&mut conn, holding).await
    }

    async fn save(&self, holding: &Holding) -> Result<Holding> {
        let mut conn = self.pool.acquire().await.context("acquire failed")?;
        update_holding(&mut conn, holding).await
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("acquire failed")?;
        remove_holding(&mut conn, name).await
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>> {
        let rows = sqlx::query(
            "select name, qty, avg, price, net, day, is_loss from holdings order by name",
        )
        .fetch_all(&self.pool)
        .await
        .context("list_holdings failed")?;
        rows.iter().map(holding_from_row).collect()
    }

    async fn insert_holdings(&self, batch: &[Holding]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("begin failed")?;
        for h in batch {
            insert_holding(&mut tx, h).await?;
        }
        tx.commit().await.context("commit insert_holdings failed")?;
        Ok(())
    }
}

#[async_trait]
impl PositionStore for PgStore {
    async fn list_positions(&self) -> Result<Vec<Position>> {
        let rows = sqlx::query(
            r#"
            select product, name, qty, avg, price, net, day, is_loss
            from positions
            order by position_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list_positions failed")?;
        rows.iter().map(position_from_row).collect()
    }

    async fn insert_positions(&self, batch: &[Position]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("begin failed")?;
        for p in batch {
            sqlx::query(
                r#"
                insert into positions (product, name, qty, avg, price, net, day, is_loss)
                values ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&p.product)
            .bind(&p.name)
            .bind(p.qty)
            .bind(p.avg)
            .bind(p.price)
            .bind(&p.net)
            .bind(&p.day)
            .bind(p.is_loss)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("insert_position failed: {}", p.name))?;
        }
        tx.commit().await.context("commit insert_positions failed")?;
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for PgStore {
    /// Order increment and holding change in one transaction.
    async fn commit_settlement(&self, ticket: &OrderTicket, change: &HoldingChange) -> Result<Order> {
        let mut tx = self.pool.begin().await.context("begin failed")?;

        let order = upsert_order(&mut tx, &ticket.key(), ticket.qty(), ticket.price()).await?;
        match change {
            HoldingChange::Create(h) => {
                insert_holding(&mut tx, h).await?;
            }
            HoldingChange::Update(h) => {
                update_holding(&mut tx, h).await?;
            }
            HoldingChange::Delete { name } => remove_holding(&mut tx, name).await?,
        }

        tx.commit().await.context("commit settlement failed")?;
        debug!(name = ticket.name(), mode = %ticket.mode(), "settlement committed");
        Ok(order)
    }
}
