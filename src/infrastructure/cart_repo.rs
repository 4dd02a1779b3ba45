use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, carts};

use super::models::{cart_from_rows, CartItemRow, CartRow};

fn load_cart(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Cart>, DomainError> {
    let cart = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartRow::as_select())
        .first(conn)
        .optional()?;

    let Some(cart) = cart else {
        return Ok(None);
    };

    let items = CartItemRow::belonging_to(&cart)
        .select(CartItemRow::as_select())
        .order(cart_items::position.asc())
        .load(conn)?;

    Ok(Some(cart_from_rows(cart, items)))
}

/// Empties a cart in the caller's transaction.
pub(crate) fn clear_cart_in(conn: &mut PgConnection, cart_id: Uuid) -> QueryResult<()> {
    diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id))).execute(conn)?;
    diesel::update(carts::table.find(cart_id))
        .set(carts::updated_at.eq(Utc::now()))
        .execute(conn)?;
    Ok(())
}

#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn find_by_user(&self, user_id: Uuid) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;
        load_cart(&mut conn, user_id)
    }

    fn get_or_create(&self, user_id: Uuid) -> Result<Cart, DomainError> {
        let mut conn = self.pool.get()?;

        if let Some(cart) = load_cart(&mut conn, user_id)? {
            return Ok(cart);
        }

        // A concurrent request may have created the cart; the unique user_id
        // index makes this insert a no-op in that case.
        diesel::insert_into(carts::table)
            .values(&CartRow {
                id: Uuid::new_v4(),
                user_id,
                updated_at: Utc::now(),
            })
            .on_conflict(carts::user_id)
            .do_nothing()
            .execute(&mut conn)?;

        load_cart(&mut conn, user_id)?
            .ok_or_else(|| DomainError::Internal(format!("cart for user {user_id} vanished")))
    }

    fn save(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::update(carts::table.find(cart.id))
                .set(carts::updated_at.eq(cart.updated_at))
                .execute(conn)?;

            diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart.id)))
                .execute(conn)?;

            let rows: Vec<CartItemRow> = cart
                .items
                .iter()
                .zip(0..)
                .map(|(item, position)| CartItemRow::from_item(cart.id, position, item))
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(cart_items::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            Ok(())
        })
    }
}
