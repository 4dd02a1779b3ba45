use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::coupon::{normalize_code, Coupon, CouponDraft};
use crate::domain::errors::DomainError;
use crate::domain::ports::CouponRepository;
use crate::schema::coupons;

use super::models::{CouponChangeset, CouponRow, NewCouponRow};

/// Counts one use in a single conditional UPDATE, so concurrent checkouts
/// cannot push `used_count` past `usage_limit`.
pub(crate) fn increment_usage_in(conn: &mut PgConnection, id: Uuid) -> QueryResult<bool> {
    let updated = diesel::update(
        coupons::table
            .filter(coupons::id.eq(id))
            .filter(
                coupons::usage_limit
                    .eq(0)
                    .or(coupons::used_count.lt(coupons::usage_limit)),
            ),
    )
    .set((
        coupons::used_count.eq(coupons::used_count + 1),
        coupons::version.eq(coupons::version + 1),
    ))
    .execute(conn)?;

    Ok(updated == 1)
}

fn duplicate_code(e: DieselError, code: &str) -> DomainError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::Conflict(format!("coupon code {code} already exists"))
        }
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct DieselCouponRepository {
    pool: DbPool,
}

impl DieselCouponRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CouponRepository for DieselCouponRepository {
    fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        let mut conn = self.pool.get()?;

        coupons::table
            .select(CouponRow::as_select())
            .order(coupons::created_at.desc())
            .load(&mut conn)?
            .into_iter()
            .map(Coupon::try_from)
            .collect()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>, DomainError> {
        let mut conn = self.pool.get()?;

        coupons::table
            .find(id)
            .select(CouponRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Coupon::try_from)
            .transpose()
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let mut conn = self.pool.get()?;

        coupons::table
            .filter(coupons::code.eq(normalize_code(code)))
            .select(CouponRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Coupon::try_from)
            .transpose()
    }

    fn create(&self, draft: CouponDraft) -> Result<Coupon, DomainError> {
        let mut conn = self.pool.get()?;
        let code = draft.code.clone();

        diesel::insert_into(coupons::table)
            .values(&NewCouponRow::from(draft))
            .returning(CouponRow::as_returning())
            .get_result::<CouponRow>(&mut conn)
            .map_err(|e| duplicate_code(e, &code))?
            .try_into()
    }

    fn update(&self, coupon: &Coupon) -> Result<Coupon, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(
            coupons::table
                .filter(coupons::id.eq(coupon.id))
                .filter(coupons::version.eq(coupon.version)),
        )
        .set(&CouponChangeset::from(coupon))
        .returning(CouponRow::as_returning())
        .get_result::<CouponRow>(&mut conn)
        .optional()
        .map_err(|e| duplicate_code(e, &coupon.code))?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists: i64 = coupons::table
                    .filter(coupons::id.eq(coupon.id))
                    .count()
                    .get_result(&mut conn)?;
                if exists == 0 {
                    Err(DomainError::NotFound("Coupon"))
                } else {
                    Err(DomainError::Conflict(
                        "coupon was modified concurrently".into(),
                    ))
                }
            }
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(coupons::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn increment_usage(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(increment_usage_in(&mut conn, id)?)
    }
}
