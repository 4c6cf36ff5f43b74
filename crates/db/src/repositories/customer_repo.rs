//! Repository for the `customers` table.
//!
//! A customer profile never exists without its credential: creation, email
//! changes and deletion touch both tables inside one transaction.

use sitetrack_core::roles::Role;
use sitetrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::customer::{CreateCustomer, Customer, CustomerDeletion, UpdateCustomer};

const COLUMNS: &str = "id, credential_id, name, email, contact_number, address, square_feet, \
                       site_location, building_type, created_by, created_at, updated_at";

/// Provides CRUD operations for customer profiles.
pub struct CustomerRepo;

impl CustomerRepo {
    /// Create a customer-role credential and the profile referencing it.
    ///
    /// A duplicate email fails on `uq_credentials_email` and nothing is written.
    pub async fn create_with_credential(
        pool: &PgPool,
        input: &CreateCustomer,
        password_hash: &str,
        created_by: DbId,
    ) -> Result<Customer, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (credential_id,): (DbId,) = sqlx::query_as(
            "INSERT INTO credentials (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(password_hash)
        .bind(Role::Customer)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO customers
                (credential_id, name, email, contact_number, address, square_feet,
                 site_location, building_type, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(credential_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.contact_number)
            .bind(&input.address)
            .bind(input.square_feet)
            .bind(&input.site_location)
            .bind(input.building_type)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(customer)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the profile attached to a credential, if any.
    pub async fn find_by_credential_id(
        pool: &PgPool,
        credential_id: DbId,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE credential_id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(credential_id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve only the profile id for a credential.
    pub async fn find_id_by_credential_id(
        pool: &PgPool,
        credential_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM customers WHERE credential_id = $1")
                .bind(credential_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// List all customers, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Customer>(&query).fetch_all(pool).await
    }

    /// Update a customer. Only non-`None` fields in `input` are applied.
    ///
    /// A new email (or name) is copied onto the linked credential in the same
    /// transaction. Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE customers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                contact_number = COALESCE($4, contact_number),
                address = COALESCE($5, address),
                square_feet = COALESCE($6, square_feet),
                site_location = COALESCE($7, site_location),
                building_type = COALESCE($8, building_type)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.contact_number)
            .bind(&input.address)
            .bind(input.square_feet)
            .bind(&input.site_location)
            .bind(input.building_type)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(customer) = customer else {
            return Ok(None);
        };

        if input.email.is_some() || input.name.is_some() {
            sqlx::query("UPDATE credentials SET email = $2, name = $3 WHERE id = $1")
                .bind(customer.credential_id)
                .bind(&customer.email)
                .bind(&customer.name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(customer))
    }

    /// Delete a customer and its credential.
    ///
    /// Refused while the customer still owns projects. The profile row is
    /// locked for the duration so a concurrent project insert waits.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<CustomerDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT credential_id FROM customers WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((credential_id,)) = row else {
            return Ok(CustomerDeletion::NotFound);
        };

        let (projects,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM projects WHERE customer_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if projects > 0 {
            return Ok(CustomerDeletion::HasProjects(projects));
        }

        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM credentials WHERE id = $1")
            .bind(credential_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CustomerDeletion::Deleted)
    }
}
