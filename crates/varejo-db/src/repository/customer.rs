//! # Customer Repository
//!
//! CRUD for the customer directory. Customers are passive data: sales
//! reference them, and deleting one nulls the reference out rather than
//! touching the sale history.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use varejo_core::{validation, Customer};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, cpf, created_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - empty name
    /// * `Err(DbError::UniqueViolation)` - cpf already registered
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        validation::validate_name(&customer.name)?;

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, cpf, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.cpf)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Searches customers by substring across name, phone, email and cpf.
    /// An empty query lists everyone, ordered by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        let pattern = format!("%{}%", query);

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE ?1 = ''
               OR name LIKE ?2 OR phone LIKE ?2 OR email LIKE ?2 OR cpf LIKE ?2
            ORDER BY name
            LIMIT ?3
            "#
        ))
        .bind(query)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates a customer's contact fields.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        validation::validate_name(&customer.name)?;

        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2, email = ?3, phone = ?4, address = ?5, cpf = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.cpf)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deletes a customer. Their sales survive with customer_id nulled.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

/// Builds a customer with generated id and timestamp, ready for insert.
pub fn new_customer(name: &str, phone: &str) -> Customer {
    Customer {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: String::new(),
        phone: phone.to_string(),
        address: String::new(),
        cpf: None,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_customer_crud_and_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let mut maria = new_customer("Maria Silva", "11 99999-0001");
        maria.cpf = Some("123.456.789-00".to_string());
        repo.insert(&maria).await.unwrap();
        repo.insert(&new_customer("João Souza", "11 99999-0002"))
            .await
            .unwrap();

        let hits = repo.search("maria", 20).await.unwrap();
        assert_eq!(hits.len(), 1);

        let by_cpf = repo.search("456.789", 20).await.unwrap();
        assert_eq!(by_cpf.len(), 1);
        assert_eq!(by_cpf[0].name, "Maria Silva");

        let all = repo.search("", 20).await.unwrap();
        assert_eq!(all.len(), 2);

        repo.delete(&maria.id).await.unwrap();
        assert!(repo.get_by_id(&maria.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        assert!(matches!(
            repo.insert(&new_customer("  ", "1")).await.unwrap_err(),
            DbError::InvalidInput(_)
        ));
        assert!(repo.search("", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_cpf_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let mut a = new_customer("A", "1");
        a.cpf = Some("111.222.333-44".to_string());
        repo.insert(&a).await.unwrap();

        let mut b = new_customer("B", "2");
        b.cpf = Some("111.222.333-44".to_string());
        assert!(matches!(
            repo.insert(&b).await.unwrap_err(),
            DbError::UniqueViolation { .. }
        ));
    }
}
