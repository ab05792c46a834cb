use crate::models::{
    Account, Category, MenuItem, NewAccount, NewCategory, NewMenuItem, NewRestaurant, Restaurant,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// RepositoryError
///
/// Persistence failures the callers need to tell apart. Constraint violations are surfaced
/// as their own variants so the HTTP layer can answer 409/400 instead of 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A UNIQUE constraint rejected the write.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// A referenced row does not exist.
    #[error("missing {0}")]
    MissingReference(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// AccountDirectory
///
/// The only persistence capability the auth flow depends on: look an account up by email
/// and insert a new one. `insert` is the authority on email uniqueness; a duplicate must be
/// reported as `RepositoryError::Duplicate` even if an earlier lookup saw no match.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>>;
    async fn insert(&self, account: NewAccount) -> RepositoryResult<Account>;
}

/// MenuRepository
///
/// Plain storage for the public menu and its admin maintenance.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn list_restaurants(&self) -> RepositoryResult<Vec<Restaurant>>;
    async fn create_restaurant(&self, req: NewRestaurant) -> RepositoryResult<Restaurant>;
    // Removes every restaurant and restarts the id sequence at 1.
    async fn delete_all_restaurants(&self) -> RepositoryResult<()>;

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>>;
    async fn create_category(&self, req: NewCategory) -> RepositoryResult<Category>;
    // Removes every category together with its menu items and restarts both id sequences.
    async fn delete_all_categories(&self) -> RepositoryResult<()>;

    async fn list_menu_items(&self) -> RepositoryResult<Vec<MenuItem>>;
    // Fails with MissingReference when `req.category_id` is unknown.
    async fn create_menu_item(&self, req: NewMenuItem) -> RepositoryResult<MenuItem>;
}

pub type AccountDirectoryState = Arc<dyn AccountDirectory>;
pub type RepositoryState = Arc<dyn MenuRepository>;

/// Maps constraint violations onto the domain variants, everything else stays a database error.
fn classify(err: sqlx::Error, entity: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Duplicate(entity.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::MissingReference("category".to_string());
        }
    }
    RepositoryError::Database(err)
}

/// PostgresRepository
///
/// Backed by a single long-lived connection pool created at startup and shared by all requests.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PostgresRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, name, email, password, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// insert
    ///
    /// Relies on the `users.email` UNIQUE constraint, so two concurrent registrations for the
    /// same address cannot both succeed.
    async fn insert(&self, account: NewAccount) -> RepositoryResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"INSERT INTO users (name, email, password, role)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, email, password, role"#,
        )
        .bind(account.name)
        .bind(account.email)
        .bind(account.password_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "email"))
    }
}

#[async_trait]
impl MenuRepository for PostgresRepository {
    async fn list_restaurants(&self) -> RepositoryResult<Vec<Restaurant>> {
        let rows = sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, description, address, phone, email, working_hours FROM restaurants ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_restaurant(&self, req: NewRestaurant) -> RepositoryResult<Restaurant> {
        sqlx::query_as::<_, Restaurant>(
            r#"INSERT INTO restaurants (name, description, address, phone, email, working_hours)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, name, description, address, phone, email, working_hours"#,
        )
        .bind(req.name)
        .bind(req.description)
        .bind(req.address)
        .bind(req.phone)
        .bind(req.email)
        .bind(req.working_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "restaurant"))
    }

    async fn delete_all_restaurants(&self) -> RepositoryResult<()> {
        sqlx::query("TRUNCATE restaurants RESTART IDENTITY")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_category(&self, req: NewCategory) -> RepositoryResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(req.name)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "category"))
    }

    /// delete_all_categories
    ///
    /// `CASCADE` also truncates `menu_items`; `RESTART IDENTITY` applies to both tables.
    async fn delete_all_categories(&self) -> RepositoryResult<()> {
        sqlx::query("TRUNCATE categories RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_menu_items(&self) -> RepositoryResult<Vec<MenuItem>> {
        let rows = sqlx::query_as::<_, MenuItem>(
            r#"SELECT id, category_id, name, description, price, image_url, is_available
               FROM menu_items ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_menu_item(&self, req: NewMenuItem) -> RepositoryResult<MenuItem> {
        let category_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(req.category_id)
                .fetch_one(&self.pool)
                .await?;
        if !category_exists {
            return Err(RepositoryError::MissingReference("category".to_string()));
        }

        // The foreign key still guards against a category deleted in between.
        sqlx::query_as::<_, MenuItem>(
            r#"INSERT INTO menu_items (category_id, name, description, price, image_url, is_available)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, category_id, name, description, price, image_url, is_available"#,
        )
        .bind(req.category_id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.price)
        .bind(req.image_url)
        .bind(req.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "menu item"))
    }
}

// --- In-memory implementation ---

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    restaurants: Vec<Restaurant>,
    categories: Vec<Category>,
    menu_items: Vec<MenuItem>,
    next_account_id: i64,
    next_restaurant_id: i64,
    next_category_id: i64,
    next_menu_item_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// InMemoryRepository
///
/// A process-local store with the same uniqueness and reference rules as the Postgres schema.
/// Used by the test suite and for running the service without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn insert(&self, account: NewAccount) -> RepositoryResult<Account> {
        // Check and insert under one write lock, mirroring the UNIQUE constraint.
        let mut tables = self.tables.write().await;
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(RepositoryError::Duplicate("email".to_string()));
        }
        let created = Account {
            id: next_id(&mut tables.next_account_id),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
        };
        tables.accounts.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl MenuRepository for InMemoryRepository {
    async fn list_restaurants(&self) -> RepositoryResult<Vec<Restaurant>> {
        Ok(self.tables.read().await.restaurants.clone())
    }

    async fn create_restaurant(&self, req: NewRestaurant) -> RepositoryResult<Restaurant> {
        let mut tables = self.tables.write().await;
        if tables
            .restaurants
            .iter()
            .any(|r| r.phone == req.phone || r.email == req.email)
        {
            return Err(RepositoryError::Duplicate("restaurant".to_string()));
        }
        let created = Restaurant {
            id: next_id(&mut tables.next_restaurant_id),
            name: req.name,
            description: req.description,
            address: req.address,
            phone: req.phone,
            email: req.email,
            working_hours: req.working_hours,
        };
        tables.restaurants.push(created.clone());
        Ok(created)
    }

    async fn delete_all_restaurants(&self) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        tables.restaurants.clear();
        tables.next_restaurant_id = 0;
        Ok(())
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        Ok(self.tables.read().await.categories.clone())
    }

    async fn create_category(&self, req: NewCategory) -> RepositoryResult<Category> {
        let mut tables = self.tables.write().await;
        let created = Category {
            id: next_id(&mut tables.next_category_id),
            name: req.name,
            description: req.description,
        };
        tables.categories.push(created.clone());
        Ok(created)
    }

    async fn delete_all_categories(&self) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        tables.categories.clear();
        tables.menu_items.clear();
        tables.next_category_id = 0;
        tables.next_menu_item_id = 0;
        Ok(())
    }

    async fn list_menu_items(&self) -> RepositoryResult<Vec<MenuItem>> {
        Ok(self.tables.read().await.menu_items.clone())
    }

    async fn create_menu_item(&self, req: NewMenuItem) -> RepositoryResult<MenuItem> {
        let mut tables = self.tables.write().await;
        if !tables.categories.iter().any(|c| c.id == req.category_id) {
            return Err(RepositoryError::MissingReference("category".to_string()));
        }
        let created = MenuItem {
            id: next_id(&mut tables.next_menu_item_id),
            category_id: req.category_id,
            name: req.name,
            description: req.description,
            price: req.price,
            image_url: req.image_url,
            is_available: req.is_available,
        };
        tables.menu_items.push(created.clone());
        Ok(created)
    }
}
