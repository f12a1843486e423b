//! Helpers for integration tests.

use std::path::{Path, PathBuf};

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

use pushkind_pos::db::{DbPool, establish_connection_pool};
use pushkind_pos::domain::menu_item::{MenuItem, NewMenuItem};
use pushkind_pos::domain::payment::{NewPaymentMethod, PaymentMethod};
use pushkind_pos::domain::table::{NewTable, Table};
use pushkind_pos::repository::{DieselRepository, MenuItemWriter, PaymentWriter, TableWriter};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Temporary database used in integration tests. The file lives in its own
/// directory, removed together with the WAL files on drop.
pub struct TestDb {
    pool: DbPool,
    #[allow(dead_code)] // only read by tests/db.rs
    path: PathBuf,
    #[allow(dead_code)] // held for its drop
    dir: TempDir,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
        let path = dir.path().join(filename);
        let url = path.to_str().expect("Temporary path is not UTF-8.");

        let pool = establish_connection_pool(url).expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");

        TestDb { pool, path, dir }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[allow(dead_code)]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Catalog and floor plan shared by the integration tests.
#[allow(dead_code)]
pub struct Seed {
    /// Base price 20000, 8% tax.
    pub steak: MenuItem,
    /// Display price only, 10% tax.
    pub soda: MenuItem,
    pub table_a: Table,
    pub table_b: Table,
    pub cash: PaymentMethod,
    pub card: PaymentMethod,
}

#[allow(dead_code)]
pub fn seed(repo: &DieselRepository) -> Seed {
    Seed {
        steak: repo
            .create_menu_item(&NewMenuItem::new("Steak", 21600.0, 8.0).with_base_price(20000.0))
            .expect("menu item"),
        soda: repo
            .create_menu_item(&NewMenuItem::new("Soda", 3000.0, 10.0))
            .expect("menu item"),
        table_a: repo.create_table(&NewTable::new(1, 4)).expect("table"),
        table_b: repo.create_table(&NewTable::new(2, 2)).expect("table"),
        cash: repo
            .create_payment_method(&NewPaymentMethod::new("Cash", true))
            .expect("payment method"),
        card: repo
            .create_payment_method(&NewPaymentMethod::new("Card", false))
            .expect("payment method"),
    }
}
