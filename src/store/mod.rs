//! Relational Store
//! Mission: Persist accounts, productos, and token state with SQLite

mod productos;
mod tokens;
mod usuarios;

pub use productos::{NuevoProducto, Producto, ESTADO_DISPONIBLE};
pub use tokens::ResetTokenRow;
pub use usuarios::{CambiosUsuario, NuevoUsuario};

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQLite-backed store. One connection per operation; SQLite serializes
/// per-row writes, which is the only atomicity this service relies on.
pub struct Store {
    db_path: String,
}

impl Store {
    /// Create a store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open database")
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS usuarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nombre TEXT NOT NULL,
                apellido TEXT,
                documento TEXT,
                ruc TEXT,
                razon_social TEXT,
                codigo TEXT UNIQUE,
                agencia TEXT,
                canal TEXT,
                perfil TEXT,
                correo TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                rol TEXT NOT NULL DEFAULT 'usuario',
                puntos_totales INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tokens_revocados (
                token TEXT PRIMARY KEY,
                expira_en INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS reset_tokens (
                token TEXT PRIMARY KEY,
                usuario_id INTEGER NOT NULL,
                expira_en INTEGER NOT NULL,
                FOREIGN KEY (usuario_id) REFERENCES usuarios(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS productos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nombre TEXT NOT NULL,
                descripcion TEXT NOT NULL DEFAULT '',
                puntos INTEGER NOT NULL,
                stock INTEGER NOT NULL DEFAULT 0,
                link_imagen TEXT NOT NULL DEFAULT '',
                estado TEXT NOT NULL DEFAULT 'disponible',
                fecha_creacion TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}
