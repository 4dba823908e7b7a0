//! Producto rows: public catalog listing and creation.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::Store;

pub const ESTADO_DISPONIBLE: &str = "disponible";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producto {
    pub id: i64,
    pub nombre: String,
    pub descripcion: String,
    pub puntos: i64,
    pub stock: i64,
    pub link_imagen: String,
    pub estado: String,
    pub fecha_creacion: String,
}

#[derive(Debug, Clone)]
pub struct NuevoProducto {
    pub nombre: String,
    pub descripcion: String,
    pub puntos: i64,
    pub stock: i64,
    pub link_imagen: String,
    pub estado: String,
}

impl Store {
    /// The public catalog only shows rows still marked "disponible".
    pub fn listar_productos_disponibles(&self) -> Result<Vec<Producto>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, nombre, descripcion, puntos, stock, link_imagen, estado, fecha_creacion \
             FROM productos WHERE estado = ?1 ORDER BY id",
        )?;

        let productos = stmt
            .query_map(params![ESTADO_DISPONIBLE], |row| {
                Ok(Producto {
                    id: row.get(0)?,
                    nombre: row.get(1)?,
                    descripcion: row.get(2)?,
                    puntos: row.get(3)?,
                    stock: row.get(4)?,
                    link_imagen: row.get(5)?,
                    estado: row.get(6)?,
                    fecha_creacion: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(productos)
    }

    pub fn crear_producto(&self, nuevo: &NuevoProducto) -> Result<Producto> {
        let fecha_creacion = Utc::now().to_rfc3339();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO productos (nombre, descripcion, puntos, stock, link_imagen, estado, \
             fecha_creacion) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                nuevo.nombre,
                nuevo.descripcion,
                nuevo.puntos,
                nuevo.stock,
                nuevo.link_imagen,
                nuevo.estado,
                fecha_creacion,
            ],
        )
        .context("Failed to insert producto")?;

        Ok(Producto {
            id: conn.last_insert_rowid(),
            nombre: nuevo.nombre.clone(),
            descripcion: nuevo.descripcion.clone(),
            puntos: nuevo.puntos,
            stock: nuevo.stock,
            link_imagen: nuevo.link_imagen.clone(),
            estado: nuevo.estado.clone(),
            fecha_creacion,
        })
    }
}
