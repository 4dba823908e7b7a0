//! Account rows: lookup, insert, allow-listed update, delete.

use crate::auth::models::Usuario;
use anyhow::{Context, Result};
use rusqlite::{params, Row, ToSql};

use super::Store;

const COLUMNAS_USUARIO: &str = "id, nombre, apellido, documento, ruc, razon_social, codigo, \
     agencia, canal, perfil, correo, password, rol, puntos_totales";

fn usuario_de_fila(row: &Row<'_>) -> rusqlite::Result<Usuario> {
    Ok(Usuario {
        id: row.get(0)?,
        nombre: row.get(1)?,
        apellido: row.get(2)?,
        documento: row.get(3)?,
        ruc: row.get(4)?,
        razon_social: row.get(5)?,
        codigo: row.get(6)?,
        agencia: row.get(7)?,
        canal: row.get(8)?,
        perfil: row.get(9)?,
        correo: row.get(10)?,
        password: row.get(11)?,
        rol: row.get(12)?,
        puntos_totales: row.get(13)?,
    })
}

/// Fields for a new account row. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NuevoUsuario {
    pub nombre: String,
    pub apellido: Option<String>,
    pub documento: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub codigo: Option<String>,
    pub agencia: Option<String>,
    pub canal: Option<String>,
    pub perfil: Option<String>,
    pub correo: String,
    pub password: String,
    pub rol: String,
}

/// Allow-listed patch applied by `actualizar_usuario`. `password` is
/// already hashed by the caller.
#[derive(Debug, Default)]
pub struct CambiosUsuario {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub documento: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub agencia: Option<String>,
    pub canal: Option<String>,
    pub perfil: Option<String>,
    pub correo: Option<String>,
    pub password: Option<String>,
    pub rol: Option<String>,
    pub puntos_totales: Option<i64>,
}

impl Store {
    pub fn buscar_por_correo(&self, correo: &str) -> Result<Option<Usuario>> {
        self.buscar_usuario("correo", correo)
    }

    pub fn buscar_por_codigo(&self, codigo: &str) -> Result<Option<Usuario>> {
        self.buscar_usuario("codigo", codigo)
    }

    pub fn buscar_por_id(&self, id: i64) -> Result<Option<Usuario>> {
        self.buscar_usuario("id", id)
    }

    fn buscar_usuario<V: ToSql>(&self, columna: &str, valor: V) -> Result<Option<Usuario>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {COLUMNAS_USUARIO} FROM usuarios WHERE {columna} = ?1");
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![valor], usuario_de_fila) {
            Ok(usuario) => Ok(Some(usuario)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn crear_usuario(&self, nuevo: &NuevoUsuario) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO usuarios (nombre, apellido, documento, ruc, razon_social, codigo, \
             agencia, canal, perfil, correo, password, rol) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                nuevo.nombre,
                nuevo.apellido,
                nuevo.documento,
                nuevo.ruc,
                nuevo.razon_social,
                nuevo.codigo,
                nuevo.agencia,
                nuevo.canal,
                nuevo.perfil,
                nuevo.correo,
                nuevo.password,
                nuevo.rol,
            ],
        )
        .context("Failed to insert usuario")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn listar_usuarios(&self) -> Result<Vec<Usuario>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {COLUMNAS_USUARIO} FROM usuarios ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;

        let usuarios = stmt
            .query_map([], usuario_de_fila)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(usuarios)
    }

    /// Apply an allow-listed patch. Only the columns named here can ever
    /// be touched; the SQL is assembled from this fixed list, never from
    /// request keys. Returns the number of rows updated (0 = not found).
    pub fn actualizar_usuario(&self, id: i64, cambios: &CambiosUsuario) -> Result<usize> {
        let mut sets: Vec<&str> = Vec::new();
        let mut valores: Vec<&dyn ToSql> = Vec::new();

        macro_rules! campo {
            ($col:literal, $valor:expr) => {
                if let Some(v) = &$valor {
                    sets.push(concat!($col, " = ?"));
                    valores.push(v);
                }
            };
        }

        campo!("nombre", cambios.nombre);
        campo!("apellido", cambios.apellido);
        campo!("documento", cambios.documento);
        campo!("ruc", cambios.ruc);
        campo!("razon_social", cambios.razon_social);
        campo!("agencia", cambios.agencia);
        campo!("canal", cambios.canal);
        campo!("perfil", cambios.perfil);
        campo!("correo", cambios.correo);
        campo!("password", cambios.password);
        campo!("rol", cambios.rol);
        campo!("puntos_totales", cambios.puntos_totales);

        if sets.is_empty() {
            anyhow::bail!("Empty patch");
        }

        valores.push(&id);
        let sql = format!("UPDATE usuarios SET {} WHERE id = ?", sets.join(", "));

        let conn = self.conn()?;
        let filas = conn
            .execute(&sql, &valores[..])
            .context("Failed to update usuario")?;

        Ok(filas)
    }

    pub fn actualizar_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let conn = self.conn()?;
        let filas = conn.execute(
            "UPDATE usuarios SET password = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(filas > 0)
    }

    /// Returns false when no row matched. Outstanding reset tokens go
    /// with the account; the schema cascade only covers databases created
    /// with it, so the delete is explicit.
    pub fn eliminar_usuario(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM reset_tokens WHERE usuario_id = ?1",
            params![id],
        )?;
        let filas = conn.execute("DELETE FROM usuarios WHERE id = ?1", params![id])?;
        Ok(filas > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{nuevo_usuario, store_temporal};
    use super::*;
    use crate::auth::models::{ROL_ADMIN, ROL_USUARIO};

    #[test]
    fn test_crear_y_buscar_usuario() {
        let (store, _temp) = store_temporal();

        let id = store
            .crear_usuario(&nuevo_usuario("a@x.com", Some("C001"), ROL_USUARIO))
            .unwrap();
        assert!(id > 0);

        let por_correo = store.buscar_por_correo("a@x.com").unwrap().unwrap();
        assert_eq!(por_correo.id, id);
        assert_eq!(por_correo.rol, ROL_USUARIO);

        let por_codigo = store.buscar_por_codigo("C001").unwrap().unwrap();
        assert_eq!(por_codigo.correo, "a@x.com");

        assert!(store.buscar_por_correo("no@x.com").unwrap().is_none());
        assert!(store.buscar_por_id(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_correo_duplicado_falla() {
        let (store, _temp) = store_temporal();

        store
            .crear_usuario(&nuevo_usuario("a@x.com", None, ROL_USUARIO))
            .unwrap();
        let resultado = store.crear_usuario(&nuevo_usuario("a@x.com", None, ROL_USUARIO));
        assert!(resultado.is_err());
    }

    #[test]
    fn test_actualizar_usuario_solo_campos_presentes() {
        let (store, _temp) = store_temporal();
        let id = store
            .crear_usuario(&nuevo_usuario("a@x.com", Some("C001"), ROL_USUARIO))
            .unwrap();

        let cambios = CambiosUsuario {
            nombre: Some("Ana María".to_string()),
            puntos_totales: Some(150),
            ..Default::default()
        };
        let filas = store.actualizar_usuario(id, &cambios).unwrap();
        assert_eq!(filas, 1);

        let usuario = store.buscar_por_id(id).unwrap().unwrap();
        assert_eq!(usuario.nombre, "Ana María");
        assert_eq!(usuario.puntos_totales, 150);
        // Untouched fields keep their values
        assert_eq!(usuario.correo, "a@x.com");
        assert_eq!(usuario.codigo.as_deref(), Some("C001"));
    }

    #[test]
    fn test_actualizar_usuario_inexistente() {
        let (store, _temp) = store_temporal();

        let cambios = CambiosUsuario {
            nombre: Some("Nadie".to_string()),
            ..Default::default()
        };
        assert_eq!(store.actualizar_usuario(999, &cambios).unwrap(), 0);
    }

    #[test]
    fn test_patch_vacio_es_error() {
        let (store, _temp) = store_temporal();
        assert!(store
            .actualizar_usuario(1, &CambiosUsuario::default())
            .is_err());
    }

    #[test]
    fn test_eliminar_usuario() {
        let (store, _temp) = store_temporal();
        let id = store
            .crear_usuario(&nuevo_usuario("admin@x.com", None, ROL_ADMIN))
            .unwrap();

        assert!(store.eliminar_usuario(id).unwrap());
        assert!(!store.eliminar_usuario(id).unwrap());
        assert!(store.buscar_por_id(id).unwrap().is_none());
    }

    #[test]
    fn test_eliminar_usuario_con_reset_token_pendiente() {
        let (store, _temp) = store_temporal();
        let id = store
            .crear_usuario(&nuevo_usuario("a@x.com", Some("C001"), ROL_USUARIO))
            .unwrap();
        store
            .crear_reset_token("tok-pendiente", id, 2_000_000, 1_000_000)
            .unwrap();

        assert!(store.eliminar_usuario(id).unwrap());
        assert!(store.buscar_reset_token("tok-pendiente").unwrap().is_none());
    }

    #[test]
    fn test_listar_usuarios() {
        let (store, _temp) = store_temporal();
        store
            .crear_usuario(&nuevo_usuario("a@x.com", None, ROL_USUARIO))
            .unwrap();
        store
            .crear_usuario(&nuevo_usuario("b@x.com", None, ROL_ADMIN))
            .unwrap();

        let usuarios = store.listar_usuarios().unwrap();
        assert_eq!(usuarios.len(), 2);
    }
}
