//! CozoDB schema for the clip store
//!
//! - `clips`: one row per tile (`id => name, mime, bytes, color?`)
//! - `board_meta`: key/value pairs (`schema_version`, and `next_clip_id`,
//!   the id counter that never goes back)
//!
//! Version history:
//! 1. `clips` without `color`
//! 2. `color` column added (nullable, missing reads as `dark`)

use std::collections::{BTreeMap, HashSet};

use cozo::{DataValue, DbInstance, ScriptMutability};

use super::{StoreError, StoreResult};

/// Current schema version written to `board_meta`
pub const SCHEMA_VERSION: u32 = 2;

const VERSION_KEY: &str = "schema_version";

/// Get the set of existing relation names in the database
fn existing_relations(db: &DbInstance) -> StoreResult<HashSet<String>> {
    let result = db
        .run_script("::relations", Default::default(), ScriptMutability::Immutable)
        .map_err(|e| StoreError::Schema(e.to_string()))?;

    // Columns are [name, arity, access_level, ...]; we only need the name
    Ok(result
        .rows
        .iter()
        .filter_map(|row| row.first().and_then(|v| v.get_str()).map(str::to_string))
        .collect())
}

fn run_schema(db: &DbInstance, script: &str) -> StoreResult<()> {
    db.run_script(script, Default::default(), ScriptMutability::Mutable)
        .map_err(|e| StoreError::Schema(e.to_string()))?;
    Ok(())
}

fn create_clips_relation(db: &DbInstance) -> StoreResult<()> {
    run_schema(
        db,
        r#"
        {:create clips {
            id: Int =>
            name: String,
            mime: String,
            bytes: Bytes,
            color: String?
        }}
    "#,
    )
}

fn create_meta_relation(db: &DbInstance) -> StoreResult<()> {
    run_schema(
        db,
        r#"
        {:create board_meta {
            key: String =>
            value: Int
        }}
    "#,
    )
}

/// Stored schema version, `None` if never written
pub(super) fn stored_version(db: &DbInstance) -> StoreResult<Option<u32>> {
    let mut params = BTreeMap::new();
    params.insert("key".to_string(), DataValue::Str(VERSION_KEY.into()));

    let result = db
        .run_script(
            "?[value] := *board_meta{key, value}, key = $key",
            params,
            ScriptMutability::Immutable,
        )
        .map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(result
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(|v| v.get_int())
        .and_then(|v| u32::try_from(v).ok()))
}

fn write_version(db: &DbInstance, version: u32) -> StoreResult<()> {
    let mut params = BTreeMap::new();
    params.insert("key".to_string(), DataValue::Str(VERSION_KEY.into()));
    params.insert("value".to_string(), DataValue::from(version as i64));

    db.run_script(
        r#"
        ?[key, value] <- [[$key, $value]]
        :put board_meta {key => value}
    "#,
        params,
        ScriptMutability::Mutable,
    )
    .map_err(|e| StoreError::Schema(e.to_string()))?;
    Ok(())
}

/// Create missing relations and bring the version marker up to date (idempotent)
///
/// Older stores only need their marker bumped: the `color` column is nullable
/// and rows without it read back as the default color.
pub fn ensure_schema(db: &DbInstance) -> StoreResult<()> {
    let existing = existing_relations(db)?;
    log::debug!("ensure_schema: Existing relations: {:?}", existing);

    if !existing.contains("clips") {
        log::debug!("ensure_schema: Creating 'clips' relation");
        create_clips_relation(db)?;
    }
    if !existing.contains("board_meta") {
        log::debug!("ensure_schema: Creating 'board_meta' relation");
        create_meta_relation(db)?;
    }

    match stored_version(db)? {
        Some(version) if version > SCHEMA_VERSION => {
            return Err(StoreError::Schema(format!(
                "Store was written by a newer version (schema {} > {})",
                version, SCHEMA_VERSION
            )));
        }
        Some(version) if version == SCHEMA_VERSION => {}
        previous => {
            log::info!(
                "ensure_schema: Upgrading schema {:?} -> {}",
                previous,
                SCHEMA_VERSION
            );
            write_version(db, SCHEMA_VERSION)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let db = DbInstance::new("mem", "", "").unwrap();
        ensure_schema(&db).unwrap();
        ensure_schema(&db).unwrap();
        assert_eq!(stored_version(&db).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let db = DbInstance::new("mem", "", "").unwrap();
        ensure_schema(&db).unwrap();
        write_version(&db, SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(ensure_schema(&db), Err(StoreError::Schema(_))));
    }
}
