//! The JSON data handler.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;

use fit_data::{
    AttrId, AttrRow, DataHandler, EffectId, EffectRow, ExprId, ExpressionNode, TypeId, TypeRow,
};

use crate::schema::{AttrEntry, EffectEntry, ExpressionEntry, TypeEntry};

/// Data handler backed by JSON dump files, loaded fully into memory.
///
/// Each table is a JSON object keyed by the entity id (as a string, a JSON
/// quirk); entries that fail to parse an id key are skipped rather than
/// failing the load.
#[derive(Debug)]
pub struct JsonDataHandler {
    types: HashMap<TypeId, TypeRow>,
    attrs: HashMap<AttrId, AttrRow>,
    effects: HashMap<EffectId, EffectRow>,
    exprs: HashMap<ExprId, ExpressionNode>,
}

impl JsonDataHandler {
    /// Loads all four tables from JSON files.
    pub fn load(
        types_path: &Path,
        attrs_path: &Path,
        effects_path: &Path,
        exprs_path: &Path,
    ) -> anyhow::Result<Self> {
        Self::from_strs(
            &read(types_path)?,
            &read(attrs_path)?,
            &read(effects_path)?,
            &read(exprs_path)?,
        )
    }

    /// Parses all four tables from JSON strings.
    pub fn from_strs(
        types_json: &str,
        attrs_json: &str,
        effects_json: &str,
        exprs_json: &str,
    ) -> anyhow::Result<Self> {
        let types: HashMap<String, TypeEntry> =
            serde_json::from_str(types_json).context("failed to parse type table")?;
        let attrs: HashMap<String, AttrEntry> =
            serde_json::from_str(attrs_json).context("failed to parse attribute table")?;
        let effects: HashMap<String, EffectEntry> =
            serde_json::from_str(effects_json).context("failed to parse effect table")?;
        let exprs: HashMap<String, ExpressionEntry> =
            serde_json::from_str(exprs_json).context("failed to parse expression table")?;

        Ok(Self {
            types: keyed(types, |entry| entry.into_row(), TypeId),
            attrs: keyed(attrs, |entry| entry.into_row(), AttrId),
            effects: keyed(effects, |entry| entry.into_row(), EffectId),
            exprs: exprs
                .into_iter()
                .filter_map(|(key, entry)| {
                    let id = ExprId(key.parse().ok()?);
                    Some((id, entry.into_node(id)))
                })
                .collect(),
        })
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Re-keys a string-keyed table by its parsed numeric id.
fn keyed<E, R, K: std::hash::Hash + Eq>(
    entries: HashMap<String, E>,
    convert: impl Fn(E) -> R,
    make_id: impl Fn(u32) -> K,
) -> HashMap<K, R> {
    entries
        .into_iter()
        .filter_map(|(key, entry)| Some((make_id(key.parse().ok()?), convert(entry))))
        .collect()
}

impl DataHandler for JsonDataHandler {
    fn type_row(&self, id: TypeId) -> Option<TypeRow> {
        self.types.get(&id).cloned()
    }

    fn attr_row(&self, id: AttrId) -> Option<AttrRow> {
        self.attrs.get(&id).cloned()
    }

    fn effect_row(&self, id: EffectId) -> Option<EffectRow> {
        self.effects.get(&id).cloned()
    }

    fn expression_row(&self, id: ExprId) -> Option<ExpressionNode> {
        self.exprs.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: &str = r#"{
        "100": {
            "groupID": 25,
            "categoryID": 6,
            "attributes": {"48": 200.0, "9": 350.0},
            "effects": [16]
        },
        "bogus": {"groupID": 1, "categoryID": 1}
    }"#;
    const ATTRS: &str = r#"{
        "48": {"stackable": 1, "highIsGood": true},
        "9": {"stackable": 0, "highIsGood": 1, "defaultValue": 1.0}
    }"#;
    const EFFECTS: &str = r#"{
        "16": {"effectCategory": 4, "preExpression": 1, "postExpression": 2}
    }"#;
    const EXPRS: &str = r#"{
        "1": {"operandID": 24, "expressionValue": "Ship"},
        "2": {"operandID": "24", "expressionValue": "Ship"}
    }"#;

    fn handler() -> JsonDataHandler {
        JsonDataHandler::from_strs(TYPES, ATTRS, EFFECTS, EXPRS).unwrap()
    }

    #[test]
    fn loads_and_rekeys_tables() {
        let h = handler();
        // The unparsable "bogus" key is skipped, not fatal.
        assert_eq!(h.type_count(), 1);

        let row = h.type_row(TypeId(100)).unwrap();
        assert_eq!(row.effect_ids, vec![EffectId(16)]);
        assert!(row.attrs.contains(&(AttrId(48), 200.0)));
    }

    #[test]
    fn flags_accept_both_encodings() {
        let h = handler();
        assert!(h.attr_row(AttrId(48)).unwrap().stackable);
        assert!(!h.attr_row(AttrId(9)).unwrap().stackable);
        assert_eq!(h.attr_row(AttrId(9)).unwrap().default_value, Some(1.0));
    }

    #[test]
    fn loose_operand_encodings_survive() {
        let h = handler();
        let a = h.expression_row(ExprId(1)).unwrap();
        let b = h.expression_row(ExprId(2)).unwrap();
        assert_eq!(a.operand.as_ref().and_then(|v| v.as_u32()), Some(24));
        assert_eq!(b.operand.as_ref().and_then(|v| v.as_u32()), Some(24));
    }

    #[test]
    fn files_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            path
        };
        let types = write("types.json", TYPES);
        let attrs = write("attrs.json", ATTRS);
        let effects = write("effects.json", EFFECTS);
        let exprs = write("exprs.json", EXPRS);

        let h = JsonDataHandler::load(&types, &attrs, &effects, &exprs).unwrap();
        assert_eq!(h.type_count(), 1);
        assert!(h.effect_row(EffectId(16)).unwrap().pre_expression == Some(ExprId(1)));
    }

    #[test]
    fn missing_file_carries_context() {
        let err = JsonDataHandler::load(
            Path::new("/nonexistent/types.json"),
            Path::new("/nonexistent/attrs.json"),
            Path::new("/nonexistent/effects.json"),
            Path::new("/nonexistent/exprs.json"),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
