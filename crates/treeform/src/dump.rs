use treeform_document::{Map, Value};

use crate::config::{AbsentFields, Config};
use crate::tree::{NodeRef, Tree};
use crate::value::FieldValue;

impl Tree<'_> {
    /// Copy the tree back into an untyped document.
    pub fn dump(&self, config: &Config) -> Value {
        self.root().dump(config)
    }
}

impl NodeRef<'_> {
    /// Copy this node and everything below it into an untyped document.
    ///
    /// Fields come out in declaration order. Enum values are written as their
    /// underlying scalar, absent fields as null or, with
    /// [`AbsentFields::Omit`], not at all.
    pub fn dump(&self, config: &Config) -> Value {
        let mut map = Map::new();
        for (decl, value) in self.fields() {
            if value.is_absent() && config.absent_fields == AbsentFields::Omit {
                continue;
            }
            map.insert(decl.name().to_string(), self.dump_value(value, config));
        }
        Value::Map(map)
    }

    fn dump_value(&self, value: &FieldValue, config: &Config) -> Value {
        match value {
            FieldValue::Absent => Value::Null,
            FieldValue::Scalar(scalar) => scalar.to_value(),
            FieldValue::Enum(member) => member.value.to_value(),
            FieldValue::Node(id) => self.tree().node(*id).dump(config),
            // Absent elements keep their position as null.
            FieldValue::Sequence(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.dump_value(item, config))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use treeform_document::doc;

    use crate::{AbsentFields, Catalog, Config, SchemaId, TypeExpr};

    fn catalog() -> (Catalog, SchemaId) {
        let mut catalog = Catalog::new();
        let level = catalog
            .declare_enum("Level", [("Low", 1), ("High", 2)])
            .unwrap();
        let item = catalog
            .declare_record(
                "Item",
                [
                    ("label", TypeExpr::TEXT),
                    ("level", TypeExpr::optional(TypeExpr::enumeration(level))),
                ],
            )
            .unwrap();
        let order = catalog
            .declare_record(
                "Order",
                [
                    ("id", TypeExpr::INTEGER),
                    ("note", TypeExpr::optional(TypeExpr::TEXT)),
                    ("items", TypeExpr::sequence(TypeExpr::record(item))),
                    ("weights", TypeExpr::sequence(TypeExpr::FLOAT)),
                ],
            )
            .unwrap();
        (catalog, order)
    }

    #[test]
    fn test_dump_mirrors_declared_fields() {
        let (catalog, order) = catalog();
        let config = Config::default();
        let raw = doc!({
            "weights": [1.5, 2],
            "id": "7",
            "items": [{ "label": "a", "level": "High" }, null],
            "ignored": true,
        });
        let tree = catalog.load(order, &raw, &config).unwrap();
        assert_eq!(
            tree.dump(&config),
            doc!({
                "id": 7,
                "note": null,
                "items": [{ "label": "a", "level": 2 }, null],
                "weights": [1.5, 2.0],
            })
        );
    }

    #[test]
    fn test_dump_omits_absent_fields() {
        let (catalog, order) = catalog();
        let config = Config {
            absent_fields: AbsentFields::Omit,
            ..Config::default()
        };
        let tree = catalog
            .load(order, &doc!({ "id": 1, "items": [{ "label": "a" }] }), &config)
            .unwrap();
        assert_eq!(
            tree.dump(&config),
            doc!({ "id": 1, "items": [{ "label": "a" }] })
        );
    }

    #[test]
    fn test_dump_subtree() {
        let (catalog, order) = catalog();
        let config = Config::default();
        let tree = catalog
            .load(order, &doc!({ "items": [{ "label": "b", "level": 1 }] }), &config)
            .unwrap();
        let item = tree.root().children()[0];
        assert_eq!(item.dump(&config), doc!({ "label": "b", "level": 1 }));
    }

    #[test]
    fn test_load_dump_round_trip() {
        let (catalog, order) = catalog();
        for config in [Config::default(), Config::strict()] {
            let raw = doc!({
                "id": 3,
                "note": "fragile",
                "items": [{ "label": "a", "level": 1 }, { "label": "b", "level": null }],
                "weights": [0.5],
            });
            let tree = catalog.load(order, &raw, &config).unwrap();
            let reloaded = catalog.load(order, &tree.dump(&config), &config).unwrap();
            assert_eq!(tree, reloaded);
        }
    }
}
