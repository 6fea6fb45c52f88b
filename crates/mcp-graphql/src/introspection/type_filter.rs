//! Projection of named types from an introspected schema into a compact JSON form

use std::collections::HashSet;

use cynic_introspection::{
    EnumValue, Field, InputValue, InterfaceType, ObjectType, Schema, Type,
};
use serde::{Serialize, Serializer};

/// A map that serializes its entries in insertion order
#[derive(Debug)]
pub struct Ordered<T>(Vec<(String, T)>);

impl<T: Serialize> Serialize for Ordered<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
    }
}

impl<T> FromIterator<(String, T)> for Ordered<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The compact description of a single named type
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeDescriptor {
    Object {
        description: Option<String>,
        fields: Ordered<FieldDescriptor>,
    },
    Interface {
        description: Option<String>,
        fields: Ordered<FieldDescriptor>,
    },
    Union {
        description: Option<String>,
        #[serde(rename = "possibleTypes")]
        possible_types: Vec<String>,
    },
    Enum {
        description: Option<String>,
        values: Vec<EnumValueDescriptor>,
    },
    InputObject {
        description: Option<String>,
        fields: Ordered<InputFieldDescriptor>,
    },
    Scalar {
        description: Option<String>,
    },
}

/// A field of an object or interface type
#[derive(Debug, Serialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    ty: String,
    description: Option<String>,
    args: Vec<ArgumentDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct ArgumentDescriptor {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    description: Option<String>,
}

/// A field of an input object type
#[derive(Debug, Serialize)]
pub struct InputFieldDescriptor {
    #[serde(rename = "type")]
    ty: String,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnumValueDescriptor {
    name: String,
    description: Option<String>,
}

/// Select the named types from a schema, in the order they were requested.
///
/// Names that do not exist in the schema are skipped, and a name requested more than once only
/// appears at its first position.
pub fn select_types(schema: &Schema, type_names: &[String]) -> Ordered<TypeDescriptor> {
    let mut seen = HashSet::new();
    type_names
        .iter()
        .filter(|name| seen.insert(*name))
        .filter_map(|name| {
            schema
                .types
                .iter()
                .find(|ty| ty.name() == name)
                .map(|ty| (name.clone(), TypeDescriptor::from(ty)))
        })
        .collect()
}

/// Select the named types from a schema and render them as pretty-printed JSON
pub fn filter_types(schema: &Schema, type_names: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&select_types(schema, type_names))
}

impl From<&Type> for TypeDescriptor {
    fn from(ty: &Type) -> Self {
        match ty {
            Type::Object(ObjectType {
                description,
                fields,
                ..
            }) => TypeDescriptor::Object {
                description: description.clone(),
                fields: field_descriptors(fields),
            },
            Type::Interface(InterfaceType {
                description,
                fields,
                ..
            }) => TypeDescriptor::Interface {
                description: description.clone(),
                fields: field_descriptors(fields),
            },
            Type::Union(union) => TypeDescriptor::Union {
                description: union.description.clone(),
                possible_types: union.possible_types.clone(),
            },
            Type::Enum(enum_type) => TypeDescriptor::Enum {
                description: enum_type.description.clone(),
                values: enum_type.values.iter().map(EnumValueDescriptor::from).collect(),
            },
            Type::InputObject(input) => TypeDescriptor::InputObject {
                description: input.description.clone(),
                fields: input
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), InputFieldDescriptor::from(field)))
                    .collect(),
            },
            Type::Scalar(scalar) => TypeDescriptor::Scalar {
                description: scalar.description.clone(),
            },
        }
    }
}

fn field_descriptors(fields: &[Field]) -> Ordered<FieldDescriptor> {
    fields
        .iter()
        .map(|field| (field.name.clone(), FieldDescriptor::from(field)))
        .collect()
}

impl From<&Field> for FieldDescriptor {
    fn from(field: &Field) -> Self {
        Self {
            ty: field.ty.to_string(),
            description: field.description.clone(),
            args: field.args.iter().map(ArgumentDescriptor::from).collect(),
        }
    }
}

impl From<&InputValue> for ArgumentDescriptor {
    fn from(arg: &InputValue) -> Self {
        Self {
            name: arg.name.clone(),
            ty: arg.ty.to_string(),
            description: arg.description.clone(),
        }
    }
}

impl From<&InputValue> for InputFieldDescriptor {
    fn from(field: &InputValue) -> Self {
        Self {
            ty: field.ty.to_string(),
            description: field.description.clone(),
        }
    }
}

impl From<&EnumValue> for EnumValueDescriptor {
    fn from(value: &EnumValue) -> Self {
        Self {
            name: value.name.clone(),
            description: value.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cynic_introspection::query::IntrospectionQuery;
    use rstest::rstest;

    use super::*;
    use crate::introspection::test_support::{CATALOG_INTROSPECTION, HELLO_INTROSPECTION};

    fn schema(introspection: &str) -> Schema {
        serde_json::from_str::<IntrospectionQuery>(introspection)
            .unwrap()
            .into_schema()
            .unwrap()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn classifies_hello_query_as_object() {
        let json = filter_types(&schema(HELLO_INTROSPECTION), &names(&["Query"])).unwrap();

        insta::assert_snapshot!(json, @r#"
        {
          "Query": {
            "kind": "OBJECT",
            "description": null,
            "fields": {
              "hello": {
                "type": "String",
                "description": null,
                "args": []
              }
            }
          }
        }
        "#);
    }

    #[test]
    fn absent_names_are_skipped() {
        let json = filter_types(
            &schema(HELLO_INTROSPECTION),
            &names(&["DoesNotExist", "Query"]),
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("Query"));
    }

    #[test]
    fn no_matching_names_yields_an_empty_object() {
        let json = filter_types(&schema(HELLO_INTROSPECTION), &names(&["Nope"])).unwrap();

        assert_eq!(json, "{}");
    }

    #[test]
    fn output_follows_requested_order_without_duplicates() {
        let selected = select_types(
            &schema(CATALOG_INTROSPECTION),
            &names(&["Review", "Category", "Review", "Product"]),
        );

        let keys: Vec<_> = selected.0.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(keys, ["Review", "Category", "Product"]);
    }

    #[rstest]
    #[case("Product", "OBJECT")]
    #[case("Node", "INTERFACE")]
    #[case("SearchResult", "UNION")]
    #[case("Category", "ENUM")]
    #[case("ReviewInput", "INPUT_OBJECT")]
    #[case("Money", "SCALAR")]
    fn every_kind_is_classified(#[case] type_name: &str, #[case] expected_kind: &str) {
        let json = filter_types(&schema(CATALOG_INTROSPECTION), &names(&[type_name])).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[type_name]["kind"], expected_kind);
    }

    #[test]
    fn object_fields_list_arguments_and_wrapped_types() {
        let json = filter_types(&schema(CATALOG_INTROSPECTION), &names(&["Query"])).unwrap();

        insta::assert_snapshot!(json, @r#"
        {
          "Query": {
            "kind": "OBJECT",
            "description": "Root query",
            "fields": {
              "product": {
                "type": "Product",
                "description": null,
                "args": [
                  {
                    "name": "id",
                    "type": "ID!",
                    "description": null
                  }
                ]
              },
              "search": {
                "type": "[SearchResult!]!",
                "description": null,
                "args": [
                  {
                    "name": "term",
                    "type": "String!",
                    "description": null
                  },
                  {
                    "name": "first",
                    "type": "Int",
                    "description": null
                  }
                ]
              },
              "node": {
                "type": "Node",
                "description": null,
                "args": [
                  {
                    "name": "id",
                    "type": "ID!",
                    "description": null
                  }
                ]
              }
            }
          }
        }
        "#);
    }

    #[test]
    fn non_object_kinds_carry_their_own_shape() {
        let json = filter_types(
            &schema(CATALOG_INTROSPECTION),
            &names(&["SearchResult", "Category", "ReviewInput", "Money"]),
        )
        .unwrap();

        insta::assert_snapshot!(json, @r#"
        {
          "SearchResult": {
            "kind": "UNION",
            "description": null,
            "possibleTypes": [
              "Product",
              "Review"
            ]
          },
          "Category": {
            "kind": "ENUM",
            "description": "Product categories",
            "values": [
              {
                "name": "BOOKS",
                "description": null
              },
              {
                "name": "ELECTRONICS",
                "description": "Electronic devices"
              },
              {
                "name": "GARDEN",
                "description": null
              }
            ]
          },
          "ReviewInput": {
            "kind": "INPUT_OBJECT",
            "description": null,
            "fields": {
              "rating": {
                "type": "Int!",
                "description": null
              },
              "body": {
                "type": "String",
                "description": null
              }
            }
          },
          "Money": {
            "kind": "SCALAR",
            "description": "Amount in cents"
          }
        }
        "#);
    }

    #[test]
    fn interface_fields_have_descriptions() {
        let json = filter_types(&schema(CATALOG_INTROSPECTION), &names(&["Node", "Product"])).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Node"]["description"], "An object with an ID");
        assert_eq!(value["Node"]["fields"]["id"]["type"], "ID!");
        assert_eq!(value["Product"]["fields"]["price"]["description"], "Price in cents");
        assert_eq!(value["Product"]["fields"]["reviews"]["type"], "[Review!]!");
    }
}
