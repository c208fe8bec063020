//! Editing session over the table-keyed entity mapping.
//!
//! Every mutator takes `&self` and returns a new session. A reference to a
//! table, field, endpoint or route that does not exist yields an unchanged
//! copy, so repeated edits against something already removed are no-ops.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::entity::{
    ApiConfiguration, CustomRoute, DataType, EndpointFlags, EndpointKind, EntityConfig,
    EntityField,
};

/// A column reported by the database introspection backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedColumn {
    pub name: String,
    #[serde(default)]
    pub sql_type: Option<String>,
}

impl ImportedColumn {
    pub fn new(name: impl Into<String>) -> Self {
        ImportedColumn {
            name: name.into(),
            sql_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        ImportedColumn {
            name: name.into(),
            sql_type: Some(sql_type.into()),
        }
    }

    fn to_field(&self) -> EntityField {
        let data_type = self
            .sql_type
            .as_deref()
            .map(DataType::from_sql_type)
            .unwrap_or(DataType::String);
        EntityField::imported(&self.name, data_type)
    }
}

/// Single attribute edit applied to one field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldAttribute {
    DataType(DataType),
    Required(bool),
    Unique(bool),
    Searchable(bool),
    DefaultValue(Option<String>),
    Description(Option<String>),
}

/// Fields toggled off in one table, kept so toggling them back on restores
/// them verbatim. `order` is the table's field order at the first park.
#[derive(Clone, Debug, PartialEq)]
struct ParkedFields {
    order: Vec<String>,
    fields: Vec<EntityField>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigSession {
    entities: IndexMap<String, EntityConfig>,
    parked: IndexMap<String, ParkedFields>,
}

impl ConfigSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session seeded from a loaded configuration document
    pub fn from_configuration(config: &ApiConfiguration) -> Self {
        let mut entities = IndexMap::new();
        for entity in &config.entities_basic {
            entities.insert(entity.table_name.clone(), entity.clone());
        }
        ConfigSession {
            entities,
            parked: IndexMap::new(),
        }
    }

    /// Writes the current entities back into a configuration document
    pub fn apply_to(&self, config: &ApiConfiguration) -> ApiConfiguration {
        ApiConfiguration {
            entities_basic: self.entities.values().cloned().collect(),
            ..config.clone()
        }
    }

    pub fn entities(&self) -> &IndexMap<String, EntityConfig> {
        &self.entities
    }

    pub fn entity(&self, table_name: &str) -> Option<&EntityConfig> {
        self.entities.get(table_name)
    }

    /// Adds a blank entity (every endpoint flag off). Existing tables are kept as they are.
    pub fn add_table(&self, table_name: &str) -> Self {
        if self.entities.contains_key(table_name) {
            return self.clone();
        }
        let mut next = self.clone();
        next.entities
            .insert(table_name.to_string(), EntityConfig::new(table_name));
        next
    }

    /// Imports a table: all CRUD endpoints on, every column included as a
    /// required, searchable, non-unique field. Re-importing replaces the entity.
    pub fn import_table(&self, table_name: &str, columns: &[ImportedColumn]) -> Self {
        let mut entity = EntityConfig::new(table_name);
        entity.endpoints = Some(EndpointFlags::all_crud());
        entity.fields = columns.iter().map(ImportedColumn::to_field).collect();

        let mut next = self.clone();
        next.entities.insert(table_name.to_string(), entity);
        next.parked.shift_remove(table_name);
        next
    }

    pub fn remove_table(&self, table_name: &str) -> Self {
        let mut next = self.clone();
        next.entities.shift_remove(table_name);
        next.parked.shift_remove(table_name);
        next
    }

    /// Includes or excludes a field. Toggling twice gives back the same session.
    pub fn toggle_field(&self, table_name: &str, field_name: &str) -> Self {
        let Some(entity) = self.entities.get(table_name) else {
            return self.clone();
        };

        if let Some(index) = entity.fields.iter().position(|f| f.name == field_name) {
            let order = entity.fields.iter().map(|f| f.name.clone()).collect();
            let mut next = self.clone();
            if let Some(entity) = next.entities.get_mut(table_name) {
                let field = entity.fields.remove(index);
                next.parked
                    .entry(table_name.to_string())
                    .or_insert_with(|| ParkedFields {
                        order,
                        fields: Vec::new(),
                    })
                    .fields
                    .push(field);
            }
            return next;
        }

        let Some(slot) = self
            .parked
            .get(table_name)
            .and_then(|parked| parked.fields.iter().position(|f| f.name == field_name))
        else {
            return self.clone();
        };

        let mut next = self.clone();
        let Some(parked) = next.parked.get_mut(table_name) else {
            return next;
        };
        let field = parked.fields.remove(slot);
        let order = if parked.fields.is_empty() {
            next.parked.shift_remove(table_name).map(|p| p.order).unwrap_or_default()
        } else {
            parked.order.clone()
        };

        if let Some(entity) = next.entities.get_mut(table_name) {
            let index = restore_position(&order, &entity.fields, field_name);
            entity.fields.insert(index, field);
        }
        next
    }

    pub fn toggle_endpoint(&self, table_name: &str, kind: EndpointKind) -> Self {
        let mut next = self.clone();
        let Some(entity) = next.entities.get_mut(table_name) else {
            return next;
        };
        let flags = entity.endpoints.get_or_insert_with(EndpointFlags::default);
        let flag = flags.flag_mut(kind);
        *flag = !*flag;
        next
    }

    pub fn set_field_attribute(
        &self,
        table_name: &str,
        field_name: &str,
        attribute: FieldAttribute,
    ) -> Self {
        let mut next = self.clone();
        let Some(field) = next
            .entities
            .get_mut(table_name)
            .and_then(|e| e.field_mut(field_name))
        else {
            return next;
        };

        match attribute {
            FieldAttribute::DataType(data_type) => field.data_type = data_type,
            FieldAttribute::Required(value) => field.required = value,
            FieldAttribute::Unique(value) => field.unique = value,
            FieldAttribute::Searchable(value) => field.searchable = value,
            FieldAttribute::DefaultValue(value) => field.default_value = value,
            FieldAttribute::Description(value) => field.description = value,
        }
        next
    }

    pub fn add_custom_route(&self, table_name: &str, route: CustomRoute) -> Self {
        let mut next = self.clone();
        if let Some(entity) = next.entities.get_mut(table_name) {
            entity
                .endpoints
                .get_or_insert_with(EndpointFlags::default)
                .custom_routes
                .push(route);
        }
        next
    }

    pub fn remove_custom_route(&self, table_name: &str, index: usize) -> Self {
        let mut next = self.clone();
        let routes = next
            .entities
            .get_mut(table_name)
            .and_then(|e| e.endpoints.as_mut())
            .map(|flags| &mut flags.custom_routes);

        if let Some(routes) = routes {
            if index < routes.len() {
                routes.remove(index);
            }
        }
        next
    }
}

/// Index at which a parked field goes back: right after the last included
/// field that came before it in `order`
fn restore_position(order: &[String], fields: &[EntityField], name: &str) -> usize {
    let preceding: Vec<&str> = order
        .iter()
        .take_while(|n| n.as_str() != name)
        .map(String::as_str)
        .collect();

    fields
        .iter()
        .rposition(|f| preceding.contains(&f.name.as_str()))
        .map(|i| i + 1)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn users_session() -> ConfigSession {
        ConfigSession::new().import_table(
            "users",
            &[
                ImportedColumn::typed("id", "int(11)"),
                ImportedColumn::typed("email", "varchar(255)"),
                ImportedColumn::typed("created_at", "datetime"),
            ],
        )
    }

    fn field_names(session: &ConfigSession) -> Vec<String> {
        session.entity("users").unwrap().fields.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_import_sets_defaults() {
        let session = users_session();
        let users = session.entity("users").unwrap();
        assert_eq!(users.endpoints, Some(EndpointFlags::all_crud()));
        assert!(users.fields.iter().all(|f| f.required && f.searchable && !f.unique));
        assert_eq!(users.fields[0].data_type, DataType::Integer);
        assert_eq!(users.fields[2].data_type, DataType::DateTime);
        assert_eq!(users.fields[1].column_name.as_deref(), Some("email"));
    }

    #[test]
    fn test_add_table_has_all_flags_off() {
        let session = ConfigSession::new().add_table("orders");
        let orders = session.entity("orders").unwrap();
        assert_eq!(orders.endpoints, Some(EndpointFlags::default()));
        assert_eq!(orders.name, "orders");
    }

    #[test]
    fn test_toggle_field_is_involutive() {
        let session = users_session()
            .set_field_attribute("users", "email", FieldAttribute::Unique(true));
        for name in ["id", "email", "created_at"] {
            let toggled = session.toggle_field("users", name);
            assert_ne!(toggled, session);
            assert_eq!(toggled.toggle_field("users", name), session);
        }
    }

    #[test]
    fn test_toggle_field_restores_edited_attributes_in_place() {
        let session = users_session()
            .set_field_attribute("users", "email", FieldAttribute::Required(false));
        let off = session.toggle_field("users", "email");
        assert_eq!(field_names(&off), vec!["id", "created_at"]);

        let on = off.toggle_field("users", "email");
        assert_eq!(field_names(&on), vec!["id", "email", "created_at"]);
        assert!(!on.entity("users").unwrap().field("email").unwrap().required);
    }

    #[test]
    fn test_two_parked_fields_restore_in_order() {
        let session = users_session();
        let expected = vec!["id", "email", "created_at"];

        let on = session
            .toggle_field("users", "id")
            .toggle_field("users", "email")
            .toggle_field("users", "id")
            .toggle_field("users", "email");
        assert_eq!(field_names(&on), expected);
        assert_eq!(on, session);

        let on = session
            .toggle_field("users", "email")
            .toggle_field("users", "id")
            .toggle_field("users", "email")
            .toggle_field("users", "id");
        assert_eq!(field_names(&on), expected);
        assert_eq!(on, session);
    }

    #[test]
    fn test_every_field_parked_restores_in_order() {
        let session = users_session();
        let off = session
            .toggle_field("users", "created_at")
            .toggle_field("users", "id")
            .toggle_field("users", "email");
        assert!(field_names(&off).is_empty());

        let on = off
            .toggle_field("users", "email")
            .toggle_field("users", "created_at")
            .toggle_field("users", "id");
        assert_eq!(field_names(&on), vec!["id", "email", "created_at"]);
    }

    #[test]
    fn test_loaded_table_restores_in_order() {
        let mut users = EntityConfig::new("users");
        for name in ["a", "b", "c", "d"] {
            users.fields.push(EntityField::imported(name, DataType::String));
        }
        let config = ApiConfiguration {
            entities_basic: vec![users],
            ..ApiConfiguration::default()
        };
        let session = ConfigSession::from_configuration(&config);

        let off = session
            .toggle_field("users", "b")
            .toggle_field("users", "c");
        assert_eq!(field_names(&off), vec!["a", "d"]);

        let partly = off.toggle_field("users", "c");
        assert_eq!(field_names(&partly), vec!["a", "c", "d"]);
        assert_eq!(partly.toggle_field("users", "b"), session);
    }

    #[test]
    fn test_unknown_references_are_noops() {
        let session = users_session();
        assert_eq!(session.toggle_field("users", "missing"), session);
        assert_eq!(session.toggle_field("nope", "id"), session);
        assert_eq!(session.toggle_endpoint("nope", EndpointKind::List), session);
        assert_eq!(
            session.set_field_attribute("users", "missing", FieldAttribute::Unique(true)),
            session
        );
        assert_eq!(session.remove_custom_route("users", 3), session);
    }

    #[test]
    fn test_mutators_leave_argument_untouched() {
        let session = users_session();
        let before = session.clone();
        let _ = session.toggle_endpoint("users", EndpointKind::Delete);
        let _ = session.toggle_field("users", "id");
        assert_eq!(session, before);
    }

    #[test]
    fn test_toggle_endpoint_flips_one_flag() {
        let session = users_session().toggle_endpoint("users", EndpointKind::Delete);
        let flags = session.entity("users").unwrap().endpoints.clone().unwrap();
        assert!(!flags.generate_delete);
        assert!(flags.generate_create && flags.generate_read && flags.generate_list);
    }

    #[test]
    fn test_custom_routes_add_and_remove() {
        let route = CustomRoute {
            path: "/search".into(),
            method: HttpMethod::GET,
            handler: "search_users".into(),
        };
        let session = users_session().add_custom_route("users", route.clone());
        let routes = &session.entity("users").unwrap().endpoints.as_ref().unwrap().custom_routes;
        assert_eq!(routes, &vec![route]);

        let session = session.remove_custom_route("users", 0);
        let routes = &session.entity("users").unwrap().endpoints.as_ref().unwrap().custom_routes;
        assert!(routes.is_empty());
    }

    #[test]
    fn test_apply_to_keeps_document_settings() {
        let config = ApiConfiguration {
            api_prefix: "/api".into(),
            ..ApiConfiguration::default()
        };
        let written = users_session().apply_to(&config);
        assert_eq!(written.api_prefix, "/api");
        assert_eq!(written.entities_basic.len(), 1);
        assert_eq!(ConfigSession::from_configuration(&written).entity("users").unwrap().fields.len(), 3);
    }
}
