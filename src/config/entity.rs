//! Wire model of the API configuration shared with the code-generation backend.
//!
//! Field names, nesting and key order round-trip losslessly: keys this model
//! does not know about are kept in `extra` maps, and unrecognised data type
//! names are kept verbatim.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT};
use crate::error::{ConsoleError, Result};
use crate::models::HttpMethod;

/// Top-level configuration document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfiguration {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub api_prefix: String,
    #[serde(default)]
    pub server: ServerAddress,
    #[serde(default)]
    pub entities_basic: Vec<EntityConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_api_version() -> String {
    String::from("1.0")
}

impl Default for ApiConfiguration {
    fn default() -> Self {
        ApiConfiguration {
            api_version: default_api_version(),
            api_prefix: String::new(),
            server: ServerAddress::default(),
            entities_basic: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl ApiConfiguration {
    /// Base URL the generated endpoints are served under
    pub fn base_url(&self) -> String {
        let prefix = self.api_prefix.trim().trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };
        format!("http://{}:{}{}", self.server.host, self.server.port, prefix)
    }

    pub fn entity(&self, table_name: &str) -> Option<&EntityConfig> {
        self.entities_basic
            .iter()
            .find(|e| e.table_name == table_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl Default for ServerAddress {
    fn default() -> Self {
        ServerAddress {
            host: String::from(DEFAULT_SERVER_HOST),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

/// Configuration of one entity, keyed by its table name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    pub name: String,
    pub table_name: String,
    #[serde(default)]
    pub fields: Vec<EntityField>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// `None` for legacy or partially loaded documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointFlags>,
    #[serde(default, rename = "authentication")]
    pub authentication_required: bool,
    #[serde(default)]
    pub authorization: Authorization,
    #[serde(default)]
    pub validations: Vec<Validation>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityConfig {
    /// Blank configuration for a table: no fields, every endpoint flag off
    pub fn new(table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        EntityConfig {
            name: table_name.clone(),
            table_name,
            fields: Vec::new(),
            relationships: Vec::new(),
            endpoints: Some(EndpointFlags::default()),
            authentication_required: false,
            authorization: Authorization::default(),
            validations: Vec::new(),
            pagination: Pagination::default(),
            extra: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&EntityField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut EntityField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Checks the invariants the generated server relies on
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ConsoleError::InvalidConfiguration {
            entity: self.table_name.clone(),
            reason,
        };

        if self.fields.is_empty() {
            return Err(invalid("entity has no fields".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field '{}'", field.name)));
            }
        }

        if let Some(flags) = &self.endpoints {
            for (index, route) in flags.custom_routes.iter().enumerate() {
                if !route.path.starts_with('/') {
                    return Err(invalid(format!(
                        "custom route #{} path '{}' must start with '/'",
                        index, route.path
                    )));
                }
                if route.handler.trim().is_empty() {
                    return Err(invalid(format!("custom route #{} has no handler", index)));
                }
            }
        }

        let pagination = &self.pagination;
        if pagination.default_page_size <= 0 || pagination.max_page_size <= 0 {
            return Err(invalid(format!(
                "page sizes must be positive (default {}, max {})",
                pagination.default_page_size, pagination.max_page_size
            )));
        }
        if pagination.default_page_size > pagination.max_page_size {
            return Err(invalid(format!(
                "default page size {} exceeds max page size {}",
                pagination.default_page_size, pagination.max_page_size
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntityField {
    /// Field as produced by a fresh table import
    pub fn imported(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        EntityField {
            column_name: Some(name.clone()),
            name,
            data_type,
            required: true,
            unique: false,
            searchable: true,
            default_value: None,
            description: None,
        }
    }
}

/// Field data type. Names outside the known set are kept as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Binary,
    Json,
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::String => "String",
            DataType::Integer => "Integer",
            DataType::Float => "Float",
            DataType::Boolean => "Boolean",
            DataType::Date => "Date",
            DataType::DateTime => "DateTime",
            DataType::Binary => "Binary",
            DataType::Json => "JSON",
            DataType::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "String" => DataType::String,
            "Integer" => DataType::Integer,
            "Float" => DataType::Float,
            "Boolean" => DataType::Boolean,
            "Date" => DataType::Date,
            "DateTime" => DataType::DateTime,
            "Binary" => DataType::Binary,
            "JSON" => DataType::Json,
            other => DataType::Other(other.to_string()),
        }
    }

    /// Maps a SQL column type (as reported by `SHOW COLUMNS`) to a data type
    pub fn from_sql_type(sql_type: &str) -> Self {
        let lowered = sql_type.trim().to_lowercase();
        let base = lowered.split(['(', ' ']).next().unwrap_or("");

        if lowered.starts_with("tinyint(1)") || base == "bool" || base == "boolean" {
            return DataType::Boolean;
        }

        match base {
            "int" | "integer" | "bigint" | "smallint" | "mediumint" | "tinyint" | "serial" => {
                DataType::Integer
            }
            "decimal" | "numeric" | "float" | "double" | "real" => DataType::Float,
            "date" => DataType::Date,
            "datetime" | "timestamp" => DataType::DateTime,
            "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
                DataType::Binary
            }
            "json" => DataType::Json,
            _ => DataType::String,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(DataType::from_name(&name))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub target_entity: String,
    pub relation_type: String,
    #[serde(default)]
    pub foreign_key: Option<String>,
}

/// Which CRUD endpoints are generated, plus user declared routes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointFlags {
    #[serde(default)]
    pub generate_create: bool,
    #[serde(default)]
    pub generate_read: bool,
    #[serde(default)]
    pub generate_update: bool,
    #[serde(default)]
    pub generate_delete: bool,
    #[serde(default)]
    pub generate_list: bool,
    #[serde(default)]
    pub custom_routes: Vec<CustomRoute>,
}

impl EndpointFlags {
    pub fn all_crud() -> Self {
        EndpointFlags {
            generate_create: true,
            generate_read: true,
            generate_update: true,
            generate_delete: true,
            generate_list: true,
            custom_routes: Vec::new(),
        }
    }

    /// No generated endpoint and no custom route
    pub fn is_empty(&self) -> bool {
        !self.generate_create
            && !self.generate_read
            && !self.generate_update
            && !self.generate_delete
            && !self.generate_list
            && self.custom_routes.is_empty()
    }

    pub fn is_enabled(&self, kind: EndpointKind) -> bool {
        match kind {
            EndpointKind::List => self.generate_list,
            EndpointKind::Read => self.generate_read,
            EndpointKind::Create => self.generate_create,
            EndpointKind::Update => self.generate_update,
            EndpointKind::Delete => self.generate_delete,
        }
    }

    pub fn flag_mut(&mut self, kind: EndpointKind) -> &mut bool {
        match kind {
            EndpointKind::List => &mut self.generate_list,
            EndpointKind::Read => &mut self.generate_read,
            EndpointKind::Create => &mut self.generate_create,
            EndpointKind::Update => &mut self.generate_update,
            EndpointKind::Delete => &mut self.generate_delete,
        }
    }
}

/// Generated CRUD endpoint, in synthesis order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 5] = [
        EndpointKind::List,
        EndpointKind::Read,
        EndpointKind::Create,
        EndpointKind::Update,
        EndpointKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::List => "list",
            EndpointKind::Read => "read",
            EndpointKind::Create => "create",
            EndpointKind::Update => "update",
            EndpointKind::Delete => "delete",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "list" | "generatelist" => Some(EndpointKind::List),
            "read" | "generateread" => Some(EndpointKind::Read),
            "create" | "generatecreate" => Some(EndpointKind::Create),
            "update" | "generateupdate" => Some(EndpointKind::Update),
            "delete" | "generatedelete" => Some(EndpointKind::Delete),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomRoute {
    pub path: String,
    pub method: HttpMethod,
    pub handler: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub action: String,
    pub subject: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub field: String,
    pub validation_type: ValidationRule,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub min: Option<i32>,
    #[serde(default)]
    pub max: Option<i32>,
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub default_page_size: i32,
    pub max_page_size: i32,
    pub page_param_name: String,
    pub size_param_name: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            default_page_size: 10,
            max_page_size: 100,
            page_param_name: String::from("page"),
            size_param_name: String::from("size"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
  "apiVersion": "1.0",
  "apiPrefix": "/api",
  "server": {
    "host": "localhost",
    "port": 8080
  },
  "database": {
    "host": "localhost",
    "port": 3306
  },
  "entitiesBasic": [
    {
      "name": "users",
      "tableName": "users",
      "fields": [
        {
          "name": "age",
          "columnName": "age",
          "dataType": "Integer",
          "required": true,
          "unique": false,
          "searchable": true,
          "defaultValue": null,
          "description": null
        },
        {
          "name": "score",
          "columnName": "score",
          "dataType": "Number",
          "required": false,
          "unique": false,
          "searchable": false,
          "defaultValue": "1",
          "description": "legacy type name"
        }
      ],
      "relationships": [],
      "endpoints": {
        "generateCreate": true,
        "generateRead": false,
        "generateUpdate": false,
        "generateDelete": false,
        "generateList": false,
        "customRoutes": [
          {
            "path": "/search",
            "method": "GET",
            "handler": "search_users"
          }
        ]
      },
      "authentication": true,
      "authorization": {
        "active": false,
        "roles": [],
        "permissions": []
      },
      "validations": [
        {
          "field": "age",
          "validationType": {
            "type": "range",
            "min": 0,
            "max": 130,
            "pattern": null
          },
          "errorMessage": null
        }
      ],
      "pagination": {
        "defaultPageSize": 10,
        "maxPageSize": 100,
        "pageParamName": "page",
        "sizeParamName": "size"
      }
    }
  ]
}"#;

    #[test]
    fn test_document_round_trips_losslessly() {
        let config: ApiConfiguration = serde_json::from_str(DOCUMENT).unwrap();
        let written = serde_json::to_value(&config).unwrap();
        let original: Value = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(written, original);
    }

    #[test]
    fn test_wire_names_map_to_model() {
        let config: ApiConfiguration = serde_json::from_str(DOCUMENT).unwrap();
        let users = config.entity("users").unwrap();
        assert!(users.authentication_required);
        assert_eq!(users.fields[0].data_type, DataType::Integer);
        assert_eq!(users.fields[1].data_type, DataType::Other("Number".into()));
        assert!(config.extra.contains_key("database"));
        assert_eq!(config.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_missing_endpoints_stays_absent() {
        let json = r#"{"name": "orders", "tableName": "orders"}"#;
        let entity: EntityConfig = serde_json::from_str(json).unwrap();
        assert!(entity.endpoints.is_none());
        let written = serde_json::to_value(&entity).unwrap();
        assert!(written.get("endpoints").is_none());
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(DataType::from_sql_type("int(11)"), DataType::Integer);
        assert_eq!(DataType::from_sql_type("tinyint(1)"), DataType::Boolean);
        assert_eq!(DataType::from_sql_type("tinyint(4)"), DataType::Integer);
        assert_eq!(DataType::from_sql_type("decimal(10,2)"), DataType::Float);
        assert_eq!(DataType::from_sql_type("DATETIME"), DataType::DateTime);
        assert_eq!(DataType::from_sql_type("varchar(255)"), DataType::String);
        assert_eq!(DataType::from_sql_type("json"), DataType::Json);
    }

    #[test]
    fn test_validate_rejects_entity_without_fields() {
        let entity = EntityConfig::new("empty");
        let err = entity.validate().unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_validate_rejects_relative_custom_route() {
        let mut entity = EntityConfig::new("users");
        entity.fields.push(EntityField::imported("id", DataType::Integer));
        entity.endpoints = Some(EndpointFlags {
            custom_routes: vec![CustomRoute {
                path: "search".into(),
                method: HttpMethod::GET,
                handler: "search".into(),
            }],
            ..EndpointFlags::default()
        });
        assert!(entity.validate().is_err());
    }

    #[test]
    fn test_field_without_column_name_writes_none() {
        let json = r#"{"name": "nickname", "dataType": "String"}"#;
        let field: EntityField = serde_json::from_str(json).unwrap();
        assert!(field.column_name.is_none());
        let written = serde_json::to_value(&field).unwrap();
        assert!(written.get("columnName").is_none());
    }

    #[test]
    fn test_negative_page_size_loads_and_fails_validation() {
        let json = r#"{
            "name": "users",
            "tableName": "users",
            "fields": [{"name": "id", "dataType": "Integer"}],
            "pagination": {
                "defaultPageSize": -5,
                "maxPageSize": 100,
                "pageParamName": "page",
                "sizeParamName": "size"
            }
        }"#;
        let entity: EntityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(entity.pagination.default_page_size, -5);
        let err = entity.validate().unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidConfiguration { .. }));

        let mut entity = entity;
        entity.pagination.default_page_size = 20;
        entity.pagination.max_page_size = 0;
        assert!(entity.validate().is_err());
        entity.pagination.max_page_size = 50;
        assert!(entity.validate().is_ok());
    }
}
