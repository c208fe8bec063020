//! Endpoint synthesis: entity configuration -> ordered, testable routes

use crate::config::entity::{CustomRoute, EndpointFlags, EndpointKind, EntityConfig};
use crate::models::{EndpointDescriptor, HttpMethod};

/// Derives the endpoints an entity exposes.
///
/// Order is list, read, create, update, delete (each only when its flag is
/// on), then custom routes in declaration order. An entity whose endpoint
/// flags are absent or empty gets the full CRUD set.
pub fn synthesize_endpoints(entity: &EntityConfig) -> Vec<EndpointDescriptor> {
    let base = entity_base_path(&entity.name);

    let flags = match &entity.endpoints {
        Some(flags) if !flags.is_empty() => flags.clone(),
        _ => EndpointFlags::all_crud(),
    };

    let mut endpoints: Vec<EndpointDescriptor> = EndpointKind::ALL
        .iter()
        .filter(|kind| flags.is_enabled(**kind))
        .map(|kind| crud_endpoint(*kind, &base, &entity.name))
        .collect();

    endpoints.extend(
        flags
            .custom_routes
            .iter()
            .map(|route| custom_endpoint(route, &base)),
    );

    endpoints
}

fn entity_base_path(name: &str) -> String {
    format!("/{}", name.trim().trim_matches('/'))
}

fn crud_endpoint(kind: EndpointKind, base: &str, name: &str) -> EndpointDescriptor {
    let item = format!("{}/{{id}}", base);
    match kind {
        EndpointKind::List => {
            EndpointDescriptor::new(HttpMethod::GET, base, format!("List all {}", name))
        }
        EndpointKind::Read => {
            EndpointDescriptor::new(HttpMethod::GET, item, format!("Get {} by ID", name))
        }
        EndpointKind::Create => {
            EndpointDescriptor::new(HttpMethod::POST, base, format!("Create new {}", name))
        }
        EndpointKind::Update => {
            EndpointDescriptor::new(HttpMethod::PUT, item, format!("Update {}", name))
        }
        EndpointKind::Delete => {
            EndpointDescriptor::new(HttpMethod::DELETE, item, format!("Delete {}", name))
        }
    }
}

/// Custom routes are served below the entity path, as the server registers them
fn custom_endpoint(route: &CustomRoute, base: &str) -> EndpointDescriptor {
    let declared = route.path.trim();
    let path = if declared == base || declared.starts_with(&format!("{}/", base)) {
        declared.to_string()
    } else if declared.is_empty() || declared == "/" {
        base.to_string()
    } else {
        format!("{}/{}", base, declared.trim_start_matches('/'))
    };

    let description = if route.handler.trim().is_empty() {
        String::from("Custom route")
    } else {
        format!("Custom route: {}", route.handler.trim())
    };

    EndpointDescriptor::new(route.method, path, description)
}
