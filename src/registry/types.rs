//! Registry data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One running, addressable copy of a service.
///
/// Immutable after construction. The id is unique per registration and
/// globally assigned (the orchestrator generates a UUID when none is
/// configured).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Unique instance id as registered.
    pub id: String,

    /// Service name as registered.
    pub name: String,

    /// Version of the running build.
    pub version: String,

    /// Key/value metadata attached to the instance.
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Endpoint addresses, one URI per advertised protocol/binding,
    /// e.g. `http://127.0.0.1:8000/`.
    #[serde(default)]
    pub endpoints: Vec<String>,
}
