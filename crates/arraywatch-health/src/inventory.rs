//! Inspectors backed by inventory documents.
//!
//! An [`Inventory`] is a snapshot of everything a subsystem reports:
//!
//! ```json
//! {
//!   "system_name": "array-7",
//!   "components": {
//!     "disk": [{"index": 0, "HealthState": "OK", "State": "READY"}]
//!   }
//! }
//! ```
//!
//! A kind missing from `components` lists no objects.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use arraywatch_core::Target;

use crate::catalog::CheckKind;
use crate::error::{InspectError, InspectResult};
use crate::inspect::{InspectedObject, Inspector, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub system_name: String,
    #[serde(default)]
    pub components: BTreeMap<String, Vec<InspectedObject>>,
}

impl Inventory {
    pub fn new(system_name: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            components: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: CheckKind, objects: Vec<InspectedObject>) -> Self {
        self.components.insert(kind.to_string(), objects);
        self
    }

    pub fn from_json(path: &Path, content: &str) -> InspectResult<Self> {
        serde_json::from_str(content).map_err(|e| InspectError::Document {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

struct InventorySession {
    inventory: Inventory,
}

impl Session for InventorySession {
    fn system_name(&self) -> String {
        self.inventory.system_name.clone()
    }

    fn list_objects(&mut self, kind: CheckKind) -> InspectResult<Vec<InspectedObject>> {
        Ok(self
            .inventory
            .components
            .get(kind.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Serves inventories held in memory, keyed by controller name.
#[derive(Debug, Clone, Default)]
pub struct MemoryInspector {
    inventories: HashMap<String, Inventory>,
}

impl MemoryInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(mut self, controller: impl Into<String>, inventory: Inventory) -> Self {
        self.inventories.insert(controller.into(), inventory);
        self
    }
}

impl Inspector for MemoryInspector {
    fn connect(&self, target: &Target) -> InspectResult<Box<dyn Session>> {
        let inventory = self
            .inventories
            .get(&target.controller)
            .cloned()
            .ok_or_else(|| InspectError::Connect {
                endpoint: target.address.to_string(),
                reason: format!("no inventory for {}", target.controller),
            })?;
        Ok(Box::new(InventorySession { inventory }))
    }
}

/// Reads `<dir>/<controller>.json`, falling back to `<dir>/<address>.json`.
#[derive(Debug, Clone)]
pub struct FileInspector {
    dir: PathBuf,
}

impl FileInspector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn locate(&self, target: &Target) -> Option<PathBuf> {
        [
            self.dir.join(format!("{}.json", target.controller)),
            self.dir.join(format!("{}.json", target.address)),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

impl Inspector for FileInspector {
    fn connect(&self, target: &Target) -> InspectResult<Box<dyn Session>> {
        let path = self.locate(target).ok_or_else(|| InspectError::Connect {
            endpoint: target.address.to_string(),
            reason: format!("no inventory document in {}", self.dir.display()),
        })?;
        let content = std::fs::read_to_string(&path).map_err(|e| InspectError::Connect {
            endpoint: target.address.to_string(),
            reason: e.to_string(),
        })?;
        let inventory = Inventory::from_json(&path, &content)?;
        debug!(path = %path.display(), system = %inventory.system_name, "inventory loaded");
        Ok(Box::new(InventorySession { inventory }))
    }
}
