//! # Workbook
//!
//! The `Workbook` is the root container for stored calculations. Workbooks
//! serialize to `.scw` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Workbook
//! ├── meta: WorkbookMetadata (version, author, title, timestamps)
//! ├── settings: CalcSettings (compare mode, table format)
//! └── items: HashMap<Uuid, CalculationItem>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::stack::StackInput;
//! use screwed_core::workbook::{CalculationItem, Workbook};
//!
//! let mut workbook = Workbook::new("J. Doe", "Gearbox housing");
//! workbook.add_item(CalculationItem::Stack(StackInput {
//!     label: "Shaft end play".to_string(),
//!     expression: "[40 ±0.1] - [39.5 ±0.05]".to_string(),
//!     ..Default::default()
//! }));
//!
//! let outcomes = workbook.run();
//! assert!(outcomes[0].error.is_none());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::settings::CalcSettings;
use crate::spring::{self, SpringInput, SpringResult, SpringTable, SpringTableInput};
use crate::stack::{self, StackInput, StackReport};
use crate::thread::{self, ThreadInput, ThreadResult};
use crate::tolerance::ToleranceValue;
use crate::tube::{self, TubeInput, TubeResult};

/// Current schema version for .scw files
pub const SCHEMA_VERSION: &str = "0.1.0";

// ============================================================================
// Items
// ============================================================================

/// One stored calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    Stack(StackInput),
    Tube(TubeInput),
    Spring(SpringInput),
    SpringTable(SpringTableInput),
    Thread(ThreadInput),
}

impl CalculationItem {
    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::Stack(s) => &s.label,
            CalculationItem::Tube(t) => &t.label,
            CalculationItem::Spring(s) => &s.label,
            CalculationItem::SpringTable(s) => &s.label,
            CalculationItem::Thread(t) => &t.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::Stack(_) => "Stack",
            CalculationItem::Tube(_) => "Tube",
            CalculationItem::Spring(_) => "Spring",
            CalculationItem::SpringTable(_) => "SpringTable",
            CalculationItem::Thread(_) => "Thread",
        }
    }

    /// Run the calculation. Settings fill in what the item leaves open.
    pub fn calculate(&self, settings: &CalcSettings) -> CalcResult<CalculationOutput> {
        match self {
            CalculationItem::Stack(input) => {
                ToleranceValue::default().with_model(settings.combination_model)?;
                let input = StackInput {
                    compare_mode: input.compare_mode.or(Some(settings.compare_mode)),
                    ..input.clone()
                };
                stack::calculate(&input).map(CalculationOutput::Stack)
            }
            CalculationItem::Tube(input) => tube::calculate(input).map(CalculationOutput::Tube),
            CalculationItem::Spring(input) => spring::calculate(input).map(CalculationOutput::Spring),
            CalculationItem::SpringTable(input) => spring::spring_table(input).map(CalculationOutput::SpringTable),
            CalculationItem::Thread(input) => thread::calculate(input).map(CalculationOutput::Thread),
        }
    }
}

/// Result of one [`CalculationItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutput {
    Stack(StackReport),
    Tube(TubeResult),
    Spring(SpringResult),
    SpringTable(SpringTable),
    Thread(ThreadResult),
}

/// Outcome of one item in [`Workbook::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub id: Uuid,
    pub label: String,
    pub calc_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CalculationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CalcError>,
}

// ============================================================================
// Workbook
// ============================================================================

/// Root workbook container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub meta: WorkbookMetadata,
    #[serde(default)]
    pub settings: CalcSettings,
    /// All calculation items, keyed by UUID
    #[serde(default)]
    pub items: HashMap<Uuid, CalculationItem>,
}

/// Workbook metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub author: String,
    pub title: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Workbook {
    pub fn new(author: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Workbook {
            meta: WorkbookMetadata {
                version: SCHEMA_VERSION.to_string(),
                author: author.into(),
                title: title.into(),
                created: now,
                modified: now,
            },
            settings: CalcSettings::default(),
            items: HashMap::new(),
        }
    }

    /// Add a calculation item and return its new id.
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a calculation item by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    /// Mutable access marks the workbook as modified.
    pub fn get_item_mut(&mut self, id: &Uuid) -> Option<&mut CalculationItem> {
        if self.items.contains_key(id) {
            self.meta.modified = Utc::now();
            self.items.get_mut(id)
        } else {
            None
        }
    }

    /// Items that carry `label`.
    pub fn find_by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = (&'a Uuid, &'a CalculationItem)> + 'a {
        self.items.iter().filter(move |(_, item)| item.label() == label)
    }

    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Calculate every item, ordered by label. A failing item is reported in
    /// its outcome and does not stop the others.
    pub fn run(&self) -> Vec<ItemOutcome> {
        let mut entries: Vec<(&Uuid, &CalculationItem)> = self.items.iter().collect();
        entries.sort_by(|a, b| a.1.label().cmp(b.1.label()).then(a.0.cmp(b.0)));

        entries
            .into_iter()
            .map(|(id, item)| {
                let (output, error) = match item.calculate(&self.settings) {
                    Ok(output) => {
                        debug!(%id, label = item.label(), calc_type = item.calc_type(), "calculated");
                        (Some(output), None)
                    }
                    Err(e) => {
                        warn!(%id, label = item.label(), error = %e, "calculation failed");
                        (None, Some(e))
                    }
                };
                ItemOutcome {
                    id: *id,
                    label: item.label().to_string(),
                    calc_type: item.calc_type().to_string(),
                    output,
                    error,
                }
            })
            .collect()
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new("", "")
    }
}
