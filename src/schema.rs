//! Static shape of a configuration object.
//!
//! The overlay never inspects types at run time. Instead, each configuration
//! type describes itself once:
//!
//! - A [`Record`] lists its overlayable fields ([`FieldDesc`]) and accepts
//!   converted values for them by name.
//! - A [`Schema`] (the root object) lists its sections. A section is either a
//!   flat record or a dynamic section: a `HashMap<String, Box<R>>` keyed by
//!   subsection name, optionally paired with a default record used to seed
//!   new subsections.
//!
//! Fields and sections that are not listed are private to the overlay: they
//! are never read, written, or matched against the environment.
//!
//! Both traits are normally implemented with the [`record!`](crate::record)
//! and [`schema!`](crate::schema) macros.

use std::collections::HashMap;

use tracing::debug;

use crate::convert::{TypeDesc, Value};
use crate::error::ConversionError;

/// Environment segment for a section or field: the override when present,
/// otherwise the declared name, with dashes mapped to underscores and
/// upper-cased.
pub fn env_segment(name: &str, rename: Option<&str>) -> String {
    rename.unwrap_or(name).replace('-', "_").to_uppercase()
}

/// One overlayable field of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    /// Rust field name, as passed to [`Record::apply`].
    pub name: &'static str,
    /// Optional naming override, e.g. `"another-name"`.
    pub rename: Option<&'static str>,
    pub ty: TypeDesc,
}

impl FieldDesc {
    pub fn new(name: &'static str, rename: Option<&'static str>, ty: TypeDesc) -> Self {
        Self { name, rename, ty }
    }

    pub fn env_name(&self) -> String {
        env_segment(self.name, self.rename)
    }
}

/// A fixed set of named fields (a flat section or a subsection record).
pub trait Record {
    /// Overlayable fields in declaration order.
    fn fields() -> Vec<FieldDesc>
    where
        Self: Sized;

    /// Write a converted value into the field called `field`. Sequences
    /// append, everything else replaces. Unknown names are ignored.
    fn apply(&mut self, field: &str, value: Value) -> Result<(), ConversionError>;
}

/// Object-safe view of a dynamic section, used by the walker.
pub trait SubsectionMap {
    fn fields(&self) -> Vec<FieldDesc>;

    /// Names of the subsections that already exist, sorted.
    fn names(&self) -> Vec<String>;

    fn get_mut(&mut self, name: &str) -> Option<&mut dyn Record>;

    /// Fetch the subsection called `name`, creating it from the default
    /// record (or `Default::default()`) when absent.
    fn get_or_create(&mut self, name: &str) -> &mut dyn Record;
}

/// A dynamic section borrowed from its owning configuration object.
pub struct Subsections<'a, R> {
    map: &'a mut HashMap<String, Box<R>>,
    defaults: Option<&'a R>,
}

impl<'a, R> Subsections<'a, R> {
    pub fn new(map: &'a mut HashMap<String, Box<R>>, defaults: Option<&'a R>) -> Self {
        Self { map, defaults }
    }
}

impl<R: Record + Default + Clone> SubsectionMap for Subsections<'_, R> {
    fn fields(&self) -> Vec<FieldDesc> {
        R::fields()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut dyn Record> {
        self.map
            .get_mut(name)
            .map(|record| &mut **record as &mut dyn Record)
    }

    fn get_or_create(&mut self, name: &str) -> &mut dyn Record {
        let defaults = self.defaults;
        let record = self.map.entry(name.to_string()).or_insert_with(|| {
            debug!(subsection = name, seeded = defaults.is_some(), "creating subsection");
            Box::new(defaults.cloned().unwrap_or_default())
        });
        &mut **record
    }
}

pub enum SectionBody<'a> {
    Flat {
        fields: Vec<FieldDesc>,
        record: &'a mut dyn Record,
    },
    Dynamic(Box<dyn SubsectionMap + 'a>),
}

/// A top-level section borrowed mutably for one overlay pass.
pub struct Section<'a> {
    pub name: &'static str,
    pub rename: Option<&'static str>,
    pub body: SectionBody<'a>,
}

impl<'a> Section<'a> {
    pub fn flat<R: Record>(
        name: &'static str,
        rename: Option<&'static str>,
        record: &'a mut R,
    ) -> Self {
        Self {
            name,
            rename,
            body: SectionBody::Flat {
                fields: R::fields(),
                record,
            },
        }
    }

    pub fn dynamic<R: Record + Default + Clone>(
        name: &'static str,
        rename: Option<&'static str>,
        map: &'a mut HashMap<String, Box<R>>,
        defaults: Option<&'a R>,
    ) -> Self {
        Self {
            name,
            rename,
            body: SectionBody::Dynamic(Box::new(Subsections::new(map, defaults))),
        }
    }

    pub fn env_name(&self) -> String {
        env_segment(self.name, self.rename)
    }
}

/// Static description of a section, for base parsers that need the layout
/// without borrowing an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub name: &'static str,
    pub rename: Option<&'static str>,
    pub dynamic: bool,
    /// Field holding the default subsection record, for dynamic sections.
    pub defaults: Option<&'static str>,
}

impl SectionLayout {
    /// Key of the section in a config file: the override, else the name.
    pub fn file_key(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }
}

/// The root of a configuration object.
pub trait Schema {
    fn layout() -> Vec<SectionLayout>
    where
        Self: Sized;

    /// Borrow every section, in declaration order.
    fn sections(&mut self) -> Vec<Section<'_>>;
}
