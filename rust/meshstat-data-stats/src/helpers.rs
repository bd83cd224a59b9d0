//! Extension point for data object types the built-in dispatch does not know.
//!
//! A [`HelperRegistry`] maps a foreign type name to a helper able to fill a
//! [`DatasetStatistics`] from an instance of that type. The registry is built
//! once by the application and passed to the summary builder.

use std::any::Any;

use ahash::AHashMap;
use meshstat_common::Result;

use crate::dataset::DatasetStatistics;

/// Extracts summary fields from a live foreign object.
pub trait DataInformationHelper: Send + Sync {
    /// Fills `info` from `object`. `info` has already been reset and carries
    /// the object's class name and pipeline metadata.
    fn copy_to(&self, object: &(dyn Any + Send + Sync), info: &mut DatasetStatistics)
    -> Result<()>;
}

impl<F> DataInformationHelper for F
where
    F: Fn(&(dyn Any + Send + Sync), &mut DatasetStatistics) -> Result<()> + Send + Sync,
{
    fn copy_to(
        &self,
        object: &(dyn Any + Send + Sync),
        info: &mut DatasetStatistics,
    ) -> Result<()> {
        self(object, info)
    }
}

#[derive(Default)]
pub struct HelperRegistry {
    helpers: AHashMap<String, Box<dyn DataInformationHelper>>,
}

impl HelperRegistry {
    pub fn new() -> HelperRegistry {
        HelperRegistry::default()
    }

    /// Registers `helper` for `type_name`, replacing a previous registration.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        helper: impl DataInformationHelper + 'static,
    ) {
        self.helpers.insert(type_name.into(), Box::new(helper));
    }

    pub fn with_helper(
        mut self,
        type_name: impl Into<String>,
        helper: impl DataInformationHelper + 'static,
    ) -> Self {
        self.register(type_name, helper);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn DataInformationHelper> {
        self.helpers.get(type_name).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl std::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.helpers.keys().collect();
        names.sort();
        f.debug_struct("HelperRegistry").field("helpers", &names).finish()
    }
}
