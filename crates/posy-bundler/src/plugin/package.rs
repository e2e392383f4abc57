use std::borrow::Cow;

use async_trait::async_trait;

use super::{PackageRef, Plugin};

/// Placeholder for a plugin provided by a package.
///
/// It has no hooks of its own; the engine host loads `package` and runs it
/// with the recorded options.
#[derive(Debug, Clone)]
pub struct PackagePlugin {
    reference: PackageRef,
}

impl PackagePlugin {
    pub fn new(reference: PackageRef) -> Self {
        Self { reference }
    }
}

#[async_trait]
impl Plugin for PackagePlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(self.reference.package.clone())
    }

    fn package(&self) -> Option<&PackageRef> {
        Some(&self.reference)
    }
}
