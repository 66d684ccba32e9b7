//! Recursive dependency loading.
//!
//! Dependencies are loaded through the module cache, all started before any
//! is awaited. Cycles are not detected: two modules awaiting each other's
//! pending entries never complete. A dependency that resolves to the
//! requesting module itself is skipped, since its exports are reachable
//! through the execution context.

use futures::future::{self, join_all, FutureExt};
use tracing::{trace, warn};

use crate::error::LoadError;
use crate::loader::Loader;
use crate::provider::{ModuleRequest, ResourceDescriptor};

/// Load every dependency of `referrer`.
///
/// Fails with the first failure in declaration order; other failures are
/// logged. Dependencies that loaded stay cached either way.
pub async fn load_all(
    loader: &Loader,
    referrer: &ResourceDescriptor,
    dependencies: &[String],
) -> Result<(), LoadError> {
    let mut loads = Vec::with_capacity(dependencies.len());

    for specifier in dependencies {
        let request = ModuleRequest::from_referrer(specifier.as_str(), referrer.path.clone());
        match loader.resolve(&request) {
            Ok(resource) if resource.id == referrer.id => {
                trace!(target: "dynmod::deps", path = %referrer.path, %specifier, "skipping self dependency");
            }
            Ok(resource) => loads.push(loader.load_resource(resource)),
            Err(err) => loads.push(future::ready(Err(err)).boxed()),
        }
    }

    let mut first_error = None;
    for outcome in join_all(loads).await {
        if let Err(err) = outcome {
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                warn!(target: "dynmod::deps", path = %referrer.path, error = %err, "additional dependency failure");
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
