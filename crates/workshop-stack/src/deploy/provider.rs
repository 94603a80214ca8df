//! The resource engine seam

use super::state::{LiveResource, ResolvedInputs};
use crate::error::ProviderError;
use crate::resources::Resource;
use std::future::Future;
use workshop_common::ResourceKind;

/// Creates and deletes declared resources.
///
/// The deployment driver calls `create` in plan order, after every
/// reference the resource holds has a live value in `inputs`. The returned
/// [`LiveResource`] must carry the `id` and `name` outputs (and
/// `privateIpAddress` for network interfaces).
pub trait Provider: Send {
    fn create(
        &mut self,
        resource: &Resource,
        inputs: &ResolvedInputs,
    ) -> impl Future<Output = Result<LiveResource, ProviderError>> + Send;

    fn delete(
        &mut self,
        name: &str,
        kind: ResourceKind,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
}
