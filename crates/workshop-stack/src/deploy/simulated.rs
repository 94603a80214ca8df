//! In-memory provider that mimics the shape of Azure identities
//!
//! Used by `preview` and by the tests. Resource IDs follow the ARM layout
//! (`/subscriptions/<sub>/resourceGroups/<rg>/providers/<type>/<name>`),
//! physical names get a suffix derived from the deployment ID the way the
//! engine auto-names resources, and NICs receive private IPs from their
//! subnet in allocation order.

use super::provider::Provider;
use super::state::{LiveResource, ResolvedInputs};
use crate::error::ProviderError;
use crate::resources::{Property, Resource, ResourceSpec};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::debug;
use workshop_common::ResourceKind;

/// Addresses Azure keeps at the start of every subnet
const RESERVED_LEADING_ADDRESSES: u32 = 4;

/// Length of the auto-naming suffix
const SUFFIX_LEN: usize = 8;

/// Sequential address allocator for one subnet
#[derive(Debug, Clone)]
struct SubnetPool {
    base: u32,
    size: u32,
    next_offset: u32,
}

impl SubnetPool {
    fn parse(cidr: &str) -> Option<Self> {
        let (addr, prefix) = cidr.split_once('/')?;
        let addr: Ipv4Addr = addr.parse().ok()?;
        let prefix: u32 = prefix.parse().ok()?;
        // Azure subnets range from /8 to /29
        if !(8..=29).contains(&prefix) {
            return None;
        }
        let size = 1u32 << (32 - prefix);
        let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
        Some(Self {
            base: u32::from(addr) & mask,
            size,
            next_offset: RESERVED_LEADING_ADDRESSES,
        })
    }

    /// Next free address; the last address (broadcast) is never handed out
    fn allocate(&mut self) -> Option<Ipv4Addr> {
        if self.next_offset >= self.size - 1 {
            return None;
        }
        let ip = Ipv4Addr::from(self.base + self.next_offset);
        self.next_offset += 1;
        Some(ip)
    }
}

/// Provider that keeps everything in memory
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    subscription_id: String,
    suffix: String,
    created: BTreeMap<String, LiveResource>,
    subnets: BTreeMap<String, SubnetPool>,
    rejections: BTreeMap<String, String>,
}

impl SimulatedProvider {
    pub fn new(subscription_id: impl Into<String>, deployment_id: &str) -> Self {
        let suffix: String = deployment_id
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_lowercase())
            .take(SUFFIX_LEN)
            .collect();
        Self {
            subscription_id: subscription_id.into(),
            suffix,
            created: BTreeMap::new(),
            subnets: BTreeMap::new(),
            rejections: BTreeMap::new(),
        }
    }

    /// Make `create` refuse the named resource with `message`
    pub fn reject(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.rejections.insert(name.into(), message.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&LiveResource> {
        self.created.get(name)
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    fn live_id(&self, name: &str, kind: ResourceKind) -> Result<&str, ProviderError> {
        self.created
            .get(name)
            .and_then(LiveResource::id)
            .ok_or_else(|| ProviderError::NotFound {
                kind,
                name: name.to_string(),
            })
    }

    fn resource_id(&self, resource: &Resource, physical: &str) -> Result<String, ProviderError> {
        let kind = resource.kind();
        let spec = resource.spec();

        if kind == ResourceKind::ResourceGroup {
            return Ok(format!(
                "/subscriptions/{}/{}/{}",
                self.subscription_id,
                kind.id_segment(),
                physical
            ));
        }

        if let Some(parent) = spec.parent().filter(|_| kind.is_child()) {
            let parent_kind = self
                .created
                .get(parent)
                .map(|p| p.kind)
                .unwrap_or(ResourceKind::ResourceGroup);
            let parent_id = self.live_id(parent, parent_kind)?;
            return Ok(format!("{parent_id}/{}/{physical}", kind.id_segment()));
        }

        match spec.resource_group() {
            Some(rg) => {
                let rg_id = self.live_id(rg.target(), ResourceKind::ResourceGroup)?;
                Ok(format!("{rg_id}/providers/{}/{physical}", kind.id_segment()))
            }
            None => Err(ProviderError::Rejected {
                kind,
                name: resource.name().to_string(),
                message: "not an Azure resource".to_string(),
            }),
        }
    }

    fn allocate_private_ip(
        &mut self,
        resource: &Resource,
        spec: &ResourceSpec,
    ) -> Result<Option<Ipv4Addr>, ProviderError> {
        let ResourceSpec::NetworkInterface(nic) = spec else {
            return Ok(None);
        };
        let rejected = |message: String| ProviderError::Rejected {
            kind: ResourceKind::NetworkInterface,
            name: resource.name().to_string(),
            message,
        };
        let subnet = nic
            .primary_subnet()
            .ok_or_else(|| rejected("no IP configuration".to_string()))?;
        let pool = self
            .subnets
            .get_mut(subnet.target())
            .ok_or_else(|| ProviderError::NotFound {
                kind: ResourceKind::Subnet,
                name: subnet.target().to_string(),
            })?;
        pool.allocate()
            .map(Some)
            .ok_or_else(|| rejected(format!("subnet '{}' is exhausted", subnet.target())))
    }
}

impl Provider for SimulatedProvider {
    async fn create(
        &mut self,
        resource: &Resource,
        inputs: &ResolvedInputs,
    ) -> Result<LiveResource, ProviderError> {
        let name = resource.name();
        let kind = resource.kind();

        if self.created.contains_key(name) {
            return Err(ProviderError::AlreadyExists {
                kind,
                name: name.to_string(),
            });
        }
        if let Some(message) = self.rejections.get(name) {
            return Err(ProviderError::Rejected {
                kind,
                name: name.to_string(),
                message: message.clone(),
            });
        }

        let physical = format!("{name}{}", self.suffix);
        let id = self.resource_id(resource, &physical)?;

        let spec = resource.spec();
        if let ResourceSpec::Subnet(subnet) = spec {
            let pool = SubnetPool::parse(&subnet.address_prefix).ok_or_else(|| {
                ProviderError::Rejected {
                    kind,
                    name: name.to_string(),
                    message: format!("invalid address prefix '{}'", subnet.address_prefix),
                }
            })?;
            self.subnets.insert(name.to_string(), pool);
        }
        let properties = inputs.render(spec).map_err(|e| ProviderError::Rejected {
            kind,
            name: name.to_string(),
            message: format!("properties do not serialize: {e}"),
        })?;
        let private_ip = self.allocate_private_ip(resource, spec)?;

        let mut live = LiveResource::new(name, kind)
            .with_output(Property::Id, &id)
            .with_output(Property::Name, &physical)
            .with_properties(properties);
        if let Some(ip) = private_ip {
            live = live.with_output(Property::PrivateIpAddress, ip.to_string());
        }

        debug!(name, kind = %kind, id = %id, "Simulated create");
        self.created.insert(name.to_string(), live.clone());
        Ok(live)
    }

    async fn delete(&mut self, name: &str, kind: ResourceKind) -> Result<(), ProviderError> {
        self.created
            .remove(name)
            .ok_or_else(|| ProviderError::NotFound {
                kind,
                name: name.to_string(),
            })?;
        self.subnets.remove(name);
        debug!(name, kind = %kind, "Simulated delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_skips_reserved_addresses() {
        let mut pool = SubnetPool::parse("10.0.1.0/24").unwrap();
        assert_eq!(pool.allocate(), Some(Ipv4Addr::new(10, 0, 1, 4)));
        assert_eq!(pool.allocate(), Some(Ipv4Addr::new(10, 0, 1, 5)));
    }

    #[test]
    fn test_pool_exhaustion() {
        // /29: 8 addresses, 4 reserved up front, broadcast reserved
        let mut pool = SubnetPool::parse("10.0.1.0/29").unwrap();
        let allocated: Vec<_> = std::iter::from_fn(|| pool.allocate()).collect();
        assert_eq!(
            allocated,
            [
                Ipv4Addr::new(10, 0, 1, 4),
                Ipv4Addr::new(10, 0, 1, 5),
                Ipv4Addr::new(10, 0, 1, 6)
            ]
        );
    }

    #[test]
    fn test_pool_rejects_bad_cidr() {
        assert!(SubnetPool::parse("10.0.1.0").is_none());
        assert!(SubnetPool::parse("10.0.1.0/30").is_none());
        assert!(SubnetPool::parse("10.0.0.0/0").is_none());
        assert!(SubnetPool::parse("nope/24").is_none());
    }

    #[test]
    fn test_pool_masks_host_bits() {
        let mut pool = SubnetPool::parse("10.0.1.77/24").unwrap();
        assert_eq!(pool.allocate(), Some(Ipv4Addr::new(10, 0, 1, 4)));
    }

    #[test]
    fn test_suffix_from_deployment_id() {
        let provider = SimulatedProvider::new("sub", "3F2A9C1B-0000-4000-8000-000000000000");
        assert_eq!(provider.suffix, "3f2a9c1b");
    }
}
