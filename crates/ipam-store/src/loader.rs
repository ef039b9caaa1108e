//! Building an address space from stored records.

use ipam_core::{AddressSpace, IpamError, MaskPolicy};
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

/// Build a fresh address space from everything in `store`.
///
/// The store is refreshed first. Rows are created parents-first (prefixes,
/// then each prefix's subnets, then each subnet's hosts), so every row goes
/// through the same validation as a live create. The first rejected row
/// aborts the load.
pub async fn load_space(store: &dyn RecordStore, policy: MaskPolicy) -> StoreResult<AddressSpace> {
    let mut space = AddressSpace::new(policy);
    populate(&mut space, store).await?;
    Ok(space)
}

/// Reset `space` and fill it from `store`.
///
/// On error `space` holds whatever was created before the failing row.
pub async fn populate(space: &mut AddressSpace, store: &dyn RecordStore) -> StoreResult<()> {
    store.refresh().await?;
    space.reset().map_err(|e| rejected(&"<root>", e))?;

    for prefix in store.prefixes().await? {
        space
            .create_prefix(&prefix.key, &prefix.cidr, &prefix.description)
            .map_err(|e| rejected(&prefix, e))?;

        for subnet in store.subnets(&prefix.key).await? {
            space
                .create_subnet(&subnet.prefix, &subnet.key, &subnet.cidr, &subnet.description)
                .map_err(|e| rejected(&subnet, e))?;

            for host in store.hosts(&subnet.prefix, &subnet.key).await? {
                space
                    .create_host(
                        &host.prefix,
                        &host.subnet,
                        &host.key,
                        &host.address,
                        &host.description,
                    )
                    .map_err(|e| rejected(&host, e))?;
            }
        }
    }

    let stats = space.stats();
    info!(
        prefixes = stats.prefixes,
        subnets = stats.subnets,
        hosts = stats.hosts,
        "loaded address space from store"
    );
    Ok(())
}

fn rejected(record: &dyn std::fmt::Display, source: IpamError) -> StoreError {
    let path = record.to_string();
    warn!(%path, error = %source, "stored record rejected");
    StoreError::Rejected { path, source }
}
