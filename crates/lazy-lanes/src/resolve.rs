//! Reconstructs producer links in a flat operation log.
//!
//! A chain keeps its identifier through every operator applied to it, so a descriptor
//! whose right operand names chain `c` consumes whatever the last descriptor anchored at
//! `c` produced. A single backward scan recovers those links without building a tree.

use crate::expr::{OpDescriptor, Rhs};

/// Links every chain-consuming descriptor to its producer and returns the number of links.
///
/// Descriptors are visited from last to first. For each one whose right operand is a chain,
/// earlier descriptors are scanned nearest-first; the first unclaimed descriptor anchored
/// at that chain becomes the producer and is marked claimed. Raw-variable operands never
/// link. Previous links are discarded first, so resolving the same log twice yields the
/// same result.
pub fn resolve(descriptors: &mut [OpDescriptor]) -> usize {
    for descriptor in descriptors.iter_mut() {
        descriptor.producer = None;
        descriptor.claimed = false;
    }

    let mut links = 0;
    for i in (0..descriptors.len()).rev() {
        let Rhs::Chain(wanted) = descriptors[i].rhs else {
            continue;
        };
        for j in (0..i).rev() {
            if descriptors[j].claimed {
                continue;
            }
            if descriptors[j].anchor == wanted {
                descriptors[i].producer = Some(j);
                descriptors[j].claimed = true;
                links += 1;
                tracing::trace!(consumer = i, producer = j, chain = %wanted, "linked producer");
                break;
            }
        }
    }
    links
}

/// Producer link of each descriptor, in log order.
pub fn producers(descriptors: &[OpDescriptor]) -> Vec<Option<usize>> {
    descriptors.iter().map(|d| d.producer).collect()
}
